use crate::port::{PortError, PortSettings, SerialPort};
use crate::traffic::SharedTrafficLog;

/// Wraps a real transport and captures the bytes flowing through it.
///
/// Only `read` and `write` are observed; everything else is delegated
/// unchanged.
pub struct RecordingPort<P> {
    inner: P,
    log: SharedTrafficLog,
}

impl<P: SerialPort> RecordingPort<P> {
    pub fn new(inner: P, log: SharedTrafficLog) -> Self {
        Self { inner, log }
    }

    /// Give back the real transport.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: SerialPort> SerialPort for RecordingPort<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn open(&mut self) -> Result<(), PortError> {
        self.inner.open()
    }

    fn close(&mut self) -> Result<(), PortError> {
        self.inner.close()
    }

    fn read(&mut self, size: usize) -> Result<Vec<u8>, PortError> {
        let data = self.inner.read(size)?;
        self.log.lock().extend_rx(&data);
        Ok(data)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, PortError> {
        // Logged before the real write, so a failing write is still recorded.
        self.log.lock().extend_tx(data);
        self.inner.write(data)
    }

    fn bytes_available(&mut self) -> Result<usize, PortError> {
        self.inner.bytes_available()
    }

    fn reset_input_buffer(&mut self) -> Result<(), PortError> {
        self.inner.reset_input_buffer()
    }

    fn settings(&self) -> &PortSettings {
        self.inner.settings()
    }

    fn settings_mut(&mut self) -> &mut PortSettings {
        self.inner.settings_mut()
    }

    fn reconfigure(&mut self, force: bool) -> Result<(), PortError> {
        self.inner.reconfigure(force)
    }

    fn apply_settings(&mut self, settings: PortSettings) -> Result<(), PortError> {
        self.inner.apply_settings(settings)
    }
}
