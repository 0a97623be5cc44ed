use crate::port::{PortError, PortSettings, SerialPort};
use crate::traffic::SharedTrafficLog;

/// Simulated port fed from recorded traffic.
///
/// Never touches hardware: `open`/`close` only flip a flag, reads come from
/// the recorded `rx` stream and writes are checked against recorded `tx`.
pub struct ReplayPort {
    name: String,
    settings: PortSettings,
    is_open: bool,
    log: SharedTrafficLog,
}

impl ReplayPort {
    pub fn new(name: impl Into<String>, settings: PortSettings, log: SharedTrafficLog) -> Self {
        Self {
            name: name.into(),
            settings,
            is_open: false,
            log,
        }
    }
}

impl SerialPort for ReplayPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.is_open
    }

    fn open(&mut self) -> Result<(), PortError> {
        self.is_open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), PortError> {
        self.is_open = false;
        Ok(())
    }

    /// Returns fewer than `size` bytes, without blocking, once the recording
    /// runs out.
    fn read(&mut self, size: usize) -> Result<Vec<u8>, PortError> {
        if !self.is_open {
            return Err(PortError::NotOpen);
        }
        Ok(self.log.lock().take_rx(size))
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, PortError> {
        if !self.is_open {
            return Err(PortError::NotOpen);
        }

        self.log
            .lock()
            .consume_tx(data)
            .map_err(|expected| {
                tracing::warn!(
                    port = %self.name,
                    written = %data.escape_ascii(),
                    expected = %expected.escape_ascii(),
                    "Replayed write diverged from recording"
                );
                PortError::TrafficMismatch {
                    written: data.to_vec(),
                    expected,
                }
            })?;
        Ok(data.len())
    }

    fn bytes_available(&mut self) -> Result<usize, PortError> {
        Ok(self.log.lock().rx_len())
    }

    fn reset_input_buffer(&mut self) -> Result<(), PortError> {
        Ok(())
    }

    fn settings(&self) -> &PortSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut PortSettings {
        &mut self.settings
    }

    fn reconfigure(&mut self, _force: bool) -> Result<(), PortError> {
        Ok(())
    }
}
