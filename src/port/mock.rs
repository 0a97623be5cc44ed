//! Scripted in-memory transport for tests.
//!
//! Stands in for real hardware: received bytes are queued up front and
//! written bytes are captured. Clones share state, so a test can keep one
//! handle for assertions while another is boxed and intercepted.
//!
//! # Example
//! ```
//! use reserial::port::{MockPort, SerialPort};
//!
//! let device = MockPort::new("/dev/ttyUSB0").with_rx(b"\x01");
//! let mut port = device.clone();
//! port.open().unwrap();
//! port.write(b"\x02").unwrap();
//! assert_eq!(port.read(1).unwrap(), b"\x01");
//! assert_eq!(device.written(), b"\x02");
//! ```

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{PortError, PortSettings, SerialPort};

#[derive(Debug, Default)]
struct MockState {
    open: bool,
    rx: VecDeque<u8>,
    written: Vec<u8>,
    reconfigures: usize,
    input_resets: usize,
    fail_writes: bool,
}

#[derive(Debug, Clone)]
pub struct MockPort {
    name: String,
    settings: PortSettings,
    state: Arc<Mutex<MockState>>,
}

impl MockPort {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: PortSettings::default(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Queue bytes the device will send.
    pub fn with_rx(self, data: &[u8]) -> Self {
        self.push_rx(data);
        self
    }

    /// Make every write fail with an I/O error.
    pub fn failing_writes(self) -> Self {
        self.state.lock().fail_writes = true;
        self
    }

    pub fn push_rx(&self, data: &[u8]) {
        self.state.lock().rx.extend(data.iter().copied());
    }

    /// Everything written to the device so far.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    pub fn reconfigure_count(&self) -> usize {
        self.state.lock().reconfigures
    }

    pub fn input_reset_count(&self) -> usize {
        self.state.lock().input_resets
    }
}

impl SerialPort for MockPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    fn open(&mut self) -> Result<(), PortError> {
        self.state.lock().open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), PortError> {
        self.state.lock().open = false;
        Ok(())
    }

    fn read(&mut self, size: usize) -> Result<Vec<u8>, PortError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(PortError::NotOpen);
        }
        let n = size.min(state.rx.len());
        Ok(state.rx.drain(..n).collect())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(PortError::NotOpen);
        }
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure").into());
        }
        state.written.extend_from_slice(data);
        Ok(data.len())
    }

    fn bytes_available(&mut self) -> Result<usize, PortError> {
        let state = self.state.lock();
        if !state.open {
            return Err(PortError::NotOpen);
        }
        Ok(state.rx.len())
    }

    fn reset_input_buffer(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(PortError::NotOpen);
        }
        state.rx.clear();
        state.input_resets += 1;
        Ok(())
    }

    fn settings(&self) -> &PortSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut PortSettings {
        &mut self.settings
    }

    fn reconfigure(&mut self, _force: bool) -> Result<(), PortError> {
        self.state.lock().reconfigures += 1;
        Ok(())
    }
}
