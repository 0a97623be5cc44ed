//! Serial port capability set and the transports implementing it.
//!
//! Interception works by handing tests a different implementation of
//! [`SerialPort`] rather than the real transport; see [`crate::intercept`].

mod error;
pub mod local;
pub mod mock;
pub mod network;
pub mod settings;

pub use error::PortError;
pub use local::LocalPort;
pub use mock::MockPort;
pub use network::NetworkPort;
pub use settings::{Parity, PortSettings};

/// Operations a test can perform on a serial port.
pub trait SerialPort: Send {
    /// Device path or URL the port was created for.
    fn name(&self) -> &str;

    fn is_open(&self) -> bool;

    fn open(&mut self) -> Result<(), PortError>;

    fn close(&mut self) -> Result<(), PortError>;

    /// Read up to `size` bytes. May return fewer when the timeout expires.
    fn read(&mut self, size: usize) -> Result<Vec<u8>, PortError>;

    /// Write all of `data`, returning the number of bytes written.
    fn write(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Number of received bytes waiting to be read.
    fn bytes_available(&mut self) -> Result<usize, PortError>;

    /// Discard received bytes that have not been read yet.
    fn reset_input_buffer(&mut self) -> Result<(), PortError>;

    fn settings(&self) -> &PortSettings;

    fn settings_mut(&mut self) -> &mut PortSettings;

    /// Push the current settings to the device. Without `force`, settings
    /// already applied are not sent again.
    fn reconfigure(&mut self, force: bool) -> Result<(), PortError>;

    /// Replace the line settings, reconfiguring the port if it is open.
    fn apply_settings(&mut self, settings: PortSettings) -> Result<(), PortError> {
        *self.settings_mut() = settings;
        if self.is_open() {
            self.reconfigure(false)
        } else {
            Ok(())
        }
    }
}

impl<P: SerialPort + ?Sized> SerialPort for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn open(&mut self) -> Result<(), PortError> {
        (**self).open()
    }

    fn close(&mut self) -> Result<(), PortError> {
        (**self).close()
    }

    fn read(&mut self, size: usize) -> Result<Vec<u8>, PortError> {
        (**self).read(size)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, PortError> {
        (**self).write(data)
    }

    fn bytes_available(&mut self) -> Result<usize, PortError> {
        (**self).bytes_available()
    }

    fn reset_input_buffer(&mut self) -> Result<(), PortError> {
        (**self).reset_input_buffer()
    }

    fn settings(&self) -> &PortSettings {
        (**self).settings()
    }

    fn settings_mut(&mut self) -> &mut PortSettings {
        (**self).settings_mut()
    }

    fn reconfigure(&mut self, force: bool) -> Result<(), PortError> {
        (**self).reconfigure(force)
    }

    fn apply_settings(&mut self, settings: PortSettings) -> Result<(), PortError> {
        (**self).apply_settings(settings)
    }
}

/// Build the transport for `url` without opening it.
///
/// `rfc2217://host:port` selects the network transport; anything else is
/// treated as a local device path.
pub fn for_url(url: &str, settings: PortSettings) -> Result<Box<dyn SerialPort>, PortError> {
    if url.contains("://") {
        return Ok(Box::new(NetworkPort::from_url(url, settings)?));
    }
    Ok(Box::new(LocalPort::new(url, settings)))
}
