//! Local serial device transport backed by the `serialport` crate.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::ClearBuffer;

use super::settings::{to_serialport_data_bits, to_serialport_parity, to_serialport_stop_bits};
use super::{PortError, PortSettings, SerialPort};

/// Poll interval used when reads should block without a timeout.
const BLOCKING_POLL: Duration = Duration::from_millis(100);

pub struct LocalPort {
    path: String,
    settings: PortSettings,
    applied: Option<PortSettings>,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl LocalPort {
    pub fn new(path: impl Into<String>, settings: PortSettings) -> Self {
        Self {
            path: path.into(),
            settings,
            applied: None,
            port: None,
        }
    }

    fn device(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>, PortError> {
        self.port.as_mut().ok_or(PortError::NotOpen)
    }
}

impl SerialPort for LocalPort {
    fn name(&self) -> &str {
        &self.path
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn open(&mut self) -> Result<(), PortError> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = serialport::new(&self.path, self.settings.baud_rate)
            .data_bits(to_serialport_data_bits(self.settings.data_bits))
            .parity(to_serialport_parity(self.settings.parity))
            .stop_bits(to_serialport_stop_bits(self.settings.stop_bits))
            .timeout(self.settings.timeout.unwrap_or(BLOCKING_POLL))
            .open()?;

        tracing::debug!(port = %self.path, baud = self.settings.baud_rate, "Opened serial port");
        self.port = Some(port);
        self.applied = Some(self.settings.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), PortError> {
        // Dropping the handle closes the device.
        self.port = None;
        self.applied = None;
        Ok(())
    }

    fn read(&mut self, size: usize) -> Result<Vec<u8>, PortError> {
        let blocking = self.settings.timeout.is_none();
        let device = self.device()?;
        let mut buf = vec![0u8; size];
        let mut filled = 0;

        while filled < size {
            match device.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut && blocking => continue,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        buf.truncate(filled);
        Ok(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let device = self.device()?;
        device.write_all(data)?;
        device.flush()?;
        Ok(data.len())
    }

    fn bytes_available(&mut self) -> Result<usize, PortError> {
        Ok(self.device()?.bytes_to_read()? as usize)
    }

    fn reset_input_buffer(&mut self) -> Result<(), PortError> {
        self.device()?.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn settings(&self) -> &PortSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut PortSettings {
        &mut self.settings
    }

    fn reconfigure(&mut self, force: bool) -> Result<(), PortError> {
        if !force && self.applied.as_ref() == Some(&self.settings) {
            return Ok(());
        }

        let settings = self.settings.clone();
        let device = self.device()?;
        device.set_baud_rate(settings.baud_rate)?;
        device.set_data_bits(to_serialport_data_bits(settings.data_bits))?;
        device.set_parity(to_serialport_parity(settings.parity))?;
        device.set_stop_bits(to_serialport_stop_bits(settings.stop_bits))?;
        device.set_timeout(settings.timeout.unwrap_or(BLOCKING_POLL))?;

        tracing::debug!(port = %self.path, ?settings, "Reconfigured serial port");
        self.applied = Some(settings);
        Ok(())
    }
}
