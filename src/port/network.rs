//! Network-tunneled serial port speaking a minimal RFC 2217 client.
//!
//! Data travels over a telnet stream: `0xFF` in the payload is doubled and
//! line settings are sent as COM-PORT-OPTION subnegotiations. Telnet
//! commands from the server are stripped from the received data.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use super::{PortError, PortSettings, SerialPort};

const SCHEME: &str = "rfc2217://";

/// Telnet IAC (Interpret As Command) byte
const IAC: u8 = 0xFF;
const SB: u8 = 0xFA;
const SE: u8 = 0xF0;
const WILL: u8 = 0xFB;
const WONT: u8 = 0xFC;
const DO: u8 = 0xFD;
const DONT: u8 = 0xFE;

/// RFC 2217 COM-PORT-OPTION (option 44)
const COM_PORT_OPTION: u8 = 44;

const SET_BAUDRATE: u8 = 1;
const SET_DATASIZE: u8 = 2;
const SET_PARITY: u8 = 3;
const SET_STOPSIZE: u8 = 4;
const PURGE_DATA: u8 = 12;
const PURGE_RECEIVE: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TelnetState {
    Data,
    Iac,
    Negotiation,
    Sub,
    SubIac,
}

/// Strips telnet commands from an incoming byte stream.
#[derive(Debug)]
struct TelnetDecoder {
    state: TelnetState,
}

impl TelnetDecoder {
    fn new() -> Self {
        Self {
            state: TelnetState::Data,
        }
    }

    /// Feed one byte, returning it if it is payload data.
    fn feed(&mut self, byte: u8) -> Option<u8> {
        let (next, out) = match (self.state, byte) {
            (TelnetState::Data, IAC) => (TelnetState::Iac, None),
            (TelnetState::Data, b) => (TelnetState::Data, Some(b)),
            (TelnetState::Iac, IAC) => (TelnetState::Data, Some(IAC)),
            (TelnetState::Iac, SB) => (TelnetState::Sub, None),
            (TelnetState::Iac, WILL | WONT | DO | DONT) => (TelnetState::Negotiation, None),
            (TelnetState::Iac, _) => (TelnetState::Data, None),
            (TelnetState::Negotiation, _) => (TelnetState::Data, None),
            (TelnetState::Sub, IAC) => (TelnetState::SubIac, None),
            (TelnetState::Sub, _) => (TelnetState::Sub, None),
            (TelnetState::SubIac, SE) => (TelnetState::Data, None),
            (TelnetState::SubIac, _) => (TelnetState::Sub, None),
        };
        self.state = next;
        out
    }
}

fn escape_iac(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &b in data {
        out.push(b);
        if b == IAC {
            out.push(IAC);
        }
    }
    out
}

fn subnegotiation(command: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![IAC, SB, COM_PORT_OPTION, command];
    out.extend(escape_iac(payload));
    out.extend([IAC, SE]);
    out
}

enum Fill {
    Data,
    TimedOut,
    Closed,
}

pub struct NetworkPort {
    url: String,
    address: String,
    settings: PortSettings,
    applied: Option<PortSettings>,
    stream: Option<TcpStream>,
    decoder: TelnetDecoder,
    pending: VecDeque<u8>,
}

impl NetworkPort {
    /// Parse `rfc2217://host:port[?options]`. Options are ignored.
    pub fn from_url(url: &str, settings: PortSettings) -> Result<Self, PortError> {
        let rest = url
            .strip_prefix(SCHEME)
            .ok_or_else(|| PortError::InvalidUrl(url.to_string()))?;
        let address = rest.split(['?', '/']).next().unwrap_or_default();
        if address.is_empty() || !address.contains(':') {
            return Err(PortError::InvalidUrl(url.to_string()));
        }

        Ok(Self {
            url: url.to_string(),
            address: address.to_string(),
            settings,
            applied: None,
            stream: None,
            decoder: TelnetDecoder::new(),
            pending: VecDeque::new(),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn stream(&mut self) -> Result<&mut TcpStream, PortError> {
        self.stream.as_mut().ok_or(PortError::NotOpen)
    }

    fn send_raw(&mut self, bytes: &[u8]) -> Result<(), PortError> {
        let stream = self.stream()?;
        stream.write_all(bytes)?;
        stream.flush()?;
        Ok(())
    }

    /// Read one chunk from the socket into `pending`.
    ///
    /// `timeout` of `None` blocks; `Some(ZERO)` only takes what is already
    /// waiting.
    fn fill(&mut self, timeout: Option<Duration>) -> Result<Fill, PortError> {
        let mut chunk = [0u8; 1024];
        let stream = self.stream.as_mut().ok_or(PortError::NotOpen)?;

        let result = match timeout {
            Some(t) if t.is_zero() => {
                stream.set_nonblocking(true)?;
                let result = stream.read(&mut chunk);
                stream.set_nonblocking(false)?;
                result
            }
            other => {
                stream.set_read_timeout(other)?;
                stream.read(&mut chunk)
            }
        };

        match result {
            Ok(0) => Ok(Fill::Closed),
            Ok(n) => {
                for &byte in &chunk[..n] {
                    if let Some(data) = self.decoder.feed(byte) {
                        self.pending.push_back(data);
                    }
                }
                Ok(Fill::Data)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                Ok(Fill::TimedOut)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Fill::Data),
            Err(e) => Err(e.into()),
        }
    }

    /// Pull in everything the server has already sent.
    fn drain_socket(&mut self) -> Result<(), PortError> {
        while let Fill::Data = self.fill(Some(Duration::ZERO))? {}
        Ok(())
    }
}

impl SerialPort for NetworkPort {
    fn name(&self) -> &str {
        &self.url
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn open(&mut self) -> Result<(), PortError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream = TcpStream::connect(&self.address)?;
        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        self.decoder = TelnetDecoder::new();
        self.pending.clear();

        self.send_raw(&[IAC, WILL, COM_PORT_OPTION])?;
        self.reconfigure(true)?;
        tracing::debug!(port = %self.url, "Opened network serial port");
        Ok(())
    }

    fn close(&mut self) -> Result<(), PortError> {
        if let Some(stream) = self.stream.take() {
            // The peer may already be gone.
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        self.applied = None;
        self.pending.clear();
        Ok(())
    }

    fn read(&mut self, size: usize) -> Result<Vec<u8>, PortError> {
        if self.stream.is_none() {
            return Err(PortError::NotOpen);
        }

        let deadline = self.settings.timeout.map(|t| Instant::now() + t);
        while self.pending.len() < size {
            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    Some(deadline - now)
                }
                None => None,
            };
            match self.fill(remaining)? {
                Fill::Data => {}
                Fill::TimedOut if deadline.is_none() => {}
                Fill::TimedOut | Fill::Closed => break,
            }
        }

        let n = size.min(self.pending.len());
        Ok(self.pending.drain(..n).collect())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.send_raw(&escape_iac(data))?;
        Ok(data.len())
    }

    fn bytes_available(&mut self) -> Result<usize, PortError> {
        self.drain_socket()?;
        Ok(self.pending.len())
    }

    fn reset_input_buffer(&mut self) -> Result<(), PortError> {
        self.drain_socket()?;
        self.pending.clear();
        self.send_raw(&subnegotiation(PURGE_DATA, &[PURGE_RECEIVE]))
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
        let mut request = subnegotiation(SET_BAUDRATE, &settings.baud_rate.to_be_bytes());
        request.extend(subnegotiation(SET_DATASIZE, &[settings.data_bits]));
        request.extend(subnegotiation(SET_PARITY, &[settings.parity.rfc2217_code()]));
        request.extend(subnegotiation(SET_STOPSIZE, &[settings.stop_bits]));
        self.send_raw(&request)?;

        tracing::debug!(port = %self.url, ?settings, "Sent RFC 2217 line settings");
        self.applied = Some(settings);
        Ok(())
    }
}
