//! Line settings shared by every transport.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serialport::{DataBits, Parity as SpParity, StopBits};

/// Parity setting for serial port configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
    Mark,
    Space,
}

impl Parity {
    /// RFC 2217 SET-PARITY value.
    pub fn rfc2217_code(&self) -> u8 {
        match self {
            Parity::None => 1,
            Parity::Odd => 2,
            Parity::Even => 3,
            Parity::Mark => 4,
            Parity::Space => 5,
        }
    }
}

/// Serial line configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSettings {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    /// Read timeout; `None` blocks until `size` bytes arrive.
    pub timeout: Option<Duration>,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            timeout: None,
        }
    }
}

impl PortSettings {
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }
}

/// Convert our Parity enum to serialport crate's Parity type.
///
/// serialport has no mark/space parity; those fall back to none.
pub fn to_serialport_parity(p: Parity) -> SpParity {
    match p {
        Parity::Odd => SpParity::Odd,
        Parity::Even => SpParity::Even,
        Parity::None | Parity::Mark | Parity::Space => SpParity::None,
    }
}

/// Convert data bits count to serialport crate's DataBits type
pub fn to_serialport_data_bits(bits: u8) -> DataBits {
    match bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    }
}

/// Convert stop bits count to serialport crate's StopBits type
pub fn to_serialport_stop_bits(bits: u8) -> StopBits {
    match bits {
        2 => StopBits::Two,
        _ => StopBits::One,
    }
}
