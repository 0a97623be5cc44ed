use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortError {
    #[error("Attempting to use a port that is not open")]
    NotOpen,
    #[error(
        "Written data does not match recorded data: b\"{}\" != b\"{}\"",
        .written.escape_ascii(),
        .expected.escape_ascii()
    )]
    TrafficMismatch { written: Vec<u8>, expected: Vec<u8> },
    #[error("Unsupported port URL: {0}")]
    InvalidUrl(String),
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
