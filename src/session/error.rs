use thiserror::Error;

use crate::log::LogError;
use crate::port::PortError;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Recording and disabling interception were both requested.
    #[error("Choose one of 'record' or 'disable', not both")]
    InvalidMode,
    #[error("Configuration error: {0}")]
    Config(String),
    /// Recorded traffic could not be loaded.
    #[error(transparent)]
    Log(#[from] LogError),
    /// Recorded traffic could not be saved at teardown.
    #[error("Failed to save recorded traffic: {0}")]
    Persist(#[source] LogError),
    #[error(transparent)]
    Port(#[from] PortError),
    /// A replayed write diverged from the recording, even if the caller
    /// recovered from the error it was given at the time.
    #[error(
        "Written data does not match recorded data: b\"{}\" != b\"{}\"",
        .written.escape_ascii(),
        .expected.escape_ascii()
    )]
    TrafficMismatch { written: Vec<u8>, expected: Vec<u8> },
    /// Recorded traffic was left over when a replayed test finished.
    #[error("Some messages were not replayed:\nRemaining RX: {rx}\nRemaining TX: {tx}")]
    IncompleteReplay { rx: usize, tx: usize },
}

impl SessionError {
    /// Setup failures abort before the test body runs; the rest fail the
    /// test itself.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidMode
                | SessionError::Config(_)
                | SessionError::Log(_)
                | SessionError::Port(PortError::InvalidUrl(_))
        )
    }
}
