//! Mode-dependent replacements for a port's I/O operations.
//!
//! Every port of a session, whatever its transport, is routed through
//! [`intercept`] with the same shared buffer.

mod recording;
mod replay;

pub use recording::RecordingPort;
pub use replay::ReplayPort;

use crate::port::SerialPort;
use crate::session::{Mode, SessionError};
use crate::traffic::SharedTrafficLog;

/// Select the behavior set for `mode` and install it over `port`.
///
/// Replay substitutes a simulated port with the same name and settings;
/// the real transport is dropped unopened. Record wraps the real port.
/// Passthrough hands the port back untouched.
pub fn intercept(
    mode: Mode,
    port: Box<dyn SerialPort>,
    log: &SharedTrafficLog,
) -> Result<Box<dyn SerialPort>, SessionError> {
    match mode {
        Mode::Replay => Ok(Box::new(ReplayPort::new(
            port.name(),
            port.settings().clone(),
            log.clone(),
        ))),
        Mode::Record => Ok(Box::new(RecordingPort::new(port, log.clone()))),
        Mode::Passthrough => Ok(port),
        Mode::Invalid => Err(SessionError::InvalidMode),
    }
}
