//! Per-test orchestration of interception.
//!
//! A session resolves the mode from configuration, prepares the traffic
//! buffer, hands out intercepted ports and settles the traffic at the end.

mod config;
mod controller;
mod error;
mod mode;
mod test_id;

pub use config::{ReserialConfig, CONFIG_FILENAME};
pub use controller::{run, Session};
pub use error::SessionError;
pub use mode::Mode;
pub use test_id::TestId;
