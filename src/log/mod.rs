//! On-disk traffic logs.
//!
//! One JSON Lines file per test module; each line is a single-key object
//! mapping a test name to its recorded `rx`/`tx` streams.

pub mod entry;
pub mod format;
pub mod migrate;
mod store;

pub use entry::{LogEntry, LogRecord};
pub use migrate::{convert_legacy, MigrateError};
pub use store::{LogError, LogStore, SaveOutcome};
