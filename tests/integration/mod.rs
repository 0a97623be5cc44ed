//! Integration tests for reserial
//!
//! These tests drive sessions, ports and log files together the way a
//! device test suite would.

#[path = "../common/mod.rs"]
pub mod common;

pub mod log_files;
pub mod record_replay;
