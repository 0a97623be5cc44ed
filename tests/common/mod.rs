//! Shared test utilities for reserial
//!
//! Provides a temporary traffic log directory and canned log contents.

use std::fs;
use std::path::PathBuf;

use reserial::{ReserialConfig, TestId};
use tempfile::TempDir;

/// Module name used for every test id built by [`TrafficDir`].
pub const MODULE: &str = "device_tests";

/// Two tests that each wrote `0x02` and received `0x01`.
pub const TEST_JSONL: &str = concat!(
    "{\"test_reserial\": {\"rx\": \"AQ==\", \"tx\": \"Ag==\"}}\n",
    "{\"test_reserial2\": {\"rx\": \"AQ==\", \"tx\": \"Ag==\"}}\n",
);

/// A temporary directory holding the traffic logs of one test module.
///
/// The directory is removed when the fixture is dropped.
pub struct TrafficDir {
    _dir: TempDir,
    pub path: PathBuf,
}

impl TrafficDir {
    pub fn new() -> Self {
        reserial::init_test_logging();
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().to_path_buf();
        Self { _dir: dir, path }
    }

    /// A directory whose module log already holds [`TEST_JSONL`].
    pub fn with_recordings() -> Self {
        let traffic = Self::new();
        traffic.write_log(TEST_JSONL);
        traffic
    }

    pub fn id(&self, name: &str) -> TestId {
        TestId::new(MODULE, name)
    }

    pub fn log_path(&self) -> PathBuf {
        self.path.join(format!("{MODULE}.jsonl"))
    }

    pub fn write_log(&self, contents: &str) {
        fs::write(self.log_path(), contents).expect("Failed to write log");
    }

    pub fn read_log(&self) -> String {
        fs::read_to_string(self.log_path()).expect("Failed to read log")
    }

    pub fn replay(&self) -> ReserialConfig {
        ReserialConfig::replay().with_log_dir(&self.path)
    }

    pub fn record(&self) -> ReserialConfig {
        ReserialConfig::record().with_log_dir(&self.path)
    }

    pub fn passthrough(&self) -> ReserialConfig {
        ReserialConfig::passthrough().with_log_dir(&self.path)
    }

    /// Write `contents` to a file next to the module log.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path.join(name);
        fs::write(&path, contents).expect("Failed to write file");
        path
    }
}

impl Default for TrafficDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Lines of a log file, without their terminators.
pub fn lines(contents: &str) -> Vec<&str> {
    contents.lines().collect()
}
