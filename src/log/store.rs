//! JSON Lines traffic log, one file per test module.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::codec::CodecError;
use crate::log::entry::{self, LogEntry, LogRecord};
use crate::traffic::TrafficLog;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("No recorded traffic for test: {test_id} (in {})", .path.display())]
    NotFound { test_id: String, path: PathBuf },
    #[error("Corrupt traffic for test {test_id}: {source}")]
    Decode {
        test_id: String,
        #[source]
        source: CodecError,
    },
    #[error("Invalid JSON on line {line} of {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize log entry: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Failed to replace log file: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// What [`LogStore::save`] did with the test's line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Replaced,
    Appended,
}

/// Handle to a single traffic log file.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the traffic recorded for `test_id`.
    ///
    /// Scans line by line and stops at the first match. A missing file is
    /// reported the same way as a missing entry.
    pub fn load(&self, test_id: &str) -> Result<TrafficLog, LogError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(self.not_found(test_id));
            }
            Err(e) => return Err(e.into()),
        };

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut object = self.parse(&line, idx + 1)?;
            let Some(value) = object.remove(test_id) else {
                continue;
            };
            let record: LogRecord = serde_json::from_value(value).map_err(|source| LogError::Json {
                path: self.path.clone(),
                line: idx + 1,
                source,
            })?;
            let log = record.to_traffic().map_err(|source| LogError::Decode {
                test_id: test_id.to_string(),
                source,
            })?;
            tracing::debug!(
                test_id,
                path = %self.path.display(),
                rx = log.rx_len(),
                tx = log.tx_len(),
                "Loaded recorded traffic"
            );
            return Ok(log);
        }

        Err(self.not_found(test_id))
    }

    /// Write `log` as the entry for `test_id`.
    ///
    /// The existing file is streamed into a temporary file next to it; the
    /// line for `test_id` is replaced in place and every other line is copied
    /// byte for byte. A new test is appended at the end. The temporary file
    /// then atomically replaces the original.
    pub fn save(&self, test_id: &str, log: &TrafficLog) -> Result<SaveOutcome, LogError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let new_line = entry::encode_line(test_id, &LogRecord::from_traffic(log))
            .map_err(LogError::Serialize)?;

        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut tmp = NamedTempFile::new_in(&dir)?;
        let mut outcome = SaveOutcome::Appended;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            let mut line = String::new();
            let mut line_no = 0;
            let mut ends_with_newline = true;

            loop {
                line.clear();
                if reader.read_line(&mut line)? == 0 {
                    break;
                }
                line_no += 1;

                if !line.trim().is_empty() && self.parse(&line, line_no)?.contains_key(test_id) {
                    // Later duplicates of the same key are dropped.
                    if outcome == SaveOutcome::Appended {
                        writeln!(out, "{new_line}")?;
                        outcome = SaveOutcome::Replaced;
                    }
                    ends_with_newline = true;
                    continue;
                }

                out.write_all(line.as_bytes())?;
                ends_with_newline = line.ends_with('\n');
            }

            if outcome == SaveOutcome::Appended {
                if !ends_with_newline {
                    out.write_all(b"\n")?;
                }
                writeln!(out, "{new_line}")?;
            }
            out.flush()?;
        }

        let permissions = fs::metadata(&self.path)?.permissions();
        fs::set_permissions(tmp.path(), permissions)?;
        tmp.persist(&self.path)?;

        tracing::debug!(
            test_id,
            path = %self.path.display(),
            outcome = ?outcome,
            "Saved recorded traffic"
        );
        Ok(outcome)
    }

    /// Test identifiers in file order.
    pub fn list(&self) -> Result<Vec<String>, LogError> {
        Ok(self.entries()?.into_iter().map(|e| e.test_id).collect())
    }

    /// Every entry in the file, in file order, without decoding the traffic.
    pub fn entries(&self) -> Result<Vec<LogEntry>, LogError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            for (test_id, value) in self.parse(&line, idx + 1)? {
                let record = serde_json::from_value(value).map_err(|source| LogError::Json {
                    path: self.path.clone(),
                    line: idx + 1,
                    source,
                })?;
                entries.push(LogEntry { test_id, record });
            }
        }

        Ok(entries)
    }

    fn parse(
        &self,
        line: &str,
        line_no: usize,
    ) -> Result<serde_json::Map<String, serde_json::Value>, LogError> {
        entry::parse_line(line).map_err(|source| LogError::Json {
            path: self.path.clone(),
            line: line_no,
            source,
        })
    }

    fn not_found(&self, test_id: &str) -> LogError {
        LogError::NotFound {
            test_id: test_id.to_string(),
            path: self.path.clone(),
        }
    }
}
