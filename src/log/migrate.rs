//! Conversion from the legacy single-object log format.
//!
//! Old recordings were one JSON object per file, mapping each test to lists
//! of byte values: `{"test": {"rx": [1], "tx": [2]}}`.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::log::entry::{LogEntry, LogRecord};

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Invalid legacy log: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Byte value {value} out of range in {field} of test {test_id}")]
    ByteOutOfRange {
        test_id: String,
        field: &'static str,
        value: u64,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct LegacyRecord {
    rx: Vec<u64>,
    tx: Vec<u64>,
}

/// `<dir>/<stem>.jsonl` next to the legacy file.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("jsonl")
}

/// Parse a legacy log into entries, keeping the order tests appear in the file.
pub fn read_legacy(input: &Path) -> Result<Vec<LogEntry>, MigrateError> {
    let reader = BufReader::new(File::open(input)?);
    let records: serde_json::Map<String, serde_json::Value> = serde_json::from_reader(reader)?;

    records
        .into_iter()
        .map(|(test_id, value)| -> Result<LogEntry, MigrateError> {
            let legacy: LegacyRecord = serde_json::from_value(value)?;
            let rx = to_bytes(&test_id, "rx", &legacy.rx)?;
            let tx = to_bytes(&test_id, "tx", &legacy.tx)?;
            Ok(LogEntry {
                record: LogRecord::from_bytes(&rx, &tx),
                test_id,
            })
        })
        .collect()
}

/// Convert `input` to the JSON Lines format at `output`. Returns the number
/// of tests written.
pub fn convert_legacy(input: &Path, output: &Path) -> Result<usize, MigrateError> {
    let entries = read_legacy(input)?;

    let mut writer = BufWriter::new(File::create(output)?);
    for entry in &entries {
        writeln!(writer, "{}", entry.to_line()?)?;
    }
    writer.flush()?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        tests = entries.len(),
        "Migrated legacy traffic log"
    );
    Ok(entries.len())
}

fn to_bytes(test_id: &str, field: &'static str, values: &[u64]) -> Result<Vec<u8>, MigrateError> {
    values
        .iter()
        .map(|&value| {
            u8::try_from(value).map_err(|_| MigrateError::ByteOutOfRange {
                test_id: test_id.to_string(),
                field,
                value,
            })
        })
        .collect()
}
