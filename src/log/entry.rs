use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codec::{self, CodecError, Encoding};
use crate::log::format;
use crate::traffic::TrafficLog;

/// Persisted form of one test's traffic.
///
/// Each field carries an optional encoding marker; without one the value
/// is base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub rx: String,
    pub tx: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_encoding: Option<Encoding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_encoding: Option<Encoding>,
}

impl LogRecord {
    /// Encode both directions independently.
    pub fn from_bytes(rx: &[u8], tx: &[u8]) -> Self {
        let (rx, rx_encoding) = codec::encode(rx);
        let (tx, tx_encoding) = codec::encode(tx);
        Self {
            rx,
            tx,
            rx_encoding,
            tx_encoding,
        }
    }

    pub fn from_traffic(log: &TrafficLog) -> Self {
        Self::from_bytes(&log.rx(), &log.tx())
    }

    pub fn to_traffic(&self) -> Result<TrafficLog, CodecError> {
        let rx = codec::decode(&self.rx, self.rx_encoding)?;
        let tx = codec::decode(&self.tx, self.tx_encoding)?;
        Ok(TrafficLog::from_parts(rx, tx))
    }
}

/// A record together with the test it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub test_id: String,
    pub record: LogRecord,
}

impl LogEntry {
    pub fn traffic(&self) -> Result<TrafficLog, CodecError> {
        self.record.to_traffic()
    }

    /// Render as a single JSON Lines line, without the trailing newline.
    pub fn to_line(&self) -> serde_json::Result<String> {
        encode_line(&self.test_id, &self.record)
    }
}

pub fn encode_line(test_id: &str, record: &LogRecord) -> serde_json::Result<String> {
    format::to_string(&BTreeMap::from([(test_id, record)]))
}

/// Parse one line into its `{test_id: record}` object without decoding records.
pub fn parse_line(line: &str) -> serde_json::Result<serde_json::Map<String, serde_json::Value>> {
    serde_json::from_str(line)
}
