//! Text encoding for persisted byte streams.
//!
//! Bytes that read as text (valid UTF-8 without control characters other
//! than tab, CR and LF) are stored literally and tagged with
//! [`Encoding::Utf8`]; anything else is stored as standard base64 with no tag.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed base64 data: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Marker stored next to a field whose value is literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "utf-8")]
    Utf8,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
        }
    }
}

/// Encode bytes for storage, preferring literal text when the bytes are text.
pub fn encode(bytes: &[u8]) -> (String, Option<Encoding>) {
    match std::str::from_utf8(bytes) {
        Ok(text) if is_text(text) => (text.to_string(), Some(Encoding::Utf8)),
        _ => (STANDARD.encode(bytes), None),
    }
}

fn is_text(text: &str) -> bool {
    !text.is_empty()
        && !text
            .chars()
            .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
}

/// Reverse of [`encode`].
pub fn decode(value: &str, encoding: Option<Encoding>) -> Result<Vec<u8>, CodecError> {
    match encoding {
        Some(Encoding::Utf8) => Ok(value.as_bytes().to_vec()),
        None => Ok(STANDARD.decode(value)?),
    }
}
