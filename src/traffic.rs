//! In-memory traffic buffers for one test session.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// Buffer shared between the session and every port it intercepts.
pub type SharedTrafficLog = Arc<Mutex<TrafficLog>>;

/// A write that did not match the recorded `tx` stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub written: Vec<u8>,
    pub expected: Vec<u8>,
}

/// Received (`rx`) and transmitted (`tx`) bytes, consumed from the front.
///
/// The first divergent write is remembered for the rest of the session,
/// whatever the caller does with the error it was handed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrafficLog {
    rx: VecDeque<u8>,
    tx: VecDeque<u8>,
    mismatch: Option<Mismatch>,
}

impl TrafficLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(rx: Vec<u8>, tx: Vec<u8>) -> Self {
        Self {
            rx: rx.into(),
            tx: tx.into(),
            mismatch: None,
        }
    }

    pub fn shared(self) -> SharedTrafficLog {
        Arc::new(Mutex::new(self))
    }

    pub fn rx(&self) -> Vec<u8> {
        self.rx.iter().copied().collect()
    }

    pub fn tx(&self) -> Vec<u8> {
        self.tx.iter().copied().collect()
    }

    pub fn rx_len(&self) -> usize {
        self.rx.len()
    }

    pub fn tx_len(&self) -> usize {
        self.tx.len()
    }

    /// True once both directions have been fully consumed.
    pub fn is_drained(&self) -> bool {
        self.rx.is_empty() && self.tx.is_empty()
    }

    pub fn extend_rx(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }

    pub fn extend_tx(&mut self, data: &[u8]) {
        self.tx.extend(data.iter().copied());
    }

    /// Remove and return up to `size` bytes from the front of `rx`.
    pub fn take_rx(&mut self, size: usize) -> Vec<u8> {
        let n = size.min(self.rx.len());
        self.rx.drain(..n).collect()
    }

    /// Bytes at the front of `tx` that a write of `len` bytes is compared against.
    pub fn peek_tx(&self, len: usize) -> Vec<u8> {
        self.tx.iter().take(len).copied().collect()
    }

    /// Consume `data` from the front of `tx` if it matches exactly.
    ///
    /// Returns the expected prefix on mismatch and leaves `tx` untouched.
    /// The first mismatch is latched; see [`TrafficLog::mismatch`].
    pub fn consume_tx(&mut self, data: &[u8]) -> Result<(), Vec<u8>> {
        if data.len() <= self.tx.len() && self.tx.iter().take(data.len()).eq(data.iter()) {
            self.tx.drain(..data.len());
            return Ok(());
        }

        let expected = self.peek_tx(data.len());
        self.mismatch.get_or_insert_with(|| Mismatch {
            written: data.to_vec(),
            expected: expected.clone(),
        });
        Err(expected)
    }

    /// The first write that diverged from the recording, if any.
    pub fn mismatch(&self) -> Option<&Mismatch> {
        self.mismatch.as_ref()
    }
}
