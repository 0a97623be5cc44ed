use super::SessionError;

/// How a session treats serial traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Feed recorded traffic back and verify writes against it.
    Replay,
    /// Leave ports alone.
    Passthrough,
    /// Observe real traffic and persist it at teardown.
    Record,
    /// Record and disable were both requested.
    Invalid,
}

impl Mode {
    /// Combine the two independent intents. Replay is the default.
    pub fn from_flags(record: bool, disable: bool) -> Self {
        match (record, disable) {
            (false, false) => Mode::Replay,
            (false, true) => Mode::Passthrough,
            (true, false) => Mode::Record,
            (true, true) => Mode::Invalid,
        }
    }

    /// Like [`Mode::from_flags`], rejecting the invalid combination.
    pub fn resolve(record: bool, disable: bool) -> Result<Self, SessionError> {
        match Self::from_flags(record, disable) {
            Mode::Invalid => Err(SessionError::InvalidMode),
            mode => Ok(mode),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Replay => "replay",
            Mode::Passthrough => "passthrough",
            Mode::Record => "record",
            Mode::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
