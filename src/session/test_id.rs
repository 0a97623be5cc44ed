use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of a test within the traffic logs.
///
/// Tests in the same module share one log file; the test name is the key
/// inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestId {
    module: String,
    name: String,
}

impl TestId {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Split `a::b::test_name` into module and name.
    pub fn parse(qualified: &str) -> Self {
        match qualified.rsplit_once("::") {
            Some((module, name)) => Self::new(module, name),
            None => Self::new("", qualified),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Key under which this test's traffic is stored.
    pub fn key(&self) -> &str {
        &self.name
    }

    pub fn qualified(&self) -> String {
        if self.module.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.module, self.name)
        }
    }

    /// File name of the module's log, e.g. `my_crate__tests__modem.jsonl`.
    pub fn log_file_name(&self) -> String {
        if self.module.is_empty() {
            "reserial.jsonl".to_string()
        } else {
            format!("{}.jsonl", self.module.replace("::", "__"))
        }
    }

    pub fn log_path(&self, log_dir: &Path) -> PathBuf {
        log_dir.join(self.log_file_name())
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

/// Build a [`TestId`] for a test in the calling module.
///
/// ```
/// let id = reserial::test_id!(test_modem_handshake);
/// assert_eq!(id.key(), "test_modem_handshake");
/// assert_eq!(id.module(), module_path!());
/// ```
#[macro_export]
macro_rules! test_id {
    ($name:ident) => {
        $crate::TestId::new(module_path!(), stringify!($name))
    };
    ($name:expr) => {
        $crate::TestId::new(module_path!(), $name)
    };
}
