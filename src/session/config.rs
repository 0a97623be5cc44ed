//! Session configuration: defaults, optional `reserial.toml`, environment.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{Mode, SessionError};

const ENV_RECORD: &str = "RESERIAL_RECORD";
const ENV_DISABLE: &str = "RESERIAL_DISABLE";
const ENV_LOG_DIR: &str = "RESERIAL_LOG_DIR";
const ENV_CONFIG: &str = "RESERIAL_CONFIG";

pub const CONFIG_FILENAME: &str = "reserial.toml";

/// Inputs that decide how sessions run and where logs live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReserialConfig {
    /// Record real traffic instead of replaying it.
    pub record: bool,
    /// Disable interception entirely.
    pub disable: bool,
    /// Directory holding the per-module log files.
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlReserialConfig {
    record: Option<bool>,
    disable: Option<bool>,
    log_dir: Option<PathBuf>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
struct TomlConfig {
    reserial: Option<TomlReserialConfig>,
}

impl ReserialConfig {
    pub fn replay() -> Self {
        Self::default()
    }

    pub fn record() -> Self {
        Self::default().with_record(true)
    }

    pub fn passthrough() -> Self {
        Self::default().with_disable(true)
    }

    pub fn with_record(mut self, record: bool) -> Self {
        self.record = record;
        self
    }

    pub fn with_disable(mut self, disable: bool) -> Self {
        self.disable = disable;
        self
    }

    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    /// Defaults, then the config file if present, then the environment.
    pub fn load() -> Result<Self, SessionError> {
        let mut config = Self::default();

        let path = std::env::var_os(ENV_CONFIG)
            .map(PathBuf::from)
            .unwrap_or_else(|| base_dir().join(CONFIG_FILENAME));
        if path.exists() {
            config.merge_file(&path)?;
        }

        config.merge_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Merge the `[reserial]` table of a TOML file.
    pub fn merge_file(&mut self, path: &Path) -> Result<(), SessionError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| SessionError::Config(format!("{}: {e}", path.display())))?;
        self.merge_toml(&contents)
            .map_err(|e| SessionError::Config(format!("{}: {e}", path.display())))
    }

    pub fn merge_toml(&mut self, contents: &str) -> Result<(), toml::de::Error> {
        let parsed: TomlConfig = toml::from_str(contents)?;
        if let Some(section) = parsed.reserial {
            if let Some(record) = section.record {
                self.record = record;
            }
            if let Some(disable) = section.disable {
                self.disable = disable;
            }
            if let Some(log_dir) = section.log_dir {
                self.log_dir = Some(log_dir);
            }
        }
        Ok(())
    }

    /// Apply overrides from an environment lookup.
    pub fn merge_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_RECORD) {
            self.record = is_truthy(&value);
        }
        if let Some(value) = lookup(ENV_DISABLE) {
            self.disable = is_truthy(&value);
        }
        if let Some(value) = lookup(ENV_LOG_DIR).filter(|v| !v.trim().is_empty()) {
            self.log_dir = Some(PathBuf::from(value));
        }
    }

    pub fn mode(&self) -> Result<Mode, SessionError> {
        Mode::resolve(self.record, self.disable)
    }

    /// Effective log directory; relative paths are taken from the crate root.
    pub fn log_dir(&self) -> PathBuf {
        match &self.log_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base_dir().join(dir),
            None => base_dir().join("tests").join("reserial"),
        }
    }
}

/// The crate under test when run by cargo, otherwise the working directory.
fn base_dir() -> PathBuf {
    std::env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}
