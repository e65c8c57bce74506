//! Demo configuration and layered loading.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults (`test.ini`, 5 s delay, 6 s deadline, 10 ms cancel
//!    delay, skip one line)
//! 2. A TOML file (`config-file` feature)
//! 3. `CANCEL_LINES_*` environment variables
//! 4. Programmatic overrides
//!
//! File and override keys share one vocabulary: `file`, `delay_ms`,
//! `deadline_ms`, `cancel_after_ms`, `skip_lines`, `max_line_len`,
//! `log_level`. An environment variable is the key upper-cased behind the
//! `CANCEL_LINES_` prefix.

use crate::fs::DEFAULT_MAX_LINE_LEN;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use crate::observability::LogLevel;

/// Prefix shared by all environment variables the loader reads.
pub const ENV_PREFIX: &str = "CANCEL_LINES_";

/// Settings for both demo programs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// File to read.
    #[serde(rename = "file")]
    pub path: PathBuf,
    /// How long the deadline race waits before reading.
    #[serde(rename = "delay_ms", deserialize_with = "millis")]
    pub delay: Duration,
    /// Deadline the delay races against.
    #[serde(rename = "deadline_ms", deserialize_with = "millis")]
    pub deadline: Duration,
    /// How long the background read runs before cancellation fires.
    #[serde(rename = "cancel_after_ms", deserialize_with = "millis")]
    pub cancel_after: Duration,
    /// Leading lines discarded before printing.
    pub skip_lines: usize,
    /// Longest accepted line in bytes.
    pub max_line_len: usize,
    /// Diagnostic log level for the binary.
    pub log_level: LogLevel,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("test.ini"),
            delay: Duration::from_secs(5),
            deadline: Duration::from_secs(6),
            cancel_after: Duration::from_millis(10),
            skip_lines: 1,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            log_level: LogLevel::Warn,
        }
    }
}

impl DemoConfig {
    /// Checks the configuration for values no run can use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if self.max_line_len == 0 {
            return Err(ConfigError::ZeroMaxLineLen);
        }
        Ok(())
    }

    /// Sets one field from its string form.
    ///
    /// `key` uses the file vocabulary (`delay_ms`, `skip_lines`, ...).
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "file" => self.path = PathBuf::from(value),
            "delay_ms" => self.delay = parse_millis(key, value)?,
            "deadline_ms" => self.deadline = parse_millis(key, value)?,
            "cancel_after_ms" => self.cancel_after = parse_millis(key, value)?,
            "skip_lines" => self.skip_lines = parse_usize(key, value)?,
            "max_line_len" => self.max_line_len = parse_usize(key, value)?,
            "log_level" => {
                self.log_level = value.parse().map_err(|_| invalid(key, value))?;
            }
            _ => return Err(ConfigError::InvalidOverride(key.to_owned())),
        }
        Ok(())
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| invalid(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

/// Configuration loader with layered sources.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file_path: Option<PathBuf>,
    overrides: BTreeMap<String, String>,
}

impl ConfigLoader {
    /// Creates a loader that starts from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a TOML file to layer over the defaults.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Adds a programmatic override (highest precedence).
    #[must_use]
    pub fn override_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Loads configuration using the process environment.
    pub fn load(&self) -> Result<DemoConfig, ConfigError> {
        self.load_with_env(std::env::vars_os())
    }

    /// Loads configuration using `env` in place of the process environment.
    ///
    /// Variables without the `CANCEL_LINES_` prefix are ignored, whatever
    /// their encoding. A prefixed variable that is not valid UTF-8 is an
    /// error.
    pub fn load_with_env<I, K, V>(&self, env: I) -> Result<DemoConfig, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let mut config = match &self.file_path {
            Some(path) => load_from_file(path)?,
            None => DemoConfig::default(),
        };

        for (key, value) in &prefixed_env(env)? {
            config.set(key, value)?;
        }
        for (key, value) in &self.overrides {
            config.set(key, value)?;
        }

        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }
}

fn prefixed_env<I, K, V>(env: I) -> Result<BTreeMap<String, String>, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
{
    let mut vars = BTreeMap::new();
    for (key, value) in env {
        let key = key.into();
        let name = match key.to_str() {
            Some(key) => match key.strip_prefix(ENV_PREFIX) {
                Some(name) => name.to_ascii_lowercase(),
                None => continue,
            },
            None if key.to_string_lossy().starts_with(ENV_PREFIX) => {
                return Err(ConfigError::InvalidOverride(
                    key.to_string_lossy().into_owned(),
                ));
            }
            None => continue,
        };
        let value = value.into().into_string().map_err(|raw| ConfigError::InvalidValue {
            key: name.clone(),
            value: raw.to_string_lossy().into_owned(),
        })?;
        vars.insert(name, value);
    }
    Ok(vars)
}

#[cfg(feature = "config-file")]
fn load_from_file(path: &Path) -> Result<DemoConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|err| ConfigError::Parse(err.to_string()))
}

#[cfg(not(feature = "config-file"))]
fn load_from_file(path: &Path) -> Result<DemoConfig, ConfigError> {
    tracing::warn!(path = %path.display(), "config file ignored: built without config-file");
    Err(ConfigError::FileSupportDisabled)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error while reading a configuration file.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file is not valid TOML for [`DemoConfig`].
    #[error("config parse error: {0}")]
    Parse(String),
    /// Unknown override or environment key.
    #[error("invalid override: {0}")]
    InvalidOverride(String),
    /// A value that does not parse for its key.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Key being set.
        key: String,
        /// Rejected value.
        value: String,
    },
    /// The input path is empty.
    #[error("file path must not be empty")]
    EmptyPath,
    /// `max_line_len` is zero.
    #[error("max_line_len must be > 0")]
    ZeroMaxLineLen,
    /// A file was requested but the `config-file` feature is off.
    #[error("config files require the config-file feature")]
    FileSupportDisabled,
}
