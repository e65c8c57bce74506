//! Log severity levels.
//!
//! Defines the severity levels accepted by configuration and the command
//! line, and their mapping onto `tracing` filters.

use core::fmt;
use core::str::FromStr;
use serde::Deserialize;

/// Severity level for log output.
///
/// Levels are ordered from least to most severe. Filtering can be done
/// by comparing levels: `level >= LogLevel::Warn`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    /// Fine-grained debugging information (very verbose).
    Trace = 0,
    /// Debugging information for development.
    Debug = 1,
    /// General informational messages.
    Info = 2,
    /// Potentially problematic situations.
    #[default]
    Warn = 3,
    /// Error conditions that don't halt execution.
    Error = 4,
}

impl LogLevel {
    /// Returns the level name as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Returns the level name in lowercase, as used in filter directives.
    #[must_use]
    pub const fn as_str_lower(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Returns true if this level is at least as severe as the given level.
    #[must_use]
    pub const fn is_at_least(self, other: Self) -> bool {
        self as u8 >= other as u8
    }

    /// Lowers the level by `steps`, saturating at `Trace`.
    ///
    /// Used to turn repeated `-v` flags into a more verbose level.
    #[must_use]
    pub const fn more_verbose(self, steps: u8) -> Self {
        match (self as u8).saturating_sub(steps) {
            0 => Self::Trace,
            1 => Self::Debug,
            2 => Self::Info,
            3 => Self::Warn,
            _ => Self::Error,
        }
    }

    /// Converts to the equivalent `tracing` level.
    #[must_use]
    pub const fn to_tracing(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown level name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ParseLevelError(s.to_owned())),
        }
    }
}
