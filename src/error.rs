//! Error types for cancel-lines operations.
//!
//! Errors are explicit and typed. The two signal errors carry the exact text
//! observers print: `context canceled` and `context deadline exceeded`.
//! I/O failures keep the path they concern and the underlying
//! [`std::io::Error`] as their source.

use crate::config::ConfigError;
use std::io;
use std::path::PathBuf;

/// The main error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The context was cancelled explicitly.
    #[error("context canceled")]
    Cancelled,
    /// The context's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
    /// The input file could not be opened.
    #[error("open {}: {source}", path.display())]
    Open {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Reading from an opened file failed.
    #[error("read {}: {source}", path.display())]
    Read {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// A single line exceeded the configured maximum length.
    #[error("read {}: line exceeds {limit} bytes", path.display())]
    LineTooLong {
        /// Path being read.
        path: PathBuf,
        /// The configured limit in bytes.
        limit: usize,
    },
    /// Writing to the output sink failed.
    #[error("write output: {0}")]
    Write(#[source] io::Error),
    /// A background task could not be started.
    #[error("spawn task {name}: {source}")]
    Spawn {
        /// Name of the task.
        name: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// A background task panicked.
    #[error("task panicked: {0}")]
    Panicked(String),
    /// Configuration could not be loaded or validated.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Returns true if this error is an explicit cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if this error is a deadline expiry.
    #[must_use]
    pub const fn is_deadline(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }

    /// Returns true if this error came from a cancellation signal of either
    /// kind.
    #[must_use]
    pub const fn is_signal(&self) -> bool {
        self.is_cancelled() || self.is_deadline()
    }
}

/// A specialized Result type for cancel-lines operations.
pub type Result<T> = std::result::Result<T, Error>;
