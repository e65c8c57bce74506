//! Cancellation reason and kind types.
//!
//! A cancellation signal fires at most once. The reason it fired with is kept
//! so every observer sees the same error value.

use crate::error::Error;
use core::fmt;

/// The kind of cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CancelKind {
    /// Explicit cancellation requested by user code.
    User,
    /// Cancellation because the context's deadline passed.
    DeadlineExceeded,
}

impl CancelKind {
    /// Returns true if this kind was produced by a deadline.
    #[must_use]
    pub const fn is_deadline(self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }
}

impl fmt::Display for CancelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// The reason for a cancellation, including kind and optional context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReason {
    /// The kind of cancellation.
    pub kind: CancelKind,
    /// Optional human-readable message.
    pub message: Option<&'static str>,
}

impl CancelReason {
    /// Creates a new cancellation reason with the given kind.
    #[must_use]
    pub const fn new(kind: CancelKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Creates a user cancellation reason with a message.
    #[must_use]
    pub const fn user(message: &'static str) -> Self {
        Self {
            kind: CancelKind::User,
            message: Some(message),
        }
    }

    /// Creates a deadline cancellation reason.
    #[must_use]
    pub const fn deadline() -> Self {
        Self::new(CancelKind::DeadlineExceeded)
    }

    /// Returns the kind of this cancellation reason.
    #[must_use]
    pub const fn kind(&self) -> CancelKind {
        self.kind
    }

    /// Returns true if this reason was produced by a deadline.
    #[must_use]
    pub const fn is_deadline(&self) -> bool {
        self.kind.is_deadline()
    }

    /// Converts the reason into the error value observers receive.
    ///
    /// The message is diagnostic only; the error text depends on the kind
    /// alone.
    #[must_use]
    pub fn to_error(&self) -> Error {
        match self.kind {
            CancelKind::User => Error::Cancelled,
            CancelKind::DeadlineExceeded => Error::DeadlineExceeded,
        }
    }
}

impl Default for CancelReason {
    fn default() -> Self {
        Self::new(CancelKind::User)
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(msg) = self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl From<CancelReason> for Error {
    fn from(reason: CancelReason) -> Self {
        reason.to_error()
    }
}
