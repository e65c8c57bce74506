//! cancel-lines: deadline-bounded and cancellable line reading.
//!
//! # Overview
//!
//! A small library around one behavior: read a text file line by line, but
//! only while a cancellation signal has not fired. Two demo programs are
//! built on top of it:
//!
//! - **Deadline race** ([`demo::deadline_race`]): race a fixed delay against
//!   a deadline. If the delay wins the file is printed, otherwise the
//!   deadline error is printed.
//! - **Cancellable background read** ([`demo::cancel_read`]): read the file
//!   on a background task while the main flow waits briefly and then fires
//!   cancellation.
//!
//! # Module Structure
//!
//! - [`types`]: Cancellation reason and kind types
//! - [`cx`]: Cancellation context (`Cx`), cancel handles and the `Done` future
//! - [`time`]: Timer driver, `Sleep` future
//! - [`combinator`]: `select` and `cancellable`
//! - [`fs`]: Line scanner and file line reader
//! - [`task`]: Named background tasks with join handles
//! - [`demo`]: The two demo programs as library functions
//! - [`config`]: Demo configuration and layered loading
//! - [`observability`]: Log levels and subscriber setup
//! - [`error`](mod@error): Error types
//!
//! # Example
//!
//! ```
//! use cancel_lines::Cx;
//!
//! let (cx, handle) = Cx::with_cancel(&Cx::background());
//! assert!(cx.err().is_none());
//! handle.cancel();
//! assert_eq!(cx.err().map(|e| e.to_string()).as_deref(), Some("context canceled"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod combinator;
pub mod config;
pub mod cx;
pub mod demo;
pub mod error;
pub mod fs;
pub mod observability;
pub mod task;
pub mod time;
pub mod types;

// ── Test-only modules ───────────────────────────────────────────────────
#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

// Re-exports for convenient access to core types
pub use combinator::{Either, cancellable, select};
pub use config::{ConfigError, ConfigLoader, DemoConfig, LogLevel};
pub use cx::{CancelHandle, Cx, Done};
pub use error::{Error, Result};
pub use fs::{LineReader, Lines, read_lines};
pub use task::{TaskHandle, spawn};
pub use time::{Sleep, sleep, sleep_until};
pub use types::{CancelKind, CancelReason};
