//! Cancellation context.
//!
//! A [`Cx`] is a cheap-to-clone handle onto a one-shot cancellation signal.
//! The signal fires at most once, with a [`CancelReason`](crate::CancelReason); every clone of the
//! context and every child derived from it observes the same reason.
//!
//! # Deriving contexts
//!
//! ```text
//! Cx::background()                    never fires
//!   └─ Cx::with_timeout(.., 6s)       fires DeadlineExceeded after 6s,
//!        └─ Cx::with_cancel(..)       or earlier via its CancelHandle
//! ```
//!
//! Cancelling a parent cancels all of its live children with the parent's
//! reason. Cancelling a child never affects the parent.
//!
//! # Observing cancellation
//!
//! - [`Cx::err`] / [`Cx::check`]: poll the flag without blocking.
//! - [`Cx::done`]: a future that resolves when the signal fires.
//! - [`Cx::wait_timeout`]: block the current thread.
//!
//! ```
//! use cancel_lines::{Cx, Error};
//! use std::time::Duration;
//!
//! let (cx, _handle) = Cx::with_timeout(&Cx::background(), Duration::from_millis(10));
//! let reason = cx.wait_timeout(Duration::from_secs(5));
//! assert!(reason.is_some());
//! assert!(matches!(cx.check(), Err(Error::DeadlineExceeded)));
//! ```

mod context;

pub use context::{CancelHandle, Cx, Done};
