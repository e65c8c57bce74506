//! Combinators over futures and cancellation contexts.
//!
//! - [`select`](mod@select): wait for the first of two futures
//! - [`cancellable`](mod@cancellable): run a future until its context fires

pub mod cancellable;
pub mod select;

pub use cancellable::{Cancellable, cancellable};
pub use select::{Either, Select, select};
