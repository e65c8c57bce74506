//! Time primitives: a timer driver and the `Sleep` future.
//!
//! - [`timer`]: min-heap of deadlines
//! - [`driver`]: worker thread that runs expired registrations
//! - [`sleep`](mod@sleep): a future that completes at a deadline

pub mod driver;
pub mod sleep;
pub mod timer;

pub use driver::{TimerAction, TimerDriver, TimerHandle};
pub use sleep::{Sleep, sleep, sleep_until};
pub use timer::{TimerHeap, TimerKey};
