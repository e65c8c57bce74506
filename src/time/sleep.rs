//! Sleep future backed by the timer driver.

use super::driver::TimerHandle;
use super::timer::TimerKey;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

#[derive(Default)]
struct WakeSlot {
    fired: AtomicBool,
    waker: Mutex<Option<Waker>>,
}

impl WakeSlot {
    fn fire(&self) {
        self.fired.store(true, Ordering::Release);
        if let Some(waker) = self.waker.lock().take() {
            waker.wake();
        }
    }
}

/// A future that completes once its deadline has passed.
///
/// The timer is registered on the first poll that finds the deadline still
/// in the future, and deregistered when the `Sleep` is dropped.
#[must_use = "futures do nothing unless polled"]
pub struct Sleep {
    deadline: Instant,
    timers: TimerHandle,
    registration: Option<(TimerKey, Arc<WakeSlot>)>,
}

impl Sleep {
    /// Creates a sleep that completes at `deadline`, using the global driver.
    pub fn until(deadline: Instant) -> Self {
        Self::until_in(deadline, TimerHandle::global())
    }

    /// Creates a sleep that completes at `deadline`, using `timers`.
    pub fn until_in(deadline: Instant, timers: TimerHandle) -> Self {
        Self {
            deadline,
            timers,
            registration: None,
        }
    }

    /// Returns the deadline of this sleep.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns true if the deadline has passed.
    #[must_use]
    pub fn is_elapsed(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.is_elapsed() {
            return Poll::Ready(());
        }

        let this = &mut *self;
        if let Some((_, slot)) = &this.registration {
            *slot.waker.lock() = Some(cx.waker().clone());
            if slot.fired.load(Ordering::Acquire) {
                return Poll::Ready(());
            }
        } else {
            let slot = Arc::new(WakeSlot::default());
            *slot.waker.lock() = Some(cx.waker().clone());
            let fire = Arc::clone(&slot);
            let key = this
                .timers
                .register(this.deadline, Box::new(move || fire.fire()));
            this.registration = Some((key, slot));
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Some((key, _)) = self.registration.take() {
            self.timers.cancel(key);
        }
    }
}

impl std::fmt::Debug for Sleep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sleep")
            .field("deadline", &self.deadline)
            .field("registered", &self.registration.is_some())
            .finish()
    }
}

/// Sleeps for `duration`.
pub fn sleep(duration: Duration) -> Sleep {
    Sleep::until(Instant::now() + duration)
}

/// Sleeps until `deadline`.
pub fn sleep_until(deadline: Instant) -> Sleep {
    Sleep::until(deadline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use crate::time::TimerDriver;
    use futures_lite::future;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn sleep_waits_at_least_duration() {
        init_test("sleep_waits_at_least_duration");
        let start = Instant::now();
        future::block_on(sleep(Duration::from_millis(30)));
        let waited = start.elapsed();
        crate::assert_with_log!(
            waited >= Duration::from_millis(30),
            "sleep returned early",
            Duration::from_millis(30),
            waited
        );
        crate::test_complete!("sleep_waits_at_least_duration");
    }

    #[test]
    fn elapsed_sleep_is_ready_without_registration() {
        init_test("elapsed_sleep_is_ready_without_registration");
        let driver = TimerDriver::new();
        let mut sleep = Sleep::until_in(Instant::now(), driver.handle());
        let ready = future::block_on(future::poll_once(&mut sleep));
        crate::assert_with_log!(ready.is_some(), "should be ready", true, ready.is_some());
        crate::assert_with_log!(
            driver.handle().pending() == 0,
            "no timer registered",
            0,
            driver.handle().pending()
        );
        crate::test_complete!("elapsed_sleep_is_ready_without_registration");
    }

    #[test]
    fn dropping_pending_sleep_deregisters() {
        init_test("dropping_pending_sleep_deregisters");
        let driver = TimerDriver::new();
        let mut sleep = Sleep::until_in(Instant::now() + Duration::from_secs(3600), driver.handle());
        let first = future::block_on(future::poll_once(&mut sleep));
        assert!(first.is_none());
        assert_eq!(driver.handle().pending(), 1);
        drop(sleep);
        assert_eq!(driver.handle().pending(), 0);
        assert_eq!(driver.handle().queued(), 0);
        crate::test_complete!("dropping_pending_sleep_deregisters");
    }
}
