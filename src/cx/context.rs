//! The `Cx` type and its cancel handle.

use crate::error::{Error, Result};
use crate::time::{TimerHandle, TimerKey};
use crate::types::CancelReason;
use parking_lot::{Condvar, Mutex};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

#[derive(Default)]
struct SignalState {
    reason: Option<CancelReason>,
    wakers: Vec<Waker>,
    children: Vec<Weak<Signal>>,
    timer: Option<(TimerHandle, TimerKey)>,
}

/// Shared one-shot signal behind every `Cx` clone.
#[derive(Default)]
struct Signal {
    state: Mutex<SignalState>,
    fired: Condvar,
    deadline: Option<Instant>,
}

impl Signal {
    fn with_deadline(deadline: Option<Instant>) -> Self {
        Self {
            deadline,
            ..Self::default()
        }
    }

    /// Fires the signal. Returns `false` if it had already fired.
    fn fire(&self, reason: &CancelReason) -> bool {
        let (wakers, children, timer) = {
            let mut state = self.state.lock();
            if state.reason.is_some() {
                return false;
            }
            state.reason = Some(reason.clone());
            (
                std::mem::take(&mut state.wakers),
                std::mem::take(&mut state.children),
                state.timer.take(),
            )
        };
        tracing::debug!(%reason, children = children.len(), "cancellation signal fired");

        self.fired.notify_all();
        if let Some((timers, key)) = timer {
            timers.cancel(key);
        }
        for waker in wakers {
            waker.wake();
        }
        for child in children.iter().filter_map(Weak::upgrade) {
            child.fire(reason);
        }
        true
    }

    fn reason(&self) -> Option<CancelReason> {
        self.state.lock().reason.clone()
    }
}

/// A cancellation context.
///
/// Cloning a `Cx` is cheap and yields a handle onto the same signal.
#[derive(Clone)]
pub struct Cx {
    signal: Arc<Signal>,
}

impl Cx {
    /// Returns a root context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self {
            signal: Arc::new(Signal::default()),
        }
    }

    /// Derives a child context that can be cancelled through the returned
    /// handle.
    #[must_use]
    pub fn with_cancel(parent: &Self) -> (Self, CancelHandle) {
        let child = Self::derive(parent, parent.deadline());
        let handle = CancelHandle {
            signal: Arc::clone(&child.signal),
        };
        (child, handle)
    }

    /// Derives a child context that is cancelled with
    /// [`DeadlineExceeded`](crate::CancelKind::DeadlineExceeded) once
    /// `deadline` passes.
    ///
    /// If the parent's deadline is earlier, the child keeps the parent's
    /// deadline and is cancelled through the parent. A deadline that has
    /// already passed yields a context that is cancelled on return.
    #[must_use]
    pub fn with_deadline(parent: &Self, deadline: Instant) -> (Self, CancelHandle) {
        Self::with_deadline_in(parent, deadline, TimerHandle::global())
    }

    /// Like [`with_deadline`](Self::with_deadline), registering the deadline
    /// with `timers` instead of the global driver.
    #[must_use]
    pub fn with_deadline_in(
        parent: &Self,
        deadline: Instant,
        timers: TimerHandle,
    ) -> (Self, CancelHandle) {
        if let Some(current) = parent.deadline() {
            if current <= deadline {
                return Self::with_cancel(parent);
            }
        }

        let child = Self::derive(parent, Some(deadline));
        let handle = CancelHandle {
            signal: Arc::clone(&child.signal),
        };

        if Instant::now() >= deadline {
            child.signal.fire(&CancelReason::deadline());
            return (child, handle);
        }

        let weak = Arc::downgrade(&child.signal);
        let key = timers.register(
            deadline,
            Box::new(move || {
                if let Some(signal) = weak.upgrade() {
                    signal.fire(&CancelReason::deadline());
                }
            }),
        );
        {
            let mut state = child.signal.state.lock();
            if state.reason.is_some() {
                drop(state);
                timers.cancel(key);
            } else {
                state.timer = Some((timers, key));
            }
        }

        (child, handle)
    }

    /// Derives a child context whose deadline is `timeout` from now.
    #[must_use]
    pub fn with_timeout(parent: &Self, timeout: Duration) -> (Self, CancelHandle) {
        Self::with_deadline(parent, Instant::now() + timeout)
    }

    fn derive(parent: &Self, deadline: Option<Instant>) -> Self {
        let child = Self {
            signal: Arc::new(Signal::with_deadline(deadline)),
        };

        let inherited = {
            let mut state = parent.signal.state.lock();
            match &state.reason {
                Some(reason) => Some(reason.clone()),
                None => {
                    state.children.retain(|c| c.strong_count() > 0);
                    state.children.push(Arc::downgrade(&child.signal));
                    None
                }
            }
        };
        if let Some(reason) = inherited {
            child.signal.fire(&reason);
        }
        child
    }

    /// Returns the reason the context was cancelled, if it has been.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        self.signal.reason()
    }

    /// Returns the error associated with the cancellation, if any.
    ///
    /// `None` while the context is live; afterwards always the same error
    /// kind (`context canceled` or `context deadline exceeded`).
    #[must_use]
    pub fn err(&self) -> Option<Error> {
        self.reason().map(|reason| reason.to_error())
    }

    /// Returns `Err` with the cancellation error if the context has fired.
    pub fn check(&self) -> Result<()> {
        self.err().map_or(Ok(()), Err)
    }

    /// Returns true if the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.signal.state.lock().reason.is_some()
    }

    /// Returns the deadline, if the context or an ancestor has one.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.signal.deadline
    }

    /// Returns the time left until the deadline, zero once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns a future that resolves with the reason once the context is
    /// cancelled.
    pub fn done(&self) -> Done {
        Done {
            signal: Arc::clone(&self.signal),
        }
    }

    /// Blocks the current thread until the context is cancelled or `timeout`
    /// elapses. Returns the reason if it fired.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> Option<CancelReason> {
        let until = Instant::now() + timeout;
        let mut state = self.signal.state.lock();
        while state.reason.is_none() {
            if self.signal.fired.wait_until(&mut state, until).timed_out() {
                break;
            }
        }
        state.reason.clone()
    }
}

impl std::fmt::Debug for Cx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cx")
            .field("deadline", &self.deadline())
            .field("reason", &self.reason())
            .finish()
    }
}

/// Cancels the context it was created with.
///
/// Dropping the handle also cancels the context and releases its deadline
/// timer, so a context never outlives the scope that owns its handle.
#[must_use = "dropping a CancelHandle cancels its context immediately"]
pub struct CancelHandle {
    signal: Arc<Signal>,
}

impl CancelHandle {
    /// Cancels the context with a user reason.
    ///
    /// Returns `false` if the context had already been cancelled; the first
    /// reason is kept.
    pub fn cancel(&self) -> bool {
        self.cancel_with(&CancelReason::new(crate::CancelKind::User))
    }

    /// Cancels the context with `reason`.
    pub fn cancel_with(&self, reason: &CancelReason) -> bool {
        self.signal.fire(reason)
    }

    /// Returns true if the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.signal.state.lock().reason.is_some()
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.signal
            .fire(&CancelReason::user("cancel handle dropped"));
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Future returned by [`Cx::done`].
#[must_use = "futures do nothing unless polled"]
pub struct Done {
    signal: Arc<Signal>,
}

impl Future for Done {
    type Output = CancelReason;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<CancelReason> {
        let mut state = self.signal.state.lock();
        if let Some(reason) = &state.reason {
            return Poll::Ready(reason.clone());
        }
        if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            state.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl std::fmt::Debug for Done {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Done").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CancelKind;
    use crate::test_utils::init_test_logging;
    use crate::time::TimerDriver;
    use futures_lite::future;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn background_is_never_cancelled() {
        init_test("background_is_never_cancelled");
        let cx = Cx::background();
        assert!(cx.err().is_none());
        assert!(cx.check().is_ok());
        assert!(cx.deadline().is_none());
        assert!(cx.remaining().is_none());
        let polled = future::block_on(future::poll_once(cx.done()));
        crate::assert_with_log!(polled.is_none(), "done pending", true, polled.is_none());
        crate::test_complete!("background_is_never_cancelled");
    }

    #[test]
    fn cancel_fires_once_and_keeps_first_reason() {
        init_test("cancel_fires_once_and_keeps_first_reason");
        let (cx, handle) = Cx::with_cancel(&Cx::background());
        let first = handle.cancel_with(&CancelReason::user("first"));
        let second = handle.cancel_with(&CancelReason::deadline());
        crate::assert_with_log!(first, "first cancel fires", true, first);
        crate::assert_with_log!(!second, "second cancel is a no-op", false, second);

        let reason = cx.reason();
        crate::assert_with_log!(
            reason == Some(CancelReason::user("first")),
            "first reason wins",
            Some(CancelReason::user("first")),
            reason
        );
        assert!(matches!(cx.err(), Some(Error::Cancelled)));
        assert!(!handle.cancel());
        crate::test_complete!("cancel_fires_once_and_keeps_first_reason");
    }

    #[test]
    fn clones_observe_the_same_signal() {
        init_test("clones_observe_the_same_signal");
        let (cx, handle) = Cx::with_cancel(&Cx::background());
        let observers: Vec<Cx> = (0..4).map(|_| cx.clone()).collect();
        assert!(observers.iter().all(|o| !o.is_cancelled()));
        handle.cancel();
        assert!(observers.iter().all(Cx::is_cancelled));
        crate::test_complete!("clones_observe_the_same_signal");
    }

    #[test]
    fn dropping_handle_cancels() {
        init_test("dropping_handle_cancels");
        let (cx, handle) = Cx::with_cancel(&Cx::background());
        drop(handle);
        assert!(matches!(cx.err(), Some(Error::Cancelled)));
        crate::test_complete!("dropping_handle_cancels");
    }

    #[test]
    fn parent_cancellation_propagates_to_children() {
        init_test("parent_cancellation_propagates_to_children");
        let (parent, parent_handle) = Cx::with_cancel(&Cx::background());
        let (child, _child_handle) = Cx::with_cancel(&parent);
        let (grandchild, _gc_handle) = Cx::with_cancel(&child);

        parent_handle.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
        assert_eq!(grandchild.reason().map(|r| r.kind), Some(CancelKind::User));
        crate::test_complete!("parent_cancellation_propagates_to_children");
    }

    #[test]
    fn child_cancellation_does_not_reach_parent() {
        init_test("child_cancellation_does_not_reach_parent");
        let (parent, _parent_handle) = Cx::with_cancel(&Cx::background());
        let (child, child_handle) = Cx::with_cancel(&parent);
        child_handle.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
        crate::test_complete!("child_cancellation_does_not_reach_parent");
    }

    #[test]
    fn child_of_cancelled_parent_is_born_cancelled() {
        init_test("child_of_cancelled_parent_is_born_cancelled");
        let (parent, handle) = Cx::with_cancel(&Cx::background());
        handle.cancel();
        let (child, _child_handle) = Cx::with_cancel(&parent);
        assert!(matches!(child.err(), Some(Error::Cancelled)));
        crate::test_complete!("child_of_cancelled_parent_is_born_cancelled");
    }

    #[test]
    fn deadline_fires_with_deadline_exceeded() {
        init_test("deadline_fires_with_deadline_exceeded");
        let driver = TimerDriver::new();
        let deadline = Instant::now() + Duration::from_millis(20);
        let (cx, _handle) = Cx::with_deadline_in(&Cx::background(), deadline, driver.handle());
        assert_eq!(cx.deadline(), Some(deadline));

        let reason = future::block_on(cx.done());
        crate::assert_with_log!(
            reason.is_deadline(),
            "deadline reason",
            CancelKind::DeadlineExceeded,
            reason.kind
        );
        assert!(Instant::now() >= deadline);
        let text = cx.err().map(|e| e.to_string());
        assert_eq!(text.as_deref(), Some("context deadline exceeded"));
        assert_eq!(cx.remaining(), Some(Duration::ZERO));
        crate::test_complete!("deadline_fires_with_deadline_exceeded");
    }

    #[test]
    fn past_deadline_is_cancelled_on_return() {
        init_test("past_deadline_is_cancelled_on_return");
        let driver = TimerDriver::new();
        let (cx, _handle) = Cx::with_deadline_in(&Cx::background(), Instant::now(), driver.handle());
        assert!(matches!(cx.err(), Some(Error::DeadlineExceeded)));
        assert_eq!(driver.handle().pending(), 0);
        crate::test_complete!("past_deadline_is_cancelled_on_return");
    }

    #[test]
    fn cancel_before_deadline_releases_timer() {
        init_test("cancel_before_deadline_releases_timer");
        let driver = TimerDriver::new();
        let (cx, handle) = Cx::with_deadline_in(
            &Cx::background(),
            Instant::now() + Duration::from_secs(3600),
            driver.handle(),
        );
        assert_eq!(driver.handle().pending(), 1);
        handle.cancel();
        assert_eq!(driver.handle().pending(), 0);
        assert!(matches!(cx.err(), Some(Error::Cancelled)));
        crate::test_complete!("cancel_before_deadline_releases_timer");
    }

    #[test]
    fn child_keeps_earlier_parent_deadline() {
        init_test("child_keeps_earlier_parent_deadline");
        let driver = TimerDriver::new();
        let early = Instant::now() + Duration::from_secs(60);
        let (parent, _ph) = Cx::with_deadline_in(&Cx::background(), early, driver.handle());
        let (child, _ch) = Cx::with_deadline_in(&parent, early + Duration::from_secs(60), driver.handle());
        assert_eq!(child.deadline(), Some(early));
        assert_eq!(driver.handle().pending(), 1, "child reuses the parent's timer");

        let later = Instant::now() + Duration::from_secs(30);
        let (tighter, _th) = Cx::with_deadline_in(&parent, later, driver.handle());
        assert_eq!(tighter.deadline(), Some(later));
        crate::test_complete!("child_keeps_earlier_parent_deadline");
    }

    #[test]
    fn wait_timeout_returns_none_while_live() {
        init_test("wait_timeout_returns_none_while_live");
        let (cx, _handle) = Cx::with_cancel(&Cx::background());
        assert!(cx.wait_timeout(Duration::from_millis(10)).is_none());
        crate::test_complete!("wait_timeout_returns_none_while_live");
    }

    #[test]
    fn wait_timeout_wakes_on_cancel_from_other_thread() {
        init_test("wait_timeout_wakes_on_cancel_from_other_thread");
        let (cx, handle) = Cx::with_cancel(&Cx::background());
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            handle.cancel();
        });
        let reason = cx.wait_timeout(Duration::from_secs(5));
        canceller.join().unwrap();
        assert_eq!(reason.map(|r| r.kind), Some(CancelKind::User));
        crate::test_complete!("wait_timeout_wakes_on_cancel_from_other_thread");
    }
}
