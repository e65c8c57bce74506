//! Run a future until it completes or its context is cancelled.

use crate::cx::{Cx, Done};
use crate::error::Result;
use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future for the [`cancellable`] combinator.
#[pin_project]
#[must_use = "futures do nothing unless polled"]
pub struct Cancellable<F> {
    #[pin]
    inner: F,
    done: Done,
}

impl<F: Future> Future for Cancellable<F> {
    type Output = Result<F::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        // The signal is checked first: a cancelled context never yields a
        // value, even from a future that is already ready.
        if let Poll::Ready(reason) = Pin::new(this.done).poll(cx) {
            return Poll::Ready(Err(reason.to_error()));
        }

        this.inner.poll(cx).map(Ok)
    }
}

/// Runs `fut` until it completes or `cx` is cancelled.
///
/// On cancellation the future is dropped without being polled again and the
/// context's error is returned.
pub fn cancellable<F: Future>(cx: &Cx, fut: F) -> Cancellable<F> {
    Cancellable {
        inner: fut,
        done: cx.done(),
    }
}
