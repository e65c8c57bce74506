//! Select combinator: wait for the first of two futures to complete.

use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Result of a select operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Either<A, B> {
    /// The first future completed first.
    Left(A),
    /// The second future completed first.
    Right(B),
}

impl<A, B> Either<A, B> {
    /// Returns true if this is the Left variant.
    pub const fn is_left(&self) -> bool {
        matches!(self, Self::Left(_))
    }

    /// Returns true if this is the Right variant.
    pub const fn is_right(&self) -> bool {
        matches!(self, Self::Right(_))
    }
}

/// Future for the [`select`] combinator.
///
/// Polls `a` before `b` on every wakeup, so when both are ready on the same
/// poll the first future wins. The losing future is dropped with the
/// `Select`.
#[pin_project]
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct Select<A, B> {
    #[pin]
    a: A,
    #[pin]
    b: B,
}

impl<A, B> Select<A, B> {
    /// Creates a new select combinator.
    pub const fn new(a: A, b: B) -> Self {
        Self { a, b }
    }
}

impl<A: Future, B: Future> Future for Select<A, B> {
    type Output = Either<A::Output, B::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if let Poll::Ready(val) = this.a.poll(cx) {
            return Poll::Ready(Either::Left(val));
        }

        if let Poll::Ready(val) = this.b.poll(cx) {
            return Poll::Ready(Either::Right(val));
        }

        Poll::Pending
    }
}

/// Waits for whichever of `a` and `b` completes first.
pub const fn select<A, B>(a: A, b: B) -> Select<A, B>
where
    A: Future,
    B: Future,
{
    Select::new(a, b)
}
