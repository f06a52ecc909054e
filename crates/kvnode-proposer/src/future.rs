//! The pending-response cell that bridges an asynchronous commit to a
//! synchronous client reply.
//!
//! The source this crate generalizes from signals completion by closing a
//! channel; here a single-assignment cell plays the same role. `tokio`'s
//! oneshot channel already gives us the contract §3 requires for free: one
//! producer, one waiter, exactly-once completion enforced by ownership
//! (the [`ResponseCompleter`] is consumed by [`ResponseCompleter::complete`]),
//! and a dropped receiver does not unwind the producer side.

use crate::ProposerError;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

pub type ApplyResult<V> = Result<V, ProposerError>;

/// Producer half of a response cell. Held by the apply path; completed
/// exactly once.
pub struct ResponseCompleter<V> {
    tx: tokio::sync::oneshot::Sender<ApplyResult<V>>,
}

impl<V> ResponseCompleter<V> {
    /// Completes the cell. Consumes `self` so a second completion attempt
    /// is a compile error, not a runtime race.
    pub fn complete(self, result: ApplyResult<V>) {
        // The receiver may already be gone (client disconnected); the
        // apply itself already happened and must not be undone.
        let _ = self.tx.send(result);
    }
}

/// Consumer half of a response cell, returned to the caller of
/// [`crate::Proposer::propose`]. Read at most once per request.
pub struct ResponseFuture<V> {
    rx: tokio::sync::oneshot::Receiver<ApplyResult<V>>,
}

impl<V> Future for ResponseFuture<V> {
    type Output = ApplyResult<V>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // The completer was dropped without completing (e.g. the apply
            // task panicked); surface that as an apply failure rather than
            // hanging the caller forever.
            Poll::Ready(Err(_)) => {
                Poll::Ready(Err(ProposerError::ApplyFailed("apply task dropped".into())))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Creates a fresh single-assignment response cell.
pub fn response_cell<V>() -> (ResponseCompleter<V>, ResponseFuture<V>) {
    let (tx, rx) = tokio::sync::oneshot::channel();
    (ResponseCompleter { tx }, ResponseFuture { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_exactly_once_and_observes_value() {
        let (completer, future) = response_cell::<i64>();
        completer.complete(Ok(42));
        assert_eq!(future.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn dropped_completer_surfaces_as_apply_failed() {
        let (completer, future) = response_cell::<i64>();
        drop(completer);
        assert!(matches!(future.await, Err(ProposerError::ApplyFailed(_))));
    }

    #[tokio::test]
    async fn late_completion_after_receiver_drop_is_discarded_silently() {
        let (completer, future) = response_cell::<i64>();
        drop(future);
        completer.complete(Ok(7));
    }
}
