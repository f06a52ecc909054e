//! The proposer adapter: §4.5 of the covered design. Submits a raw
//! command frame to the consensus log and returns a [`ResponseFuture`]
//! immediately; the apply side completes that future once (and only
//! once) the committed entry has been applied against the store.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

use crate::future::{response_cell, ResponseFuture};
use crate::log::ConsensusLog;
use crate::mode::ProposalMode;
use crate::ProposerError;

pub struct ProposerAdapter<L: ConsensusLog> {
    log: Arc<L>,
    mode: ProposalMode,
}

impl<L: ConsensusLog> ProposerAdapter<L> {
    pub fn new(log: Arc<L>, mode: ProposalMode) -> Self {
        Self { log, mode }
    }

    pub fn mode(&self) -> ProposalMode {
        self.mode
    }

    /// Submits `raw` (the canonically re-encoded, namespace-stripped
    /// frame the caller built per the active [`ProposalMode`]) to the
    /// consensus log, then returns a future that `apply` will complete
    /// once this entry is applied.
    ///
    /// `apply` is supplied by the caller (which already holds the
    /// resolved command descriptor) rather than threaded through the log
    /// itself, so this crate never needs to know about command semantics
    /// or the store's value types.
    #[tracing::instrument(skip_all)]
    pub async fn propose<V, F, Fut>(
        &self,
        raw: Bytes,
        apply: F,
    ) -> Result<ResponseFuture<V>, ProposerError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, ProposerError>> + Send + 'static,
        V: Send + 'static,
    {
        self.log.append(raw).await?;

        let (completer, future) = response_cell::<V>();
        tokio::spawn(async move {
            let result = apply().await;
            completer.complete(result);
        });
        Ok(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::InMemoryLog;

    #[tokio::test]
    async fn propose_completes_future_after_apply() {
        let adapter = ProposerAdapter::new(Arc::new(InMemoryLog::new()), ProposalMode::V2);
        let future = adapter
            .propose(Bytes::from_static(b"frame"), || async { Ok::<_, ProposerError>(7_i64) })
            .await
            .unwrap();
        assert_eq!(future.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn propose_surfaces_apply_failure() {
        let adapter = ProposerAdapter::new(Arc::new(InMemoryLog::new()), ProposalMode::V1);
        let future = adapter
            .propose(Bytes::from_static(b"frame"), || async {
                Err::<i64, _>(ProposerError::ApplyFailed("boom".into()))
            })
            .await
            .unwrap();
        assert!(matches!(future.await, Err(ProposerError::ApplyFailed(_))));
    }
}
