//! The consensus log itself: out of scope per the design (§1), modeled
//! here only as the trait this crate's adapter submits against, plus an
//! in-memory reference implementation used in tests and by
//! `kvnode-server` when no external log is configured.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ProposerError;

/// A durably-ordered append to the consensus log.
#[async_trait]
pub trait ConsensusLog: Send + Sync {
    /// Appends `raw` and resolves once it has been sequenced (not
    /// necessarily applied) into the replicated log. Ordering across
    /// concurrent callers is the order in which this resolves.
    async fn append(&self, raw: Bytes) -> Result<u64, ProposerError>;
}

/// A single-process stand-in for the consensus log: every append is
/// immediately "sequenced" by handing out a monotonically increasing
/// position. There is no replication and no durability; it exists so the
/// dispatch core can be exercised without a real Raft/consensus
/// implementation, which is out of scope for this layer.
#[derive(Default)]
pub struct InMemoryLog {
    next: AtomicU64,
}

impl InMemoryLog {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl ConsensusLog for InMemoryLog {
    async fn append(&self, _raw: Bytes) -> Result<u64, ProposerError> {
        Ok(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn positions_are_monotonically_increasing() {
        let log = InMemoryLog::new();
        let a = log.append(Bytes::new()).await.unwrap();
        let b = log.append(Bytes::new()).await.unwrap();
        assert!(b > a);
    }
}
