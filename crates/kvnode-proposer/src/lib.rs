//! Bridges the synchronous client request/response cycle to the
//! asynchronous consensus-log commit: the [`ConsensusLog`] collaborator
//! interface, the [`ProposerAdapter`] that submits raw frames against it,
//! and the single-assignment [`ResponseFuture`] cell the apply path
//! completes.
//!
//! This crate knows nothing about command semantics, namespaces, or wire
//! types — that's `kvnode-core`'s job. It only knows how to get bytes
//! committed and how to let exactly one waiter observe the result.

mod adapter;
mod error;
mod future;
mod log;
mod mode;

pub use adapter::ProposerAdapter;
pub use error::ProposerError;
pub use future::{response_cell, ApplyResult, ResponseCompleter, ResponseFuture};
pub use log::{ConsensusLog, InMemoryLog};
pub use mode::ProposalMode;
