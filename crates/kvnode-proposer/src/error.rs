use thiserror::Error;

/// Failures produced by the proposal pipeline, from submission through
/// apply. Distinct from `kvnode_core::DispatchError`: this crate knows
/// nothing about wire messages, only about what went wrong getting a
/// command committed and applied.
#[derive(Debug, Error, Clone)]
pub enum ProposerError {
    #[error("propose failed: {0}")]
    ProposeFailed(String),

    #[error("apply failed: {0}")]
    ApplyFailed(String),

    #[error("response timed out")]
    Timeout,
}
