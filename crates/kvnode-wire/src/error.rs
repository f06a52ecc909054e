use thiserror::Error;

/// Failures that can occur while decoding or encoding a RESP frame.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum WireError {
    #[error("ERR namespace missing or empty key")]
    NamespaceMissing,

    #[error("protocol error: {0}")]
    Protocol(&'static str),

    #[error("protocol error: expected {expected} arguments, got {got}")]
    UnexpectedArity { expected: &'static str, got: usize },
}
