use thiserror::Error;

/// Which side of the dispatcher rejected a command on arity, since the
/// read and write paths historically disagree on wording (the write path
/// drops "of") and both forms must be preserved for wire compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityPath {
    Read,
    Write,
}

/// Every error kind the dispatch core can produce, one variant per §7 of
/// the covered design. Each carries enough context to render the exact
/// wire message client tests match against.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("wrong arity for '{command}'")]
    WrongArity { command: String, path: ArityPath },

    #[error("batch too large for '{command}'")]
    BatchTooLarge { command: String, limit: usize },

    #[error("namespace missing or empty key")]
    NamespaceMissing,

    #[error("admission gate rejects write")]
    SyncerOnly,

    #[error("unknown command '{command}'")]
    UnknownCommand { command: String },

    #[error("invalid response from store")]
    InvalidResponse,

    #[error("propose failed: {0}")]
    ProposeFailed(String),

    #[error("apply failed: {0}")]
    ApplyFailed(String),

    #[error("request timed out")]
    Timeout,

    /// Not one of the nine core §7 kinds: a validation-time rejection of
    /// an argument whose *shape* is correct but whose *value* isn't (the
    /// negative `SETBIT` offset supplemented feature). Kept distinct from
    /// `WrongArity` so the wire message can name the actual problem.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DispatchError {
    /// Renders the single-line `-ERR ...` wire message body (the text
    /// after the leading `-`; the RESP encoder adds the dash).
    pub fn into_wire_message(self) -> String {
        match self {
            DispatchError::WrongArity { command, path } => match path {
                ArityPath::Read => {
                    format!("ERR wrong number of arguments for '{command}' command")
                }
                ArityPath::Write => {
                    format!("ERR wrong number arguments for '{command}' command")
                }
            },
            DispatchError::BatchTooLarge { command, limit } => {
                format!("ERR batch size exceeds {limit} for '{command}' command")
            }
            DispatchError::NamespaceMissing => "ERR namespace missing or empty key".to_string(),
            DispatchError::SyncerOnly => "The cluster is only allowing syncer write".to_string(),
            DispatchError::UnknownCommand { command } => {
                format!("ERR unknown command '{command}'")
            }
            DispatchError::InvalidResponse => "ERR invalid response from store".to_string(),
            DispatchError::ProposeFailed(reason) => format!("ERR propose failed: {reason}"),
            DispatchError::ApplyFailed(reason) => format!("ERR apply failed: {reason}"),
            DispatchError::Timeout => "ERR request timed out".to_string(),
            DispatchError::InvalidArgument(reason) => format!("ERR {reason}"),
        }
    }
}

impl From<kvnode_wire::WireError> for DispatchError {
    fn from(err: kvnode_wire::WireError) -> Self {
        match err {
            kvnode_wire::WireError::NamespaceMissing => DispatchError::NamespaceMissing,
            _ => DispatchError::InvalidResponse,
        }
    }
}

impl From<kvnode_proposer::ProposerError> for DispatchError {
    fn from(err: kvnode_proposer::ProposerError) -> Self {
        match err {
            kvnode_proposer::ProposerError::ProposeFailed(reason) => DispatchError::ProposeFailed(reason),
            kvnode_proposer::ProposerError::ApplyFailed(reason) => DispatchError::ApplyFailed(reason),
            kvnode_proposer::ProposerError::Timeout => DispatchError::Timeout,
        }
    }
}

/// Store-level failures surfaced on the read path, or from an apply
/// closure before it's wrapped as `ApplyFailed` by the proposer. A wrong
/// native type or unsupported argument looks like the store returning
/// something the rewriter can't trust; an I/O failure is a genuine apply
/// failure even though no proposal was involved (e.g. a read hitting a
/// failed store).
impl From<kvnode_store::StoreError> for DispatchError {
    fn from(err: kvnode_store::StoreError) -> Self {
        match err {
            kvnode_store::StoreError::WrongType | kvnode_store::StoreError::Unsupported(_) => {
                DispatchError::InvalidResponse
            }
            kvnode_store::StoreError::Io(_) | kvnode_store::StoreError::NotRegularFile(_) => {
                DispatchError::ApplyFailed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_path_drops_of() {
        let err = DispatchError::WrongArity {
            command: "set".to_string(),
            path: ArityPath::Write,
        };
        assert_eq!(
            err.into_wire_message(),
            "ERR wrong number arguments for 'set' command"
        );
    }

    #[test]
    fn read_path_keeps_of() {
        let err = DispatchError::WrongArity {
            command: "get".to_string(),
            path: ArityPath::Read,
        };
        assert_eq!(
            err.into_wire_message(),
            "ERR wrong number of arguments for 'get' command"
        );
    }

    #[test]
    fn syncer_only_message_has_no_err_prefix() {
        assert_eq!(
            DispatchError::SyncerOnly.into_wire_message(),
            "The cluster is only allowing syncer write"
        );
    }
}
