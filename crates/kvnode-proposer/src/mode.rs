use crate::ProposerError;

/// Which of the two proposal encodings is active. The choice is made once
/// at server startup (`kvnode-server`'s `--propose-v2` flag) and applies to
/// every write for the process's lifetime; it is not negotiated per
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalMode {
    /// The caller has already namespace-stripped every key argument before
    /// calling `propose`. Only single-key writes are supported: a
    /// multi-key V1 frame would need to be split by namespace before
    /// submission, which this path does not implement (REDESIGN FLAGS,
    /// open question (a) — fail fast instead of falling back to V2).
    V1,
    /// The store receives the still-namespaced frame and performs its own
    /// per-key routing. Supports any number of keys.
    V2,
}

impl ProposalMode {
    /// Rejects multi-key writes under V1 before a proposal is ever built.
    pub fn check_key_count(self, key_count: usize) -> Result<(), ProposerError> {
        if self == ProposalMode::V1 && key_count > 1 {
            return Err(ProposerError::ProposeFailed(
                "multi-key write requires v2 proposer".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v1_rejects_multi_key() {
        assert!(ProposalMode::V1.check_key_count(2).is_err());
        assert!(ProposalMode::V1.check_key_count(1).is_ok());
    }

    #[test]
    fn v2_allows_any_key_count() {
        assert!(ProposalMode::V2.check_key_count(9).is_ok());
    }
}
