use thiserror::Error;
use verifier_model::{EventPosition, LedgerError, NodeId};
use verifier_storage::CheckpointError;

/// Failures surfaced while processing a single proposal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("ledger read failed: {0}")]
    LedgerRead(String),

    #[error("content fetch failed for {location}: {message}")]
    ContentFetch { location: String, message: String },

    #[error("contract reverted: {message}")]
    ContractRevert { reason: Option<String>, message: String },

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl From<LedgerError> for VerifyError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Read(msg) => VerifyError::LedgerRead(msg),
            LedgerError::Revert { reason, message } => VerifyError::ContractRevert { reason, message },
            err @ (LedgerError::Transaction(_) | LedgerError::Malformed(_)) => {
                VerifyError::Unexpected(err.to_string())
            }
        }
    }
}

/// Conditions that stop the verification loop. The operator has to
/// diagnose and restart.
#[derive(Error, Debug)]
pub enum FatalError {
    #[error("proposal {node} at {position} failed: {source}")]
    Proposal {
        node: NodeId,
        position: EventPosition,
        #[source]
        source: VerifyError,
    },

    #[error("querying proposal events failed: {0}")]
    Query(#[source] VerifyError),

    #[error("checkpoint persistence failed: {0}")]
    Checkpoint(#[from] CheckpointError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_errors_map_onto_taxonomy() {
        assert_eq!(
            VerifyError::from(LedgerError::Read("down".into())),
            VerifyError::LedgerRead("down".into())
        );
        assert_eq!(
            VerifyError::from(LedgerError::Revert { reason: Some("r".into()), message: "m".into() }),
            VerifyError::ContractRevert { reason: Some("r".into()), message: "m".into() }
        );
        assert!(matches!(
            VerifyError::from(LedgerError::Malformed("bad id".into())),
            VerifyError::Unexpected(_)
        ));
        assert!(matches!(
            VerifyError::from(LedgerError::Transaction("nonce too low".into())),
            VerifyError::Unexpected(_)
        ));
    }
}
