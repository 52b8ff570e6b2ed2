//! Decides whether a per-proposal failure is ignorable or fatal.
//!
//! There is no retry class: a transient failure looks the same as a logic
//! bug at this layer, so anything not explicitly known to be harmless stops
//! the loop.

use crate::error::VerifyError;
use std::collections::HashSet;

/// Contract revert reasons meaning the vote is already moot.
pub const DEFAULT_IGNORABLE_REVERTS: &[&str] = &[
    "You already voted",
    "Voting for this version is not open",
    "Version is already published",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Known rejection; log, skip the proposal, keep going.
    Ignorable,
    /// Halt processing.
    Fatal,
}

#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    ignorable_reverts: HashSet<String>,
}

impl ErrorClassifier {
    pub fn new<I, S>(ignorable_reverts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignorable_reverts: ignorable_reverts
                .into_iter()
                .map(|r| Into::<String>::into(r).trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }

    pub fn classify(&self, err: &VerifyError) -> Classification {
        match err {
            VerifyError::ContractRevert { reason: Some(reason), .. }
                if self.ignorable_reverts.contains(reason.trim()) =>
            {
                Classification::Ignorable
            }
            _ => Classification::Fatal,
        }
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORABLE_REVERTS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revert(reason: Option<&str>) -> VerifyError {
        VerifyError::ContractRevert {
            reason: reason.map(String::from),
            message: "execution reverted".into(),
        }
    }

    #[test]
    fn test_allow_listed_revert_is_ignorable() {
        let classifier = ErrorClassifier::default();
        assert_eq!(classifier.classify(&revert(Some("You already voted"))), Classification::Ignorable);
        assert_eq!(classifier.classify(&revert(Some(" You already voted "))), Classification::Ignorable);
    }

    #[test]
    fn test_unknown_or_missing_reason_is_fatal() {
        let classifier = ErrorClassifier::default();
        assert_eq!(classifier.classify(&revert(Some("Only verifiers can vote"))), Classification::Fatal);
        assert_eq!(classifier.classify(&revert(None)), Classification::Fatal);
    }

    #[test]
    fn test_non_contract_errors_are_fatal() {
        let classifier = ErrorClassifier::new(["You already voted"]);
        for err in [
            VerifyError::LedgerRead("timeout".into()),
            VerifyError::ContentFetch { location: "Qm".into(), message: "not found".into() },
            VerifyError::Unexpected("You already voted".into()),
        ] {
            assert_eq!(classifier.classify(&err), Classification::Fatal, "{err}");
        }
    }

    #[test]
    fn test_custom_allow_list_replaces_defaults() {
        let classifier = ErrorClassifier::new(["Proposal expired", ""]);
        assert_eq!(classifier.classify(&revert(Some("Proposal expired"))), Classification::Ignorable);
        assert_eq!(classifier.classify(&revert(Some("You already voted"))), Classification::Fatal);
        assert_eq!(classifier.classify(&revert(Some(""))), Classification::Fatal);
    }
}
