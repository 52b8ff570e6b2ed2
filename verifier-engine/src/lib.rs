//! Verifier Engine
//!
//! Watches the ledger for proposed package versions, decides whether each
//! proposal slots into its version lineage without breaking compatibility,
//! and votes accordingly. Progress is checkpointed so that restarts neither
//! skip nor re-vote proposals.

pub mod error;
pub mod classifier;
pub mod fetcher;
pub mod resolver;
pub mod evaluator;
pub mod verifier;
pub mod verification_loop;

pub use classifier::{Classification, ErrorClassifier, DEFAULT_IGNORABLE_REVERTS};
pub use error::{FatalError, VerifyError};
pub use evaluator::{CompatibilityEvaluator, ResolvedLineage};
pub use fetcher::SchemaFetcher;
pub use resolver::VersionGraphResolver;
pub use verification_loop::{IterationReport, VerificationLoop};
pub use verifier::VersionVerifier;
