//! One proposal through Resolver -> Fetcher -> Evaluator, without voting

use crate::error::VerifyError;
use crate::evaluator::{CompatibilityEvaluator, ResolvedLineage};
use crate::fetcher::SchemaFetcher;
use crate::resolver::VersionGraphResolver;
use tracing::info;
use verifier_model::{LineagePosition, ProposedVersion, VerificationOutcome};

#[derive(Clone)]
pub struct VersionVerifier {
    resolver: VersionGraphResolver,
    fetcher: SchemaFetcher,
    evaluator: CompatibilityEvaluator,
}

impl VersionVerifier {
    pub fn new(resolver: VersionGraphResolver, fetcher: SchemaFetcher, evaluator: CompatibilityEvaluator) -> Self {
        Self { resolver, fetcher, evaluator }
    }

    /// Decide on `proposal`. A pure function of ledger and content-store
    /// state: same inputs, same outcome.
    pub async fn verify(&self, proposal: &ProposedVersion) -> Result<VerificationOutcome, VerifyError> {
        info!(
            node = %proposal.patch_node_id.short(),
            version = %proposal.version,
            patch = proposal.is_patch,
            "Verifying proposed version"
        );

        let proposed = self.fetcher.fetch_proposed(&proposal.package_location).await?;
        let position = self.resolver.resolve(proposal).await?;

        let Some(proposed) = proposed else {
            return Ok(rejected(&position));
        };

        let lineage = match position {
            LineagePosition::Patch { minor_location } => ResolvedLineage::Patch {
                minor_schema: self.fetcher.fetch_lenient(minor_location.as_ref()).await,
            },
            LineagePosition::Minor(neighbors) => ResolvedLineage::Minor {
                prev_node_id: neighbors.prev_node_id,
                prev_schema: self.fetcher.fetch_lenient(neighbors.prev_location.as_ref()).await,
                next_node_id: neighbors.next_node_id,
                next_schema: self.fetcher.fetch_lenient(neighbors.next_location.as_ref()).await,
            },
        };

        Ok(self.evaluator.evaluate(&proposed, &lineage))
    }
}

/// Rejection that still carries the lineage pointers.
fn rejected(position: &LineagePosition) -> VerificationOutcome {
    match position {
        LineagePosition::Patch { .. } => VerificationOutcome::patch(false),
        LineagePosition::Minor(neighbors) => VerificationOutcome {
            approved: false,
            prev_minor_node_id: neighbors.prev_node_id,
            next_minor_node_id: neighbors.next_node_id,
        },
    }
}
