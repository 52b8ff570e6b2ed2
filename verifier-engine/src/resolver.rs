//! Looks up a proposal's position in its version lineage

use crate::error::VerifyError;
use std::sync::Arc;
use tracing::debug;
use verifier_model::{Ledger, LineagePosition, ProposedVersion};

#[derive(Clone)]
pub struct VersionGraphResolver {
    ledger: Arc<dyn Ledger>,
}

impl VersionGraphResolver {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Asked fresh for every proposal: the lineage can change between polls.
    pub async fn resolve(&self, proposal: &ProposedVersion) -> Result<LineagePosition, VerifyError> {
        let position = if proposal.is_patch {
            let minor_location = self.ledger.patched_minor_location(&proposal.patch_node_id).await?;
            LineagePosition::Patch { minor_location }
        } else {
            LineagePosition::Minor(self.ledger.minor_neighbors(&proposal.patch_node_id).await?)
        };
        debug!(?position, "Resolved lineage position");
        Ok(position)
    }
}
