//! Ledger client contract

use async_trait::async_trait;
use thiserror::Error;

use crate::lineage::MinorNeighbors;
use crate::outcome::Vote;
use crate::proposal::ProposedVersion;
use crate::types::{NodeId, PackageLocation};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A query could not be served (transport, node, or status failure).
    #[error("ledger read failed: {0}")]
    Read(String),

    /// The voting contract rejected the call. `reason` is the contract's
    /// revert string when one was returned.
    #[error("contract reverted: {message}")]
    Revert { reason: Option<String>, message: String },

    /// A transaction could not be submitted or confirmed.
    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("malformed ledger data: {0}")]
    Malformed(String),
}

/// Access to the voting registry on the ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Proposal events with block height >= `from_block`, in ledger order.
    async fn query_proposal_events(&self, from_block: u64) -> Result<Vec<ProposedVersion>, LedgerError>;

    /// Previous and next minor versions around a minor proposal.
    async fn minor_neighbors(&self, patch_node_id: &NodeId) -> Result<MinorNeighbors, LedgerError>;

    /// Location of the minor version a patch proposal patches.
    async fn patched_minor_location(&self, patch_node_id: &NodeId) -> Result<Option<PackageLocation>, LedgerError>;

    async fn submit_vote(&self, vote: &Vote) -> Result<(), LedgerError>;
}
