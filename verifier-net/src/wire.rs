//! JSON shapes spoken by the ledger gateway

use serde::{Deserialize, Serialize};
use verifier_model::{
    EventPosition, LedgerError, MinorNeighbors, NodeId, PackageLocation, ProposedVersion,
    VersionNumber, Vote,
};

#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a, P> {
    pub method: &'a str,
    pub params: P,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcErrorBody {
    pub message: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub revert_message: Option<String>,
}

impl RpcErrorBody {
    /// Contract reverts surface either as a transaction `revertMessage` or a
    /// contract error `reason`.
    pub fn revert_reason(&self) -> Option<String> {
        self.revert_message
            .clone()
            .or_else(|| self.reason.clone())
            .filter(|r| !r.is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FromBlockParams {
    pub from_block: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodeParams {
    pub patch_node_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireProposalEvent {
    pub block_number: u64,
    pub transaction_index: u32,
    pub log_index: u32,
    pub package_id: String,
    pub patch_node_id: String,
    pub major_version: u32,
    pub minor_version: u32,
    pub patch_version: u32,
    pub package_location: String,
    pub is_patch: bool,
}

impl TryFrom<WireProposalEvent> for ProposedVersion {
    type Error = LedgerError;

    fn try_from(w: WireProposalEvent) -> Result<Self, Self::Error> {
        Ok(ProposedVersion {
            package_id: node_id(&w.package_id)?,
            patch_node_id: node_id(&w.patch_node_id)?,
            version: VersionNumber::new(w.major_version, w.minor_version, w.patch_version),
            package_location: PackageLocation::new(w.package_location)
                .map_err(|e| LedgerError::Malformed(e.to_string()))?,
            is_patch: w.is_patch,
            position: EventPosition::new(w.block_number, w.transaction_index, w.log_index),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireNeighbors {
    #[serde(default)]
    pub prev_minor_node_id: Option<String>,
    #[serde(default)]
    pub prev_package_location: Option<String>,
    #[serde(default)]
    pub next_minor_node_id: Option<String>,
    #[serde(default)]
    pub next_package_location: Option<String>,
}

impl TryFrom<WireNeighbors> for MinorNeighbors {
    type Error = LedgerError;

    fn try_from(w: WireNeighbors) -> Result<Self, Self::Error> {
        Ok(MinorNeighbors {
            prev_node_id: optional_node_id(w.prev_minor_node_id)?,
            prev_location: PackageLocation::from_optional(w.prev_package_location),
            next_node_id: optional_node_id(w.next_minor_node_id)?,
            next_location: PackageLocation::from_optional(w.next_package_location),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WirePatchedMinor {
    #[serde(default)]
    pub package_location: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireVote {
    pub patch_node_id: String,
    pub prev_minor_node_id: String,
    pub next_minor_node_id: String,
    pub approved: bool,
}

impl From<&Vote> for WireVote {
    fn from(vote: &Vote) -> Self {
        Self {
            patch_node_id: vote.patch_node_id.to_prefixed_hex(),
            prev_minor_node_id: vote.prev_minor_node_id.unwrap_or(NodeId::ZERO).to_prefixed_hex(),
            next_minor_node_id: vote.next_minor_node_id.unwrap_or(NodeId::ZERO).to_prefixed_hex(),
            approved: vote.approved,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireVoteReceipt {
    pub tx_hash: String,
}

fn node_id(hex: &str) -> Result<NodeId, LedgerError> {
    NodeId::from_hex(hex).map_err(|e| LedgerError::Malformed(e.to_string()))
}

fn optional_node_id(hex: Option<String>) -> Result<Option<NodeId>, LedgerError> {
    match hex {
        Some(h) if !h.is_empty() => Ok(node_id(&h)?.non_zero()),
        _ => Ok(None),
    }
}
