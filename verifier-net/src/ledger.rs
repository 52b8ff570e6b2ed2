use crate::wire::{
    FromBlockParams, NodeParams, RpcErrorBody, RpcRequest, RpcResponse, WireNeighbors,
    WirePatchedMinor, WireProposalEvent, WireVote, WireVoteReceipt,
};
use crate::{normalize_base, VerifierNetError};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use verifier_model::{
    Ledger, LedgerError, MinorNeighbors, NodeId, PackageLocation, ProposedVersion, Vote,
};

const RPC_PATH: &str = "rpc";

/// Failure of a single gateway call, before it is mapped onto a [`LedgerError`]
/// according to whether the call was a read or a transaction.
#[derive(Debug)]
enum CallFailure {
    Transport(String),
    Status { status: u16, body: String },
    Rpc(RpcErrorBody),
    Decode(String),
}

impl CallFailure {
    fn into_read_error(self) -> LedgerError {
        match self {
            CallFailure::Transport(e) => LedgerError::Read(e),
            CallFailure::Status { status, body } => LedgerError::Read(format!("status {}: {}", status, body)),
            CallFailure::Rpc(body) => LedgerError::Read(body.message),
            CallFailure::Decode(e) => LedgerError::Malformed(e),
        }
    }

    fn into_transaction_error(self) -> LedgerError {
        match self {
            CallFailure::Transport(e) => LedgerError::Transaction(e),
            CallFailure::Status { status, body } => {
                LedgerError::Transaction(format!("status {}: {}", status, body))
            }
            CallFailure::Rpc(body) => LedgerError::Revert {
                reason: body.revert_reason(),
                message: body.message,
            },
            CallFailure::Decode(e) => LedgerError::Malformed(e),
        }
    }
}

/// Ledger client speaking JSON-RPC to a voting-registry gateway.
///
/// Reads are unauthenticated; vote submissions carry the verifier's signing
/// credential as a bearer token.
#[derive(Clone)]
pub struct LedgerGatewayClient {
    client: Client,
    rpc_url: Url,
    signing_key: String,
}

impl LedgerGatewayClient {
    pub fn new(base_url: Url, signing_key: String, timeout: Duration) -> Result<Self, VerifierNetError> {
        let client = Client::builder().timeout(timeout).build()?;
        let rpc_url = normalize_base(base_url)
            .join(RPC_PATH)
            .map_err(|e| VerifierNetError::InvalidUrl(e.to_string()))?;
        Ok(Self { client, rpc_url, signing_key })
    }

    async fn call<P, T>(&self, method: &str, params: P, authenticated: bool) -> Result<T, CallFailure>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        debug!(method, "Ledger gateway call");
        let mut req = self.client.post(self.rpc_url.clone()).json(&RpcRequest { method, params });
        if authenticated {
            req = req.bearer_auth(&self.signing_key);
        }

        let resp = req.send().await.map_err(|e| CallFailure::Transport(e.to_string()))?;
        let status = resp.status();

        // Gateways report contract errors in the envelope, sometimes with a
        // non-2xx status; try the envelope before giving up on the status.
        let text = resp.text().await.map_err(|e| CallFailure::Transport(e.to_string()))?;
        let envelope: Option<RpcResponse<T>> = serde_json::from_str(&text).ok();

        match envelope {
            Some(RpcResponse { error: Some(err), .. }) => Err(CallFailure::Rpc(err)),
            Some(RpcResponse { result: Some(result), .. }) if status.is_success() => Ok(result),
            _ if !status.is_success() => Err(CallFailure::Status { status: status.as_u16(), body: text }),
            _ => Err(CallFailure::Decode(format!("unexpected response to {}: {}", method, text))),
        }
    }
}

#[async_trait]
impl Ledger for LedgerGatewayClient {
    async fn query_proposal_events(&self, from_block: u64) -> Result<Vec<ProposedVersion>, LedgerError> {
        let events: Vec<WireProposalEvent> = self
            .call("queryProposalEvents", FromBlockParams { from_block }, false)
            .await
            .map_err(CallFailure::into_read_error)?;
        events.into_iter().map(ProposedVersion::try_from).collect()
    }

    async fn minor_neighbors(&self, patch_node_id: &NodeId) -> Result<MinorNeighbors, LedgerError> {
        let params = NodeParams { patch_node_id: patch_node_id.to_prefixed_hex() };
        let wire: WireNeighbors = self
            .call("getLineagePosition", params, false)
            .await
            .map_err(CallFailure::into_read_error)?;
        MinorNeighbors::try_from(wire)
    }

    async fn patched_minor_location(&self, patch_node_id: &NodeId) -> Result<Option<PackageLocation>, LedgerError> {
        let params = NodeParams { patch_node_id: patch_node_id.to_prefixed_hex() };
        let wire: WirePatchedMinor = self
            .call("getPatchedMinorLocation", params, false)
            .await
            .map_err(CallFailure::into_read_error)?;
        Ok(PackageLocation::from_optional(wire.package_location))
    }

    async fn submit_vote(&self, vote: &Vote) -> Result<(), LedgerError> {
        let receipt: WireVoteReceipt = self
            .call("submitVote", WireVote::from(vote), true)
            .await
            .map_err(CallFailure::into_transaction_error)?;
        info!(
            node = %vote.patch_node_id.short(),
            approved = vote.approved,
            tx = %receipt.tx_hash,
            "Vote submitted"
        );
        Ok(())
    }
}
