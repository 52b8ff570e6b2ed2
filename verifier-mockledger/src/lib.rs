//! Mock ledger for testing the verifier without a chain or a gateway.
//!
//! Provides [`MockLedger`] and [`MemoryContentStore`] - scriptable in-memory
//! collaborators that record every vote and can be told to fail specific calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use verifier_model::{
    ContentError, ContentStore, EventPosition, Ledger, LedgerError, MinorNeighbors, NodeId,
    PackageLocation, ProposedVersion, VersionNumber, Vote,
};

#[derive(Default)]
struct LedgerState {
    events: Vec<ProposedVersion>,
    neighbors: HashMap<NodeId, MinorNeighbors>,
    patched_minors: HashMap<NodeId, PackageLocation>,
    vote_failures: HashMap<NodeId, LedgerError>,
    neighbor_failures: HashMap<NodeId, LedgerError>,
    query_failure: Option<LedgerError>,
    votes: Vec<Vote>,
    queried_from: Vec<u64>,
}

/// In-memory voting registry.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a proposal event.
    pub fn push_event(&self, event: ProposedVersion) {
        self.state().events.push(event);
    }

    pub fn set_neighbors(&self, patch_node_id: NodeId, neighbors: MinorNeighbors) {
        self.state().neighbors.insert(patch_node_id, neighbors);
    }

    pub fn set_patched_minor(&self, patch_node_id: NodeId, location: PackageLocation) {
        self.state().patched_minors.insert(patch_node_id, location);
    }

    /// Make `submit_vote` for this node fail with `error`.
    pub fn fail_vote(&self, patch_node_id: NodeId, error: LedgerError) {
        self.state().vote_failures.insert(patch_node_id, error);
    }

    /// Make the lineage lookup for this node fail with `error`.
    pub fn fail_neighbors(&self, patch_node_id: NodeId, error: LedgerError) {
        self.state().neighbor_failures.insert(patch_node_id, error);
    }

    /// Make every event query fail until cleared.
    pub fn fail_queries(&self, error: Option<LedgerError>) {
        self.state().query_failure = error;
    }

    /// Votes accepted so far, in submission order.
    pub fn votes(&self) -> Vec<Vote> {
        self.state().votes.clone()
    }

    /// `from_block` of every event query so far.
    pub fn queried_from(&self) -> Vec<u64> {
        self.state().queried_from.clone()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn query_proposal_events(&self, from_block: u64) -> Result<Vec<ProposedVersion>, LedgerError> {
        let mut state = self.state();
        state.queried_from.push(from_block);
        if let Some(err) = &state.query_failure {
            return Err(err.clone());
        }
        let mut events: Vec<ProposedVersion> = state
            .events
            .iter()
            .filter(|e| e.position.block_number >= from_block)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.position);
        Ok(events)
    }

    async fn minor_neighbors(&self, patch_node_id: &NodeId) -> Result<MinorNeighbors, LedgerError> {
        let state = self.state();
        if let Some(err) = state.neighbor_failures.get(patch_node_id) {
            return Err(err.clone());
        }
        Ok(state.neighbors.get(patch_node_id).cloned().unwrap_or_default())
    }

    async fn patched_minor_location(&self, patch_node_id: &NodeId) -> Result<Option<PackageLocation>, LedgerError> {
        Ok(self.state().patched_minors.get(patch_node_id).cloned())
    }

    async fn submit_vote(&self, vote: &Vote) -> Result<(), LedgerError> {
        let mut state = self.state();
        if let Some(err) = state.vote_failures.get(&vote.patch_node_id) {
            return Err(err.clone());
        }
        state.votes.push(*vote);
        Ok(())
    }
}

#[derive(Default)]
struct ContentState {
    documents: HashMap<String, Vec<u8>>,
    failures: HashMap<String, ContentError>,
    fetches: Vec<String>,
}

/// In-memory content-addressed store.
#[derive(Default)]
pub struct MemoryContentStore {
    state: Mutex<ContentState>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ContentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put(&self, location: &str, content: impl Into<Vec<u8>>) {
        self.state().documents.insert(location.to_string(), content.into());
    }

    /// Make fetches of `location` fail with `error`.
    pub fn fail(&self, location: &str, error: ContentError) {
        self.state().failures.insert(location.to_string(), error);
    }

    /// Locations fetched so far, in order.
    pub fn fetches(&self) -> Vec<String> {
        self.state().fetches.clone()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn fetch(&self, location: &PackageLocation) -> Result<Option<Vec<u8>>, ContentError> {
        let mut state = self.state();
        state.fetches.push(location.as_str().to_string());
        if let Some(err) = state.failures.get(location.as_str()) {
            return Err(err.clone());
        }
        Ok(state.documents.get(location.as_str()).cloned())
    }
}

// ==================== Fixture helpers ====================

/// Deterministic node id whose bytes are all `n`.
pub fn node(n: u8) -> NodeId {
    NodeId([n; 32])
}

pub fn location(s: &str) -> PackageLocation {
    PackageLocation::new(s).unwrap_or_else(|_| panic!("fixture location must be non-empty"))
}

/// A minor-version proposal for node `n` at the given ledger position.
pub fn minor_proposal(n: u8, package_location: &str, position: EventPosition) -> ProposedVersion {
    ProposedVersion {
        package_id: node(0xaa),
        patch_node_id: node(n),
        version: VersionNumber::new(1, n as u32, 0),
        package_location: location(package_location),
        is_patch: false,
        position,
    }
}

/// A patch proposal for node `n` at the given ledger position.
pub fn patch_proposal(n: u8, package_location: &str, position: EventPosition) -> ProposedVersion {
    ProposedVersion {
        version: VersionNumber::new(1, 0, n as u32),
        is_patch: true,
        ..minor_proposal(n, package_location, position)
    }
}
