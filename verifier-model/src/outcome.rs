//! Verification results and the votes built from them

use crate::types::NodeId;

/// Decision for one proposal. Consumed immediately to build a [`Vote`].
///
/// The neighbor ids are carried regardless of approval so that lineage
/// pointers can be updated once the vote lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub approved: bool,
    pub prev_minor_node_id: Option<NodeId>,
    pub next_minor_node_id: Option<NodeId>,
}

impl VerificationOutcome {
    pub fn patch(approved: bool) -> Self {
        Self { approved, prev_minor_node_id: None, next_minor_node_id: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vote {
    pub patch_node_id: NodeId,
    pub prev_minor_node_id: Option<NodeId>,
    pub next_minor_node_id: Option<NodeId>,
    pub approved: bool,
}

impl Vote {
    pub fn new(patch_node_id: NodeId, outcome: &VerificationOutcome) -> Self {
        Self {
            patch_node_id,
            prev_minor_node_id: outcome.prev_minor_node_id,
            next_minor_node_id: outcome.next_minor_node_id,
            approved: outcome.approved,
        }
    }
}
