//! Position of a proposal in its package's version lineage

use crate::types::{NodeId, PackageLocation};

/// Neighboring minor versions of a minor proposal.
///
/// Each field is independently optional: a neighbor may be known by id
/// before its package location is recorded, and vice versa.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinorNeighbors {
    pub prev_node_id: Option<NodeId>,
    pub prev_location: Option<PackageLocation>,
    pub next_node_id: Option<NodeId>,
    pub next_location: Option<PackageLocation>,
}

/// Where a proposal sits in the lineage. Derived on demand, never cached:
/// the lineage may change between polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineagePosition {
    Minor(MinorNeighbors),
    Patch {
        /// Location of the minor version being patched, if recorded.
        minor_location: Option<PackageLocation>,
    },
}
