//! Proposal events observed on the ledger

use crate::types::{NodeId, PackageLocation};
use std::fmt;

/// Position of an event in ledger order.
///
/// Derived ordering is lexicographic over (block, transaction, log), which is
/// exactly ledger order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventPosition {
    pub block_number: u64,
    pub transaction_index: u32,
    pub log_index: u32,
}

impl EventPosition {
    pub fn new(block_number: u64, transaction_index: u32, log_index: u32) -> Self {
        Self { block_number, transaction_index, log_index }
    }
}

impl fmt::Display for EventPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.block_number, self.transaction_index, self.log_index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl VersionNumber {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A proposed package version, one per observed proposal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedVersion {
    pub package_id: NodeId,
    pub patch_node_id: NodeId,
    pub version: VersionNumber,
    pub package_location: PackageLocation,
    pub is_patch: bool,
    pub position: EventPosition,
}
