//! The durable processing cursor

use crate::proposal::EventPosition;

/// The last fully processed point in the ledger.
///
/// `next_block` is the height the next poll queries from. `last_processed`
/// lets a restart resume inside a block that was only partially handled:
/// events at or before it are already terminal and must not be voted on again.
///
/// Both fields only ever move forward; the derived ordering is the
/// monotonicity order the store enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint {
    pub next_block: u64,
    pub last_processed: Option<EventPosition>,
}

impl Checkpoint {
    pub fn starting_at(block: u64) -> Self {
        Self { next_block: block, last_processed: None }
    }

    /// Whether the event at `position` already reached a terminal outcome.
    pub fn covers(&self, position: &EventPosition) -> bool {
        position.block_number < self.next_block
            || self.last_processed.is_some_and(|last| *position <= last)
    }

    /// Record a terminal outcome for the event at `position`.
    ///
    /// The query cursor stays on the event's block so that later events in
    /// the same block are still returned after a restart.
    pub fn record(&mut self, position: EventPosition) {
        if self.last_processed.map_or(true, |last| position > last) {
            self.last_processed = Some(position);
        }
        self.next_block = self.next_block.max(position.block_number);
    }

    /// Mark every block up to and including `block` as done.
    pub fn complete_through(&mut self, block: u64) {
        self.next_block = self.next_block.max(block.saturating_add(1));
    }
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::starting_at(0)
    }
}
