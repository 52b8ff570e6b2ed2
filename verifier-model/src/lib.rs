//! Verifier Model
//!
//! Pure data types and collaborator traits for the version verifier,
//! decoupled from the ledger transport, the content store and storage engines.

pub mod types;
pub mod proposal;
pub mod lineage;
pub mod outcome;
pub mod checkpoint;
pub mod schema;
pub mod ledger;
pub mod content;
pub mod storage_config;

// Re-exports
pub use types::{ModelError, NodeId, PackageLocation};
pub use proposal::{EventPosition, ProposedVersion, VersionNumber};
pub use lineage::{LineagePosition, MinorNeighbors};
pub use outcome::{VerificationOutcome, Vote};
pub use checkpoint::Checkpoint;
pub use schema::{SchemaComparator, SchemaDocument};
pub use ledger::{Ledger, LedgerError};
pub use content::{ContentError, ContentStore};
pub use storage_config::StorageConfig;
