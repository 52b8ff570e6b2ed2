//! Redb-backed checkpoint storage
pub mod checkpoint_db;

pub use checkpoint_db::{CheckpointError, CheckpointStore, CHECKPOINT_DB_FILE, TABLE_CHECKPOINT};
// Re-export for convenience; canonical home is verifier_model::StorageConfig
pub use verifier_model::StorageConfig;
