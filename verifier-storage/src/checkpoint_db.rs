use redb::{backends::InMemoryBackend, Database, ReadableTable, TableDefinition};
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use verifier_model::{Checkpoint, EventPosition, StorageConfig};

pub const TABLE_CHECKPOINT: TableDefinition<&str, &[u8]> = TableDefinition::new("checkpoint");
pub const CHECKPOINT_DB_FILE: &str = "checkpoint.db";

const KEY_CURSOR: &str = "cursor";
const RECORD_VERSION: u8 = 1;
// version + next_block + flag + (block, tx, log)
const RECORD_LEN: usize = 1 + 8 + 1 + 8 + 4 + 4;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),
    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),
    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),
    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt checkpoint record: {0}")]
    Corrupt(String),
    #[error("Checkpoint regression: stored {stored:?}, attempted {attempted:?}")]
    Regression { stored: Checkpoint, attempted: Checkpoint },
}

/// Holds the single durable cursor of the verification loop.
///
/// Writes are monotonic: `save` refuses a checkpoint that orders before the
/// stored one. Only `overwrite` (operator override) may move it backwards.
pub struct CheckpointStore {
    db: Database,
}

impl CheckpointStore {
    pub fn open(config: &StorageConfig) -> Result<Self, CheckpointError> {
        match config {
            StorageConfig::File(dir) => Self::open_dir(dir),
            StorageConfig::InMemory => {
                let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
                Ok(Self { db })
            }
        }
    }

    fn open_dir(dir: &Path) -> Result<Self, CheckpointError> {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
        let db = Database::builder().create(dir.join(CHECKPOINT_DB_FILE))?;
        Ok(Self { db })
    }

    /// The persisted checkpoint, if one was ever saved.
    pub fn load(&self) -> Result<Option<Checkpoint>, CheckpointError> {
        let txn = self.db.begin_read()?;
        let table = match txn.open_table(TABLE_CHECKPOINT) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match table.get(KEY_CURSOR)? {
            Some(v) => Ok(Some(decode(v.value())?)),
            None => Ok(None),
        }
    }

    /// Load the persisted checkpoint or start fresh at `start_block`.
    ///
    /// A configured start block ahead of the stored cursor wins, so operators
    /// can skip history without editing the database.
    pub fn load_or_start_at(&self, start_block: u64) -> Result<Checkpoint, CheckpointError> {
        let fresh = Checkpoint::starting_at(start_block);
        Ok(match self.load()? {
            Some(stored) if stored.next_block >= start_block => stored,
            _ => fresh,
        })
    }

    /// Persist `checkpoint`, refusing to move backwards.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TABLE_CHECKPOINT)?;
            let stored = match table.get(KEY_CURSOR)? {
                Some(v) => Some(decode(v.value())?),
                None => None,
            };
            if let Some(stored) = stored {
                if *checkpoint < stored {
                    return Err(CheckpointError::Regression { stored, attempted: *checkpoint });
                }
                if *checkpoint == stored {
                    return Ok(());
                }
            }
            table.insert(KEY_CURSOR, encode(checkpoint).as_slice())?;
        }
        txn.commit()?;
        debug!(next_block = checkpoint.next_block, "Checkpoint saved");
        Ok(())
    }

    /// Replace the stored checkpoint unconditionally.
    pub fn overwrite(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TABLE_CHECKPOINT)?;
            table.insert(KEY_CURSOR, encode(checkpoint).as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}

fn encode(checkpoint: &Checkpoint) -> Vec<u8> {
    let mut buf = Vec::with_capacity(RECORD_LEN);
    buf.push(RECORD_VERSION);
    buf.extend_from_slice(&checkpoint.next_block.to_le_bytes());
    match checkpoint.last_processed {
        Some(pos) => {
            buf.push(1);
            buf.extend_from_slice(&pos.block_number.to_le_bytes());
            buf.extend_from_slice(&pos.transaction_index.to_le_bytes());
            buf.extend_from_slice(&pos.log_index.to_le_bytes());
        }
        None => {
            buf.push(0);
            buf.extend_from_slice(&[0u8; 16]);
        }
    }
    buf
}

fn decode(bytes: &[u8]) -> Result<Checkpoint, CheckpointError> {
    if bytes.len() != RECORD_LEN {
        return Err(CheckpointError::Corrupt(format!(
            "expected {} bytes, got {}",
            RECORD_LEN,
            bytes.len()
        )));
    }
    if bytes[0] != RECORD_VERSION {
        return Err(CheckpointError::Corrupt(format!("unsupported version: {}", bytes[0])));
    }

    let u64_at = |at: usize| {
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&bytes[at..at + 8]);
        u64::from_le_bytes(arr)
    };
    let u32_at = |at: usize| {
        let mut arr = [0u8; 4];
        arr.copy_from_slice(&bytes[at..at + 4]);
        u32::from_le_bytes(arr)
    };

    let next_block = u64_at(1);
    let last_processed = match bytes[9] {
        0 => None,
        1 => Some(EventPosition::new(u64_at(10), u32_at(18), u32_at(22))),
        flag => return Err(CheckpointError::Corrupt(format!("invalid position flag: {}", flag))),
    };
    Ok(Checkpoint { next_block, last_processed })
}
