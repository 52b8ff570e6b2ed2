use tempfile::tempdir;
use verifier_model::{Checkpoint, EventPosition, StorageConfig};
use verifier_storage::{CheckpointError, CheckpointStore};

#[test]
fn test_fresh_store_is_empty() {
    let store = CheckpointStore::open(&StorageConfig::InMemory).unwrap();
    assert_eq!(store.load().unwrap(), None);
    assert_eq!(store.load_or_start_at(42).unwrap(), Checkpoint::starting_at(42));
}

#[test]
fn test_checkpoint_survives_reopen() {
    let dir = tempdir().unwrap();
    let config = StorageConfig::File(dir.path().to_path_buf());

    let mut cp = Checkpoint::starting_at(100);
    cp.record(EventPosition::new(105, 3, 1));
    {
        let store = CheckpointStore::open(&config).unwrap();
        store.save(&cp).unwrap();
    }

    let store = CheckpointStore::open(&config).unwrap();
    assert_eq!(store.load().unwrap(), Some(cp));
    assert_eq!(store.load_or_start_at(0).unwrap(), cp);
}

#[test]
fn test_save_rejects_regression() {
    let store = CheckpointStore::open(&StorageConfig::InMemory).unwrap();
    store.save(&Checkpoint::starting_at(50)).unwrap();

    let err = store.save(&Checkpoint::starting_at(49)).unwrap_err();
    assert!(matches!(err, CheckpointError::Regression { .. }));
    assert_eq!(store.load().unwrap(), Some(Checkpoint::starting_at(50)));

    // Same value is a no-op, forward is fine
    store.save(&Checkpoint::starting_at(50)).unwrap();
    store.save(&Checkpoint::starting_at(51)).unwrap();
    assert_eq!(store.load().unwrap(), Some(Checkpoint::starting_at(51)));
}

#[test]
fn test_overwrite_allows_rewind() {
    let store = CheckpointStore::open(&StorageConfig::InMemory).unwrap();
    store.save(&Checkpoint::starting_at(50)).unwrap();
    store.overwrite(&Checkpoint::starting_at(10)).unwrap();
    assert_eq!(store.load().unwrap(), Some(Checkpoint::starting_at(10)));
}

#[test]
fn test_start_block_ahead_of_stored_cursor_wins() {
    let store = CheckpointStore::open(&StorageConfig::InMemory).unwrap();
    store.save(&Checkpoint::starting_at(10)).unwrap();
    assert_eq!(store.load_or_start_at(500).unwrap(), Checkpoint::starting_at(500));
    assert_eq!(store.load_or_start_at(5).unwrap(), Checkpoint::starting_at(10));
}
