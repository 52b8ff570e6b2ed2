use std::path::PathBuf;

/// Configuration for where to keep durable verifier state.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// File-backed storage in the given directory.
    File(PathBuf),
    /// In-memory storage (no filesystem). Useful for tests.
    InMemory,
}
