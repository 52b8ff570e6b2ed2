use std::sync::Arc;
use std::time::Duration;
use verifier_engine::{
    CompatibilityEvaluator, ErrorClassifier, SchemaFetcher, VerificationLoop, VersionGraphResolver,
    VersionVerifier,
};
use verifier_mockledger::{MemoryContentStore, MockLedger};
use verifier_model::StorageConfig;
use verifier_schema::SdlComparator;
use verifier_storage::CheckpointStore;

/// Mock collaborators wired into a real engine.
pub struct TestEnv {
    pub ledger: Arc<MockLedger>,
    pub content: Arc<MemoryContentStore>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(MockLedger::new()),
            content: Arc::new(MemoryContentStore::new()),
        }
    }

    pub fn verifier(&self) -> VersionVerifier {
        VersionVerifier::new(
            VersionGraphResolver::new(self.ledger.clone()),
            SchemaFetcher::new(self.content.clone()),
            CompatibilityEvaluator::new(Arc::new(SdlComparator::new())),
        )
    }

    pub fn verification_loop(&self, storage: &StorageConfig) -> VerificationLoop {
        self.verification_loop_from(storage, 0)
    }

    pub fn verification_loop_from(&self, storage: &StorageConfig, start_block: u64) -> VerificationLoop {
        let checkpoints = CheckpointStore::open(storage).unwrap();
        VerificationLoop::new(
            self.ledger.clone(),
            self.verifier(),
            ErrorClassifier::default(),
            checkpoints,
            start_block,
            Duration::from_millis(10),
        )
        .unwrap()
    }
}
