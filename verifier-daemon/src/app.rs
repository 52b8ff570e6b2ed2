//! Wires configuration into the engine's collaborators.

use crate::config::VerifierConfig;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use verifier_engine::{
    CompatibilityEvaluator, ErrorClassifier, SchemaFetcher, VerificationLoop, VersionGraphResolver,
    VersionVerifier,
};
use verifier_model::{Checkpoint, StorageConfig};
use verifier_net::{ContentGatewayClient, LedgerGatewayClient};
use verifier_schema::SdlComparator;
use verifier_storage::CheckpointStore;

pub fn open_checkpoints(config: &VerifierConfig) -> anyhow::Result<CheckpointStore> {
    CheckpointStore::open(&StorageConfig::File(config.data_dir.clone()))
        .with_context(|| format!("opening checkpoint store in {}", config.data_dir.display()))
}

pub fn build_loop(config: &VerifierConfig) -> anyhow::Result<VerificationLoop> {
    let ledger_url = config.ledger_endpoint()?;
    let content_url = config.content_store_endpoint()?;
    let signing_key = config.signing_key()?.to_string();

    let ledger = Arc::new(
        LedgerGatewayClient::new(ledger_url.clone(), signing_key, config.request_timeout())
            .context("building ledger client")?,
    );
    let content = Arc::new(
        ContentGatewayClient::new(content_url.clone(), config.request_timeout())
            .context("building content store client")?
            .with_max_document_bytes(config.max_schema_bytes),
    );

    let verifier = VersionVerifier::new(
        VersionGraphResolver::new(ledger.clone()),
        SchemaFetcher::new(content),
        CompatibilityEvaluator::new(Arc::new(SdlComparator::new())),
    );
    let classifier = ErrorClassifier::new(config.ignorable_reverts.iter().map(String::as_str));

    let checkpoints = open_checkpoints(config)?;
    let verification_loop = VerificationLoop::new(
        ledger,
        verifier,
        classifier,
        checkpoints,
        config.start_block,
        config.poll_interval(),
    )
    .context("loading checkpoint")?;

    info!(
        ledger = %ledger_url,
        content_store = %content_url,
        data_dir = %config.data_dir.display(),
        custom_ignorable_reverts = config.custom_ignorable_reverts(),
        next_block = verification_loop.checkpoint().next_block,
        "Verifier configured"
    );
    Ok(verification_loop)
}

pub fn describe(checkpoint: Option<Checkpoint>) -> String {
    match checkpoint {
        None => "no checkpoint stored".to_string(),
        Some(cp) => match cp.last_processed {
            Some(last) => format!("next block {} (last processed event {})", cp.next_block, last),
            None => format!("next block {}", cp.next_block),
        },
    }
}

/// Operator override of the starting block. Without `force` the store's
/// monotonicity check still applies.
pub fn set_checkpoint(store: &CheckpointStore, block: u64, force: bool) -> anyhow::Result<Checkpoint> {
    let checkpoint = Checkpoint::starting_at(block);
    if force {
        store.overwrite(&checkpoint)?;
    } else {
        store
            .save(&checkpoint)
            .context("refusing to move the checkpoint backwards (use --force)")?;
    }
    Ok(checkpoint)
}
