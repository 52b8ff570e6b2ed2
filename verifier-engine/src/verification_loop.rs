//! VerificationLoop - polls the ledger and drives proposals to a vote
//!
//! Proposals are handled strictly one at a time in ledger order: a vote on
//! one lineage slot can change the neighbors another proposal sees.

use crate::classifier::{Classification, ErrorClassifier};
use crate::error::{FatalError, VerifyError};
use crate::verifier::VersionVerifier;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use verifier_model::{Checkpoint, Ledger, ProposedVersion, VerificationOutcome, Vote};
use verifier_storage::{CheckpointError, CheckpointStore};

/// Per-iteration counters, for logging only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationReport {
    /// Events returned by the ledger query.
    pub events_seen: usize,
    /// Events that reached a terminal outcome this iteration.
    pub processed: usize,
    pub approved: usize,
    pub rejected: usize,
    pub ignored: usize,
    /// Events skipped because the checkpoint already covers them.
    pub already_processed: usize,
}

pub struct VerificationLoop {
    ledger: Arc<dyn Ledger>,
    verifier: VersionVerifier,
    classifier: ErrorClassifier,
    checkpoints: CheckpointStore,
    checkpoint: Checkpoint,
    poll_interval: Duration,
}

impl VerificationLoop {
    /// Loads the checkpoint once; from here on the loop is its only owner.
    pub fn new(
        ledger: Arc<dyn Ledger>,
        verifier: VersionVerifier,
        classifier: ErrorClassifier,
        checkpoints: CheckpointStore,
        start_block: u64,
        poll_interval: Duration,
    ) -> Result<Self, CheckpointError> {
        let checkpoint = checkpoints.load_or_start_at(start_block)?;
        Ok(Self { ledger, verifier, classifier, checkpoints, checkpoint, poll_interval })
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    /// Run until `shutdown` is cancelled (`Ok`) or a failure is classified
    /// fatal (`Err`). Cancellation is honored between iterations only.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<(), FatalError> {
        info!(next_block = self.checkpoint.next_block, "Listening for proposed version events");

        while !shutdown.is_cancelled() {
            let report = self.run_once().await?;
            info!(
                approved = report.approved,
                rejected = report.rejected,
                ignored = report.ignored,
                "{} proposed version events processed",
                report.processed
            );

            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!(next_block = self.checkpoint.next_block, "Verification loop stopped");
        Ok(())
    }

    /// One poll: query, process every new proposal, advance the checkpoint.
    pub async fn run_once(&mut self) -> Result<IterationReport, FatalError> {
        let from_block = self.checkpoint.next_block;
        let mut events = match self.ledger.query_proposal_events(from_block).await {
            Ok(events) => events,
            Err(e) => {
                let err = VerifyError::from(e);
                error!(from_block, error = %err, "Critical error querying proposal events");
                return Err(FatalError::Query(err));
            }
        };
        events.sort_by_key(|e| e.position);

        let mut report = IterationReport { events_seen: events.len(), ..Default::default() };
        if events.is_empty() {
            return Ok(report);
        }
        info!(count = events.len(), from_block, "Found proposed version events");

        for event in &events {
            if self.checkpoint.covers(&event.position) {
                debug!(position = %event.position, "Already processed, skipping");
                report.already_processed += 1;
                continue;
            }

            let span = info_span!(
                "proposal",
                node = %event.patch_node_id.short(),
                version = %event.version,
                position = %event.position,
            );

            match self.process(event).instrument(span.clone()).await {
                Ok(outcome) if outcome.approved => report.approved += 1,
                Ok(_) => report.rejected += 1,
                Err(err) => match self.classifier.classify(&err) {
                    Classification::Ignorable => {
                        span.in_scope(|| warn!(error = %err, "Ignorable error, skipping proposal"));
                        report.ignored += 1;
                    }
                    Classification::Fatal => {
                        span.in_scope(|| error!(error = %err, "Critical error"));
                        return Err(FatalError::Proposal {
                            node: event.patch_node_id,
                            position: event.position,
                            source: err,
                        });
                    }
                },
            }

            self.checkpoint.record(event.position);
            self.checkpoints.save(&self.checkpoint)?;
            report.processed += 1;
        }

        // Sorted, so the last event carries the highest block
        if let Some(last) = events.last() {
            self.checkpoint.complete_through(last.position.block_number);
            self.checkpoints.save(&self.checkpoint)?;
        }

        Ok(report)
    }

    async fn process(&self, event: &ProposedVersion) -> Result<VerificationOutcome, VerifyError> {
        let outcome = self.verifier.verify(event).await?;
        let vote = Vote::new(event.patch_node_id, &outcome);
        self.ledger.submit_vote(&vote).await?;
        info!(approved = outcome.approved, "Vote cast");
        Ok(outcome)
    }
}
