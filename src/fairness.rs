//! Fairness checks for revealed seeds and replayed batches
//!
//! - A revealed server seed is only trusted once its SHA-256 matches the hash
//!   published before play.
//! - Historical batches are independent of each other, so many can be
//!   replayed at once on the blocking pool.

use crate::{
    errors::VerificationError,
    games::{
        oracle::ServerSeed,
        progression::BetProgressionSimulator,
        settings::BetProgressionConfig,
        types::{BatchResult, ReconstructedBatch},
    },
};
use std::sync::Arc;
use tokio::sync::{broadcast, Semaphore};

/// Check a revealed seed against its published commitment.
///
/// The commitment is compared case-insensitively as hex.
pub fn verify_commitment(server_seed: &ServerSeed, committed_hash_hex: &str) -> Result<(), VerificationError> {
    let computed = server_seed.commitment_hex();
    if computed.eq_ignore_ascii_case(committed_hash_hex.trim()) {
        return Ok(());
    }
    tracing::warn!(committed = committed_hash_hex, computed = %computed, "Server seed commitment mismatch");
    Err(VerificationError::CommitmentMismatch {
        committed: committed_hash_hex.to_string(),
        computed,
    })
}

/// One batch to verify, with the settings it was placed under
#[derive(Clone, Debug)]
pub struct VerificationJob {
    pub config: BetProgressionConfig,
    pub batch: BatchResult,
    /// Seed hash published before the batch, if known
    pub committed_hash: Option<String>,
}

impl VerificationJob {
    pub fn new(config: BetProgressionConfig, batch: BatchResult) -> Self {
        Self {
            config,
            batch,
            committed_hash: None,
        }
    }

    pub fn with_committed_hash(mut self, hash: impl Into<String>) -> Self {
        self.committed_hash = Some(hash.into());
        self
    }
}

/// Emitted once per finished job
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchVerifiedEvent {
    pub bet_id: i64,
    pub bet_count: u32,
    pub verified: bool,
}

/// Synchronous verification of one job.
///
/// Order: seed decoding and commitment, settings, replay, ledger.
pub fn verify_one(job: &VerificationJob) -> Result<ReconstructedBatch, VerificationError> {
    if let Some(committed) = &job.committed_hash {
        let seed: ServerSeed = job.batch.server_seed.parse()?;
        verify_commitment(&seed, committed)?;
    }
    BetProgressionSimulator::new(job.config.clone())?.verify(&job.batch)
}

/// Replays many batches concurrently.
///
/// At most `max_concurrency` replays run at a time; each outcome is also
/// published to subscribers.
#[derive(Clone)]
pub struct BatchVerifier {
    max_concurrency: usize,
    event_publisher: broadcast::Sender<BatchVerifiedEvent>,
}

impl BatchVerifier {
    pub fn new(max_concurrency: usize, event_buffer: usize) -> Self {
        let (event_publisher, _) = broadcast::channel(event_buffer.max(1));
        Self {
            max_concurrency: max_concurrency.max(1),
            event_publisher,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BatchVerifiedEvent> {
        self.event_publisher.subscribe()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Verify every job; results are returned in input order.
    pub async fn verify_all(
        &self,
        jobs: Vec<VerificationJob>,
    ) -> Vec<Result<ReconstructedBatch, VerificationError>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(jobs.len());

        tracing::debug!(jobs = jobs.len(), max_concurrency = self.max_concurrency, "Verifying batches");

        for job in jobs {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    handles.push(Err(VerificationError::TaskFailed(e.to_string())));
                    continue;
                }
            };
            let publisher = self.event_publisher.clone();

            handles.push(Ok(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let result = verify_one(&job);

                if let Err(e) = &result {
                    tracing::warn!(bet_id = job.batch.bet_id, "Batch failed verification: {}", e);
                }
                // No subscribers is fine.
                let _ = publisher.send(BatchVerifiedEvent {
                    bet_id: job.batch.bet_id,
                    bet_count: job.batch.bet_count,
                    verified: result.is_ok(),
                });
                result
            })));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = match handle {
                Ok(h) => match h.await {
                    Ok(result) => result,
                    Err(e) => Err(VerificationError::TaskFailed(e.to_string())),
                },
                Err(e) => Err(e),
            };
            results.push(result);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::GuessRange;
    use crate::money::Satoshis;

    const SEED: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn job(bet_id: i64, bet_count: u32) -> VerificationJob {
        let config = BetProgressionConfig::new(Satoshis::from_sat(-100), GuessRange::new(0, 494_999).unwrap())
            .with_client_seed(77)
            .with_max_bets(20);
        let batch = BatchResult {
            bet_id,
            bet_count,
            server_seed: SEED.to_string(),
            client_seed: 77,
            total_pay_in: Satoshis::ZERO,
            total_pay_out: Satoshis::ZERO,
            starting_balance: Satoshis::from_coins(1),
        };
        // fill in the declared totals from an honest replay
        let replayed = BetProgressionSimulator::new(config.clone())
            .unwrap()
            .replay(&batch, &crate::games::FairnessOracle::from_hex(SEED, 77).unwrap())
            .unwrap();
        VerificationJob::new(
            config,
            BatchResult {
                total_pay_in: replayed.total_pay_in,
                total_pay_out: replayed.total_pay_out,
                ..batch
            },
        )
    }

    #[test]
    fn test_commitment() {
        let seed: ServerSeed = SEED.parse().unwrap();
        let hash = seed.commitment_hex();

        assert!(verify_commitment(&seed, &hash).is_ok());
        assert!(verify_commitment(&seed, &hash.to_uppercase()).is_ok());
        assert!(matches!(
            verify_commitment(&seed, &"0".repeat(64)),
            Err(VerificationError::CommitmentMismatch { .. })
        ));
    }

    #[test]
    fn test_verify_one_checks_commitment_first() {
        let honest = job(1, 10);
        assert!(verify_one(&honest).is_ok());

        let bad = honest.with_committed_hash("ff".repeat(32));
        assert!(matches!(verify_one(&bad), Err(VerificationError::CommitmentMismatch { .. })));
    }

    #[tokio::test]
    async fn test_verify_all_keeps_order_and_publishes() {
        let verifier = BatchVerifier::new(2, 16);
        let mut events = verifier.subscribe();

        let mut tampered = job(3, 20);
        tampered.batch.total_pay_out = tampered.batch.total_pay_out + Satoshis::from_sat(1);
        let jobs = vec![job(1, 20), job(2, 5), tampered];

        let results = verifier.verify_all(jobs).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().bet_id, 1);
        assert_eq!(results[1].as_ref().unwrap().bet_count(), 5);
        assert!(matches!(results[2], Err(VerificationError::LedgerMismatch { bet_id: 3, .. })));

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(events.recv().await.unwrap());
        }
        seen.sort_by_key(|e| e.bet_id);
        assert_eq!(seen.iter().map(|e| e.verified).collect::<Vec<_>>(), vec![true, true, false]);
    }
}
