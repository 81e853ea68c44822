//! Batch replay
//!
//! The service answers an automated batch with totals only. Replaying the
//! stake progression bet by bet against the oracle recovers every wager and
//! payout, and the recomputed totals must match the declared ones exactly.

use crate::errors::VerificationError;
use crate::games::oracle::{BetResultSource, FairnessOracle};
use crate::games::payout::PayoutModel;
use crate::games::settings::BetProgressionConfig;
use crate::games::types::{BatchResult, BetOutcome, ReconstructedBatch};
use crate::money::{Micros, Satoshis};
use tracing::{debug, trace, warn};

/// Replays automated batches placed with one set of settings
#[derive(Debug, Clone)]
pub struct BetProgressionSimulator {
    config: BetProgressionConfig,
    payout: PayoutModel,
}

impl BetProgressionSimulator {
    /// Validates the settings up front so replay itself cannot fail
    pub fn new(config: BetProgressionConfig) -> Result<Self, VerificationError> {
        config.validate()?;
        Ok(Self {
            config,
            payout: PayoutModel::default(),
        })
    }

    pub fn with_payout_model(mut self, payout: PayoutModel) -> Self {
        self.payout = payout;
        self
    }

    pub fn config(&self) -> &BetProgressionConfig {
        &self.config
    }

    /// Replay `batch` against the real oracle and check its totals.
    ///
    /// The batch must have been placed with the configured client seed.
    pub fn verify(&self, batch: &BatchResult) -> Result<ReconstructedBatch, VerificationError> {
        if batch.client_seed != self.config.client_seed {
            return Err(VerificationError::ClientSeedMismatch {
                bet_id: batch.bet_id,
                configured: self.config.client_seed,
                batch: batch.client_seed,
            });
        }
        let oracle = FairnessOracle::from_hex(&batch.server_seed, self.config.client_seed)?;
        self.verify_with(batch, &oracle)
    }

    /// Replay `batch` with results from `source` and check its totals
    pub fn verify_with<S>(
        &self,
        batch: &BatchResult,
        source: &S,
    ) -> Result<ReconstructedBatch, VerificationError>
    where
        S: BetResultSource + ?Sized,
    {
        let replayed = self.replay(batch, source)?;
        check_ledger(batch, &replayed)?;
        Ok(replayed)
    }

    /// Replay without comparing against the declared totals.
    ///
    /// Fails only when the batch claims more bets than were requested.
    pub fn replay<S>(&self, batch: &BatchResult, source: &S) -> Result<ReconstructedBatch, VerificationError>
    where
        S: BetResultSource + ?Sized,
    {
        if batch.bet_count > self.config.max_bets {
            warn!(
                bet_id = batch.bet_id,
                bet_count = batch.bet_count,
                max_bets = self.config.max_bets,
                "Batch has more bets than requested"
            );
            return Err(VerificationError::TooManyBets {
                bet_id: batch.bet_id,
                bet_count: batch.bet_count,
                max_bets: self.config.max_bets,
            });
        }

        let range = self.config.guess_range;
        let mut pay_in = self.config.effective_starting_pay_in();
        let mut balance = batch.starting_balance;
        let mut outcomes = Vec::with_capacity(batch.bet_count as usize);

        debug!(
            bet_id = batch.bet_id,
            bet_count = batch.bet_count,
            starting_balance = %batch.starting_balance,
            "Replaying batch"
        );

        for index in 0..batch.bet_count {
            let secret = source.bet_result(index);
            let won = range.contains(secret);
            let stake = pay_in;
            balance += stake;

            let pay_out = if won {
                self.payout.win_payout(stake, range)
            } else {
                Satoshis::ZERO
            };
            balance += pay_out;

            pay_in = self.next_stake(stake, won);
            if pay_in < -balance {
                pay_in = -balance;
            }

            trace!(
                index,
                secret,
                won,
                pay_in = %stake,
                pay_out = %pay_out,
                balance = %balance,
                "Replayed bet"
            );

            outcomes.push(BetOutcome {
                index,
                bet_id: batch.bet_id_at(index),
                secret,
                pay_in: stake,
                pay_out,
                won,
                balance_after: balance,
            });
        }

        let total_pay_in: Satoshis = outcomes.iter().map(|o| o.pay_in).sum();
        let total_pay_out: Satoshis = outcomes.iter().map(|o| o.pay_out).sum();

        debug!(
            bet_id = batch.bet_id,
            total_pay_in = %total_pay_in,
            total_pay_out = %total_pay_out,
            final_balance = %balance,
            "Batch replay complete"
        );

        Ok(ReconstructedBatch {
            bet_id: batch.bet_id,
            starting_balance: batch.starting_balance,
            outcomes,
            total_pay_in,
            total_pay_out,
            final_balance: balance,
        })
    }

    /// Stake following a bet of `stake`, before the balance clamp
    fn next_stake(&self, stake: Satoshis, won: bool) -> Satoshis {
        let config = &self.config;
        let next = if won {
            if config.reset_on_win {
                config.base_pay_in
            } else {
                increase(stake, config.increase_on_win_percent)
            }
        } else if config.reset_on_lose
            || (config.reset_on_lose_max_bet && stake == config.max_allowed_pay_in)
        {
            config.base_pay_in
        } else {
            increase(stake, config.increase_on_lose_percent)
        };

        // Wagers are negative, so a larger stake compares lower.
        if config.has_max_pay_in() && next < config.max_allowed_pay_in {
            config.max_allowed_pay_in
        } else {
            next
        }
    }
}

fn increase(stake: Satoshis, percent: Micros) -> Satoshis {
    stake.mul_truncate(Micros::ONE + percent)
}

/// Compare recomputed totals with the ones the service declared
pub fn check_ledger(batch: &BatchResult, replayed: &ReconstructedBatch) -> Result<(), VerificationError> {
    if replayed.total_pay_in == batch.total_pay_in && replayed.total_pay_out == batch.total_pay_out {
        return Ok(());
    }
    warn!(
        bet_id = batch.bet_id,
        declared_pay_in = %batch.total_pay_in,
        replayed_pay_in = %replayed.total_pay_in,
        declared_pay_out = %batch.total_pay_out,
        replayed_pay_out = %replayed.total_pay_out,
        "Ledger mismatch"
    );
    Err(VerificationError::LedgerMismatch {
        bet_id: batch.bet_id,
        expected_pay_in: batch.total_pay_in,
        actual_pay_in: replayed.total_pay_in,
        expected_pay_out: batch.total_pay_out,
        actual_pay_out: replayed.total_pay_out,
    })
}
