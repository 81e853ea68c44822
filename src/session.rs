//! Running account totals for one betting session
//!
//! Every change is announced on a broadcast channel after all fields have
//! been updated, so a subscriber never observes a half-applied batch.

use crate::{
    games::types::{GuessRange, ReconstructedBatch},
    money::Satoshis,
    wire::SingleBetResult,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default capacity of the session event channel
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

/// Change notifications published by [`SessionLedger`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    BatchSettled {
        bet_id: i64,
        bet_count: u64,
        win_count: u64,
        balance: Satoshis,
    },
    BetSettled {
        bet_id: i64,
        won: bool,
        balance: Satoshis,
    },
    ClientSeedChanged {
        client_seed: i32,
    },
}

/// Totals as of the last applied event
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub bet_count: u64,
    pub bet_win_count: u64,
    pub bet_pay_in: Satoshis,
    pub bet_pay_out: Satoshis,
    pub balance: Satoshis,
    pub client_seed: i32,
}

impl SessionSnapshot {
    pub fn profit(&self) -> Satoshis {
        self.bet_pay_in + self.bet_pay_out
    }
}

pub struct SessionLedger {
    state: SessionSnapshot,
    event_publisher: broadcast::Sender<SessionEvent>,
}

impl SessionLedger {
    pub fn new(balance: Satoshis, client_seed: i32) -> Self {
        Self::with_event_buffer(balance, client_seed, DEFAULT_EVENT_BUFFER)
    }

    pub fn with_event_buffer(balance: Satoshis, client_seed: i32, event_buffer: usize) -> Self {
        let (event_publisher, _) = broadcast::channel(event_buffer.max(1));
        Self {
            state: SessionSnapshot {
                balance,
                client_seed,
                ..SessionSnapshot::default()
            },
            event_publisher,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_publisher.subscribe()
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.state
    }

    pub fn balance(&self) -> Satoshis {
        self.state.balance
    }

    pub fn client_seed(&self) -> i32 {
        self.state.client_seed
    }

    /// Fold a replayed batch into the session totals
    pub fn apply_batch(&mut self, batch: &ReconstructedBatch) {
        let bet_count = batch.bet_count() as u64;
        let win_count = batch.win_count() as u64;

        self.state.bet_count += bet_count;
        self.state.bet_win_count += win_count;
        self.state.bet_pay_in += batch.total_pay_in;
        self.state.bet_pay_out += batch.total_pay_out;
        self.state.balance = batch.starting_balance + batch.total_pay_in + batch.total_pay_out;

        tracing::debug!(
            bet_id = batch.bet_id,
            bet_count,
            win_count,
            balance = %self.state.balance,
            "Batch settled"
        );

        self.publish(SessionEvent::BatchSettled {
            bet_id: batch.bet_id,
            bet_count,
            win_count,
            balance: self.state.balance,
        });
    }

    /// Fold one manually placed bet into the session totals
    pub fn record_single_bet(&mut self, pay_in: Satoshis, range: GuessRange, bet: &SingleBetResult) {
        let pay_in = pay_in.as_wager();
        let won = range.contains(bet.secret);

        self.state.bet_count += 1;
        if won {
            self.state.bet_win_count += 1;
        }
        self.state.bet_pay_in += pay_in;
        self.state.bet_pay_out += bet.pay_out;
        self.state.balance = bet.starting_balance + bet.pay_out + pay_in;

        self.publish(SessionEvent::BetSettled {
            bet_id: bet.bet_id,
            won,
            balance: self.state.balance,
        });
    }

    pub fn set_client_seed(&mut self, client_seed: i32) {
        self.state.client_seed = client_seed;
        self.publish(SessionEvent::ClientSeedChanged { client_seed });
    }

    fn publish(&self, event: SessionEvent) {
        // Err only means nobody is listening.
        let _ = self.event_publisher.send(event);
    }
}
