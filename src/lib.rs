//! Fairdice - provably fair dice verification
//!
//! Recomputes bet results from revealed server seeds and rebuilds the
//! per-bet ledger of automated batches from the totals the service returns.

pub mod config;
pub mod errors;
pub mod fairness;
pub mod games;
pub mod logging;
pub mod money;
pub mod session;
pub mod wire;

pub use config::{ConfigLoader, FairDiceConfig, LogLevel};
pub use errors::{ConfigurationError, FairDiceError, FairDiceResult, VerificationError, WireError};
pub use fairness::{verify_commitment, verify_one, BatchVerifiedEvent, BatchVerifier, VerificationJob};
pub use games::{
    generate_bet_result, BatchResult, BetOutcome, BetProgressionConfig, BetProgressionSimulator,
    BetResultSource, FairnessOracle, GuessRange, PayoutModel, ReconstructedBatch, ServerSeed,
};
pub use money::{truncate_satoshis, Micros, Satoshis, ScaledAmount};
pub use session::{SessionEvent, SessionLedger, SessionSnapshot};
pub use wire::{parse_automated_bets_response, parse_place_bet_response, BetRejection, SingleBetResult};
