pub mod types;
pub mod oracle;
pub mod payout;
pub mod settings;
pub mod progression;

pub use types::*;
pub use oracle::{generate_bet_result, BetResultSource, FairnessOracle, ServerSeed};
pub use payout::PayoutModel;
pub use settings::BetProgressionConfig;
pub use progression::BetProgressionSimulator;
