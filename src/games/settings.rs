//! Automated betting settings
//!
//! Wager amounts are always stored as non-positive values. Positive inputs,
//! whether from a builder call or a config file, are negated on the way in.

use crate::errors::VerificationError;
use crate::games::types::GuessRange;
use crate::money::{Micros, Satoshis};
use serde::{Deserialize, Deserializer, Serialize};

/// Settings an automated batch was placed with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetProgressionConfig {
    /// Stake every reset returns to
    #[serde(deserialize_with = "deserialize_wager")]
    pub base_pay_in: Satoshis,

    /// Largest allowed stake; zero means unlimited
    #[serde(default, deserialize_with = "deserialize_wager")]
    pub max_allowed_pay_in: Satoshis,

    /// Stake of the first bet; zero means `base_pay_in`
    #[serde(default, deserialize_with = "deserialize_wager")]
    pub starting_pay_in: Satoshis,

    #[serde(default)]
    pub increase_on_win_percent: Micros,
    #[serde(default)]
    pub increase_on_lose_percent: Micros,

    #[serde(default)]
    pub reset_on_win: bool,
    #[serde(default)]
    pub reset_on_lose: bool,
    #[serde(default)]
    pub reset_on_lose_max_bet: bool,

    // Enforced by the server, which shortens the batch instead.
    #[serde(default)]
    pub stop_on_lose_max_bet: bool,
    #[serde(default)]
    pub stop_max_balance: Satoshis,
    #[serde(default)]
    pub stop_min_balance: Satoshis,

    pub guess_range: GuessRange,

    #[serde(default = "default_max_bets")]
    pub max_bets: u32,

    #[serde(default)]
    pub client_seed: i32,
}

fn default_max_bets() -> u32 {
    1
}

/// A client seed for the next batch, drawn from the thread RNG
pub fn random_client_seed() -> i32 {
    rand::random()
}

fn deserialize_wager<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Satoshis, D::Error> {
    Satoshis::deserialize(deserializer).map(Satoshis::as_wager)
}

impl BetProgressionConfig {
    /// Settings with the given base stake and no progression
    pub fn new(base_pay_in: Satoshis, guess_range: GuessRange) -> Self {
        Self {
            base_pay_in: base_pay_in.as_wager(),
            max_allowed_pay_in: Satoshis::ZERO,
            starting_pay_in: Satoshis::ZERO,
            increase_on_win_percent: Micros::ZERO,
            increase_on_lose_percent: Micros::ZERO,
            reset_on_win: false,
            reset_on_lose: false,
            reset_on_lose_max_bet: false,
            stop_on_lose_max_bet: false,
            stop_max_balance: Satoshis::ZERO,
            stop_min_balance: Satoshis::ZERO,
            guess_range,
            max_bets: default_max_bets(),
            client_seed: 0,
        }
    }

    pub fn with_max_allowed_pay_in(mut self, amount: Satoshis) -> Self {
        self.max_allowed_pay_in = amount.as_wager();
        self
    }

    pub fn with_starting_pay_in(mut self, amount: Satoshis) -> Self {
        self.starting_pay_in = amount.as_wager();
        self
    }

    pub fn with_increase_on_win(mut self, percent: Micros) -> Self {
        self.increase_on_win_percent = percent;
        self
    }

    pub fn with_increase_on_lose(mut self, percent: Micros) -> Self {
        self.increase_on_lose_percent = percent;
        self
    }

    pub fn with_reset_on_win(mut self, reset: bool) -> Self {
        self.reset_on_win = reset;
        self
    }

    pub fn with_reset_on_lose(mut self, reset: bool) -> Self {
        self.reset_on_lose = reset;
        self
    }

    pub fn with_reset_on_lose_max_bet(mut self, reset: bool) -> Self {
        self.reset_on_lose_max_bet = reset;
        self
    }

    pub fn with_max_bets(mut self, max_bets: u32) -> Self {
        self.max_bets = max_bets;
        self
    }

    pub fn with_client_seed(mut self, client_seed: i32) -> Self {
        self.client_seed = client_seed;
        self
    }

    /// Draw a fresh random client seed
    pub fn with_random_client_seed(self) -> Self {
        self.with_client_seed(random_client_seed())
    }

    /// Stake of the first bet in a batch
    pub fn effective_starting_pay_in(&self) -> Satoshis {
        if self.starting_pay_in.is_zero() {
            self.base_pay_in
        } else {
            self.starting_pay_in
        }
    }

    pub fn has_max_pay_in(&self) -> bool {
        !self.max_allowed_pay_in.is_zero()
    }

    /// Reject settings the service would refuse
    pub fn validate(&self) -> Result<(), VerificationError> {
        if self.max_bets < 1 {
            return Err(VerificationError::InvalidSettings(
                "max_bets must be at least 1".to_string(),
            ));
        }
        if self.increase_on_win_percent.is_negative() || self.increase_on_lose_percent.is_negative() {
            return Err(VerificationError::InvalidSettings(
                "increase percents cannot be negative".to_string(),
            ));
        }
        if self.base_pay_in.as_sat() > 0
            || self.max_allowed_pay_in.as_sat() > 0
            || self.starting_pay_in.as_sat() > 0
        {
            return Err(VerificationError::InvalidSettings(
                "wager amounts must not be positive".to_string(),
            ));
        }
        if self.has_max_pay_in() && self.max_allowed_pay_in > self.base_pay_in {
            return Err(VerificationError::InvalidSettings(format!(
                "max_allowed_pay_in {} is smaller than base_pay_in {}",
                self.max_allowed_pay_in, self.base_pay_in
            )));
        }
        Ok(())
    }
}
