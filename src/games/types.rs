use crate::errors::VerificationError;
use crate::money::{Micros, Satoshis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// All bet results fall in `0..GUESS_SPAN`
pub const GUESS_SPAN: u32 = 1_000_000;

/// Inclusive range of results the bettor wins on.
///
/// Always satisfies `low <= high < GUESS_SPAN`; construction and
/// deserialisation both enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawGuessRange", into = "RawGuessRange")]
pub struct GuessRange {
    low: u32,
    high: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawGuessRange {
    low: i64,
    high: i64,
}

impl GuessRange {
    /// Validate and build a range
    pub fn new(low: i64, high: i64) -> Result<Self, VerificationError> {
        if low < 0 || low > high || high >= GUESS_SPAN as i64 {
            return Err(VerificationError::InvalidRange { low, high });
        }
        Ok(Self {
            low: low as u32,
            high: high as u32,
        })
    }

    /// Every possible result wins
    pub fn full() -> Self {
        Self {
            low: 0,
            high: GUESS_SPAN - 1,
        }
    }

    pub fn low(&self) -> u32 {
        self.low
    }

    pub fn high(&self) -> u32 {
        self.high
    }

    /// Number of winning results, in `1..=GUESS_SPAN`
    pub fn span(&self) -> u32 {
        self.high - self.low + 1
    }

    pub fn contains(&self, secret: u32) -> bool {
        secret >= self.low && secret <= self.high
    }

    /// `(high - low + 1) / 1_000_000`, exact in micros since the span
    /// denominator equals the micro scale
    pub fn chance_to_win(&self) -> Micros {
        Micros::from_micros(self.span() as i64)
    }
}

impl TryFrom<RawGuessRange> for GuessRange {
    type Error = VerificationError;

    fn try_from(raw: RawGuessRange) -> Result<Self, Self::Error> {
        GuessRange::new(raw.low, raw.high)
    }
}

impl From<GuessRange> for RawGuessRange {
    fn from(range: GuessRange) -> Self {
        RawGuessRange {
            low: range.low as i64,
            high: range.high as i64,
        }
    }
}

impl fmt::Display for GuessRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.low, self.high)
    }
}

/// Compact result of an automated bet batch, as returned by the service.
///
/// Only aggregate totals are transmitted; the individual bets are recovered
/// by replaying the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Identifier of the first bet; bet `i` has id `bet_id + i`
    pub bet_id: i64,
    pub bet_count: u32,
    /// Revealed server seed, 64 hex characters
    pub server_seed: String,
    /// Client seed the batch was placed with
    pub client_seed: i32,
    /// Sum of all wagers (non-positive)
    pub total_pay_in: Satoshis,
    /// Sum of all payouts (non-negative)
    pub total_pay_out: Satoshis,
    /// Balance immediately before the first bet
    pub starting_balance: Satoshis,
}

impl BatchResult {
    pub fn bet_id_at(&self, index: u32) -> i64 {
        self.bet_id.saturating_add(index as i64)
    }

    /// Balance after the whole batch according to the declared totals
    pub fn declared_final_balance(&self) -> Satoshis {
        self.starting_balance + self.total_pay_in + self.total_pay_out
    }
}

/// One bet recovered from a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetOutcome {
    pub index: u32,
    pub bet_id: i64,
    /// Result in `0..GUESS_SPAN`
    pub secret: u32,
    /// Wager, non-positive
    pub pay_in: Satoshis,
    /// Payout, zero for a loss
    pub pay_out: Satoshis,
    pub won: bool,
    /// Balance right after this bet settled
    pub balance_after: Satoshis,
}

impl BetOutcome {
    pub fn profit(&self) -> Satoshis {
        self.pay_in + self.pay_out
    }
}

/// Full per-bet ledger rebuilt from a [`BatchResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructedBatch {
    pub bet_id: i64,
    pub starting_balance: Satoshis,
    pub outcomes: Vec<BetOutcome>,
    pub total_pay_in: Satoshis,
    pub total_pay_out: Satoshis,
    pub final_balance: Satoshis,
}

impl ReconstructedBatch {
    pub fn bet_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn win_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.won).count()
    }

    pub fn secrets(&self) -> Vec<u32> {
        self.outcomes.iter().map(|o| o.secret).collect()
    }

    pub fn net_profit(&self) -> Satoshis {
        self.total_pay_in + self.total_pay_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_validation() {
        assert!(GuessRange::new(0, 999_999).is_ok());
        assert!(GuessRange::new(500, 500).is_ok());
        assert_eq!(
            GuessRange::new(-1, 10),
            Err(VerificationError::InvalidRange { low: -1, high: 10 })
        );
        assert!(GuessRange::new(10, 9).is_err());
        assert!(GuessRange::new(0, 1_000_000).is_err());
    }

    #[test]
    fn test_range_contains_bounds() {
        let range = GuessRange::new(100, 200).unwrap();
        assert!(range.contains(100));
        assert!(range.contains(200));
        assert!(!range.contains(99));
        assert!(!range.contains(201));
        assert_eq!(range.span(), 101);
    }

    #[test]
    fn test_range_deserialize_rejects_invalid() {
        let ok: GuessRange = serde_json::from_str(r#"{"low":0,"high":499999}"#).unwrap();
        assert_eq!(ok.chance_to_win(), Micros::from_micros(500_000));

        let bad = serde_json::from_str::<GuessRange>(r#"{"low":5,"high":1000000}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_batch_bet_ids_offset_by_index() {
        let batch = BatchResult {
            bet_id: 1_000,
            bet_count: 3,
            server_seed: String::new(),
            client_seed: 0,
            total_pay_in: Satoshis::from_sat(-4),
            total_pay_out: Satoshis::from_sat(3),
            starting_balance: Satoshis::from_coins(1),
        };
        assert_eq!(batch.bet_id_at(0), 1_000);
        assert_eq!(batch.bet_id_at(2), 1_002);
        assert_eq!(batch.declared_final_balance(), Satoshis::from_sat(99_999_999));
    }
}
