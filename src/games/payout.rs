//! Odds and payouts for a guess range

use crate::games::types::GuessRange;
use crate::money::{Micros, Satoshis, MICROS_PER_UNIT};
use serde::{Deserialize, Serialize};

/// Fraction of a fair payout returned to the bettor
pub const DEFAULT_HOUSE_PAYOUT: Micros = Micros::from_micros(999_000);

/// Payout calculator for a fixed house payout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutModel {
    house_payout: Micros,
}

impl Default for PayoutModel {
    fn default() -> Self {
        Self {
            house_payout: DEFAULT_HOUSE_PAYOUT,
        }
    }
}

impl PayoutModel {
    pub fn new(house_payout: Micros) -> Self {
        Self { house_payout }
    }

    pub fn house_payout(&self) -> Micros {
        self.house_payout
    }

    pub fn chance_to_win(&self, range: GuessRange) -> Micros {
        range.chance_to_win()
    }

    /// `floor(house_payout / chance * 1e6) / 1e6`.
    ///
    /// Both operands are exact in micros, so the quotient is computed in
    /// integers and floored once; the bettor never gains from rounding.
    pub fn payout_multiplier(&self, range: GuessRange) -> Micros {
        let numerator = self.house_payout.as_micros() as i128 * MICROS_PER_UNIT as i128;
        let multiplier = numerator.div_euclid(range.span() as i128);
        Micros::from_micros(i64::try_from(multiplier).unwrap_or(i64::MAX))
    }

    /// Gross payout of a winning bet, sign of `pay_in` ignored
    pub fn win_payout(&self, pay_in: Satoshis, range: GuessRange) -> Satoshis {
        pay_in.abs().mul_truncate(self.payout_multiplier(range))
    }

    /// Net gain of a winning bet
    pub fn win_profit(&self, pay_in: Satoshis, range: GuessRange) -> Satoshis {
        self.win_payout(pay_in, range) - pay_in.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half() -> GuessRange {
        GuessRange::new(0, 499_999).unwrap()
    }

    #[test]
    fn test_even_odds() {
        let model = PayoutModel::default();
        assert_eq!(model.chance_to_win(half()), Micros::from_micros(500_000));
        assert_eq!(model.payout_multiplier(half()).to_string(), "1.998000");
    }

    #[test]
    fn test_win_payout_ignores_stake_sign() {
        let model = PayoutModel::default();
        let stake = Satoshis::from_coins(-1);
        assert_eq!(model.win_payout(stake, half()), Satoshis::from_sat(199_800_000));
        assert_eq!(model.win_payout(stake.abs(), half()), Satoshis::from_sat(199_800_000));
        assert_eq!(model.win_profit(stake, half()), Satoshis::from_sat(99_800_000));
    }

    #[test]
    fn test_multiplier_truncates_down() {
        let model = PayoutModel::default();
        // 0.999 / 0.99 = 1.0090909..., floored to six decimals
        let range = GuessRange::new(0, 989_999).unwrap();
        assert_eq!(model.payout_multiplier(range), Micros::from_micros(1_009_090));

        // 0.999 / 0.3 = 3.33; 0.999 / 0.7 = 1.427142857...
        let thirty = GuessRange::new(0, 299_999).unwrap();
        let seventy = GuessRange::new(300_000, 999_999).unwrap();
        assert_eq!(model.payout_multiplier(thirty), Micros::from_micros(3_330_000));
        assert_eq!(model.payout_multiplier(seventy), Micros::from_micros(1_427_142));
    }

    #[test]
    fn test_tiny_stakes_truncate_to_zero_profit() {
        let model = PayoutModel::default();
        let full = GuessRange::full();
        assert_eq!(model.payout_multiplier(full), DEFAULT_HOUSE_PAYOUT);
        assert_eq!(model.win_payout(Satoshis::from_sat(-1), full), Satoshis::ZERO);
        assert_eq!(model.win_profit(Satoshis::from_sat(-1), full), Satoshis::from_sat(-1));

        let single = GuessRange::new(42, 42).unwrap();
        assert_eq!(model.payout_multiplier(single), Micros::from_micros(999_000_000_000));
        assert_eq!(model.win_payout(Satoshis::from_sat(-1), single), Satoshis::from_sat(999_000));
    }
}
