//! Fixed-point money arithmetic
//!
//! Every monetary value is an exact count of satoshis (1e-8 of a coin).
//! Fractions that scale money (win/lose increases, payout multipliers) are
//! six-decimal fixed-point values. Products of the two are carried exactly in
//! a [`ScaledAmount`] until they are truncated back to whole satoshis.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Number of satoshis in one coin
pub const SATOSHIS_PER_COIN: i64 = 100_000_000;
/// Fractional digits kept by [`Satoshis`]
pub const SATOSHI_DECIMALS: u32 = 8;
/// Scaling factor for six-decimal fractions
pub const MICROS_PER_UNIT: i64 = 1_000_000;
/// Fractional digits kept by [`Micros`]
pub const MICRO_DECIMALS: u32 = 6;

/// Parse failure for decimal amount strings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountParseError {
    #[error("empty amount")]
    Empty,

    #[error("invalid decimal amount '{0}'")]
    Invalid(String),

    #[error("amount '{value}' has more than {max_decimals} fractional digits")]
    TooPrecise { value: String, max_decimals: u32 },

    #[error("amount '{0}' is out of range")]
    OutOfRange(String),
}

/// An exact amount in satoshis.
///
/// Wagers are stored as negative amounts (money leaving the balance), payouts
/// and balances as non-negative ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Satoshis(i64);

impl Satoshis {
    pub const ZERO: Satoshis = Satoshis(0);

    /// Create from a raw satoshi count
    pub const fn from_sat(sat: i64) -> Self {
        Satoshis(sat)
    }

    /// Create from a whole number of coins, saturating on overflow
    pub const fn from_coins(coins: i64) -> Self {
        Satoshis(coins.saturating_mul(SATOSHIS_PER_COIN))
    }

    /// Raw satoshi count
    pub const fn as_sat(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Self {
        Satoshis(self.0.saturating_abs())
    }

    /// Force the amount to be a wager (non-positive)
    pub const fn as_wager(self) -> Self {
        if self.0 > 0 {
            Satoshis(-self.0)
        } else {
            self
        }
    }

    /// Exact product with a six-decimal factor, not yet truncated
    pub fn scale(self, factor: Micros) -> ScaledAmount {
        ScaledAmount::new(
            self.0 as i128 * factor.0 as i128,
            SATOSHI_DECIMALS + MICRO_DECIMALS,
        )
    }

    /// `truncate_satoshis(self * factor)`
    pub fn mul_truncate(self, factor: Micros) -> Self {
        self.scale(factor).truncate_satoshis()
    }
}

impl Sum for Satoshis {
    fn sum<I: Iterator<Item = Satoshis>>(iter: I) -> Self {
        iter.fold(Satoshis::ZERO, |acc, x| acc + x)
    }
}

impl Add for Satoshis {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Satoshis(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Satoshis {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Satoshis {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Satoshis(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Satoshis {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Satoshis {
    type Output = Self;
    fn neg(self) -> Self {
        Satoshis(self.0.saturating_neg())
    }
}

impl fmt::Display for Satoshis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let per_coin = SATOSHIS_PER_COIN as u64;
        write!(
            f,
            "{}{}.{:08}",
            sign,
            magnitude / per_coin,
            magnitude % per_coin
        )
    }
}

/// Parses a decimal coin amount such as `"-0.00000016"`.
///
/// More than eight fractional digits is an error; use [`truncate_satoshis`]
/// on a [`ScaledAmount`] when truncation is intended.
impl FromStr for Satoshis {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount: ScaledAmount = s.parse()?;
        if amount.decimals > SATOSHI_DECIMALS {
            return Err(AmountParseError::TooPrecise {
                value: s.to_string(),
                max_decimals: SATOSHI_DECIMALS,
            });
        }
        amount
            .truncate_satoshis_checked()
            .ok_or_else(|| AmountParseError::OutOfRange(s.to_string()))
    }
}

impl Serialize for Satoshis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

/// Accepts either an integer satoshi count or a decimal coin string.
impl<'de> Deserialize<'de> for Satoshis {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Sat(i64),
            Coins(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Sat(sat) => Ok(Satoshis(sat)),
            Repr::Coins(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A six-decimal fixed-point fraction (1.0 == 1_000_000 micros).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Micros(i64);

impl Micros {
    pub const ZERO: Micros = Micros(0);
    pub const ONE: Micros = Micros(MICROS_PER_UNIT);

    pub const fn from_micros(micros: i64) -> Self {
        Micros(micros)
    }

    pub const fn as_micros(self) -> i64 {
        self.0
    }

    /// Round a float to the nearest micro
    pub fn from_f64(value: f64) -> Self {
        Micros((value * MICROS_PER_UNIT as f64).round() as i64)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / MICROS_PER_UNIT as f64
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for Micros {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Micros(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Micros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let per_unit = MICROS_PER_UNIT as u64;
        write!(f, "{}{}.{:06}", sign, magnitude / per_unit, magnitude % per_unit)
    }
}

/// Parses a decimal fraction, rounding half-to-even at six decimals.
impl FromStr for Micros {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount: ScaledAmount = s.parse()?;
        amount
            .round_half_even(MICRO_DECIMALS)
            .and_then(|m| i64::try_from(m).ok())
            .map(Micros)
            .ok_or_else(|| AmountParseError::OutOfRange(s.to_string()))
    }
}

impl Serialize for Micros {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Accepts a decimal string or a number; both are rounded to six decimals.
impl<'de> Deserialize<'de> for Micros {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(i64),
            Float(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Int(v) => Ok(Micros(v.saturating_mul(MICROS_PER_UNIT))),
            Repr::Float(v) => Ok(Micros::from_f64(v)),
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// An exact decimal `mantissa * 10^-decimals`, wide enough to hold the
/// product of any satoshi amount and any six-decimal factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledAmount {
    mantissa: i128,
    decimals: u32,
}

impl ScaledAmount {
    pub const fn new(mantissa: i128, decimals: u32) -> Self {
        Self { mantissa, decimals }
    }

    pub const fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub const fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Truncate toward zero at the eighth decimal, saturating at the
    /// bounds of [`Satoshis`].
    pub fn truncate_satoshis(self) -> Satoshis {
        match self.truncate_satoshis_checked() {
            Some(sat) => sat,
            None if self.mantissa < 0 => Satoshis(i64::MIN),
            None => Satoshis(i64::MAX),
        }
    }

    fn truncate_satoshis_checked(self) -> Option<Satoshis> {
        let sat = if self.decimals <= SATOSHI_DECIMALS {
            self.mantissa
                .checked_mul(pow10(SATOSHI_DECIMALS - self.decimals)?)?
        } else {
            // i128 division truncates toward zero, so the magnitude is cut
            // and the sign is kept.
            self.mantissa / pow10(self.decimals - SATOSHI_DECIMALS)?
        };
        i64::try_from(sat).ok().map(Satoshis)
    }

    fn round_half_even(self, target: u32) -> Option<i128> {
        if self.decimals <= target {
            return self.mantissa.checked_mul(pow10(target - self.decimals)?);
        }
        // A divisor past i128 exceeds twice any mantissa, so the value rounds to zero.
        let Some(divisor) = pow10(self.decimals - target) else {
            return Some(0);
        };
        let quotient = self.mantissa / divisor;
        let remainder = (self.mantissa % divisor).abs();
        let rest = divisor - remainder;
        let bump = remainder > rest || (remainder == rest && quotient % 2 != 0);
        if !bump {
            return Some(quotient);
        }
        Some(if self.mantissa < 0 { quotient - 1 } else { quotient + 1 })
    }
}

impl From<Satoshis> for ScaledAmount {
    fn from(sat: Satoshis) -> Self {
        ScaledAmount::new(sat.0 as i128, SATOSHI_DECIMALS)
    }
}

impl FromStr for ScaledAmount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountParseError::Empty);
        }
        let invalid = || AmountParseError::Invalid(s.to_string());

        let (negative, unsigned) = match trimmed.as_bytes()[0] {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let mut mantissa: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add((b - b'0') as i128))
                .ok_or_else(|| AmountParseError::OutOfRange(s.to_string()))?;
        }
        if negative {
            mantissa = -mantissa;
        }
        Ok(ScaledAmount::new(mantissa, frac_part.len() as u32))
    }
}

/// Truncate an amount to whole satoshis, toward zero.
///
/// `truncate_satoshis(-0.123456789) == -0.12345678`. Applying it to a value
/// that is already whole satoshis returns it unchanged.
pub fn truncate_satoshis(amount: impl Into<ScaledAmount>) -> Satoshis {
    amount.into().truncate_satoshis()
}

fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaled(s: &str) -> ScaledAmount {
        s.parse().unwrap()
    }

    #[test]
    fn test_truncate_negative_keeps_sign() {
        assert_eq!(
            truncate_satoshis(scaled("-0.123456789")),
            Satoshis::from_sat(-12_345_678)
        );
        assert_eq!(
            truncate_satoshis(scaled("0.123456789")),
            Satoshis::from_sat(12_345_678)
        );
    }

    #[test]
    fn test_truncate_is_idempotent() {
        for s in ["-0.123456789", "1.999999999999", "0.00000001", "-7", "0"] {
            let once = truncate_satoshis(scaled(s));
            assert_eq!(truncate_satoshis(once), once, "input {}", s);
        }
    }

    #[test]
    fn test_truncate_pads_short_fractions() {
        assert_eq!(truncate_satoshis(scaled("1.5")), Satoshis::from_sat(150_000_000));
        assert_eq!(truncate_satoshis(scaled("-2")), Satoshis::from_sat(-200_000_000));
    }

    #[test]
    fn test_mul_truncate() {
        // -3 sat * 1.5 = -4.5 sat, truncated toward zero
        let stake = Satoshis::from_sat(-3);
        assert_eq!(
            stake.mul_truncate(Micros::from_micros(1_500_000)),
            Satoshis::from_sat(-4)
        );
        // doubling is exact
        assert_eq!(
            Satoshis::from_sat(-8).mul_truncate(Micros::from_micros(2_000_000)),
            Satoshis::from_sat(-16)
        );
    }

    #[test]
    fn test_satoshis_display_and_parse() {
        let amount = Satoshis::from_sat(-12_345_678);
        assert_eq!(amount.to_string(), "-0.12345678");
        assert_eq!("-0.12345678".parse::<Satoshis>().unwrap(), amount);
        assert_eq!("1".parse::<Satoshis>().unwrap(), Satoshis::from_coins(1));
        assert!(matches!(
            "0.123456789".parse::<Satoshis>(),
            Err(AmountParseError::TooPrecise { .. })
        ));
        assert!("abc".parse::<Satoshis>().is_err());
        assert!("-".parse::<Satoshis>().is_err());
    }

    #[test]
    fn test_micros_rounds_half_even() {
        assert_eq!("1.0000005".parse::<Micros>().unwrap(), Micros::from_micros(1_000_000));
        assert_eq!("1.0000015".parse::<Micros>().unwrap(), Micros::from_micros(1_000_002));
        assert_eq!("0.25".parse::<Micros>().unwrap(), Micros::from_micros(250_000));
        assert_eq!(Micros::from_micros(1_998_000).to_string(), "1.998000");
    }

    #[test]
    fn test_micros_deep_fractions_round_to_zero() {
        let tiny = format!("0.{}1", "0".repeat(45));
        assert_eq!(tiny.parse::<Micros>().unwrap(), Micros::ZERO);
        assert_eq!(format!("-{}", tiny).parse::<Micros>().unwrap(), Micros::ZERO);

        // 39 significant digits still fit the mantissa
        let long = format!("1.{}", "4".repeat(38));
        assert_eq!(long.parse::<Micros>().unwrap(), Micros::from_micros(1_444_444));
        let half = format!("0.0000005{}", "0".repeat(30));
        assert_eq!(half.parse::<Micros>().unwrap(), Micros::ZERO);
    }

    #[test]
    fn test_as_wager() {
        assert_eq!(Satoshis::from_sat(5).as_wager(), Satoshis::from_sat(-5));
        assert_eq!(Satoshis::from_sat(-5).as_wager(), Satoshis::from_sat(-5));
    }

    #[test]
    fn test_serde_accepts_both_forms() {
        let from_int: Satoshis = serde_json::from_str("-16").unwrap();
        let from_str: Satoshis = serde_json::from_str("\"-0.00000016\"").unwrap();
        assert_eq!(from_int, from_str);
        assert_eq!(serde_json::to_string(&from_int).unwrap(), "-16");

        let pct: Micros = serde_json::from_str("1.0").unwrap();
        assert_eq!(pct, Micros::ONE);
    }
}
