//! Decoding of bet responses
//!
//! The service answers with flat JSON objects. A refusal is signalled by the
//! presence of a flag key (`"InsufficientFunds": 1`) or an `error` string;
//! a success carries integer satoshi amounts.

use crate::errors::WireError;
use crate::games::types::BatchResult;
use crate::money::Satoshis;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Why the service refused a bet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetRejection {
    ChanceTooHigh,
    ChanceTooLow,
    InsufficientFunds,
    NoPossibleProfit,
    MaxPayoutExceeded,
    /// Rate limited
    TooFast,
    /// A one-time password was required and missing or wrong
    TotpFailure,
    Error(String),
}

impl fmt::Display for BetRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetRejection::ChanceTooHigh => write!(f, "chance to win is too high"),
            BetRejection::ChanceTooLow => write!(f, "chance to win is too low"),
            BetRejection::InsufficientFunds => write!(f, "insufficient funds"),
            BetRejection::NoPossibleProfit => write!(f, "bet cannot produce a profit"),
            BetRejection::MaxPayoutExceeded => write!(f, "maximum payout exceeded"),
            BetRejection::TooFast => write!(f, "rate limited"),
            BetRejection::TotpFailure => write!(f, "one-time password required"),
            BetRejection::Error(msg) => write!(f, "{}", msg),
        }
    }
}

static REJECTION_FLAGS: [(&str, BetRejection); 7] = [
    ("ChanceTooHigh", BetRejection::ChanceTooHigh),
    ("ChanceTooLow", BetRejection::ChanceTooLow),
    ("InsufficientFunds", BetRejection::InsufficientFunds),
    ("NoPossibleProfit", BetRejection::NoPossibleProfit),
    ("MaxPayoutExceeded", BetRejection::MaxPayoutExceeded),
    ("TooFast", BetRejection::TooFast),
    ("TotpFailure", BetRejection::TotpFailure),
];

/// A single manually placed bet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleBetResult {
    pub bet_id: i64,
    /// Zero when the bet lost
    pub pay_out: Satoshis,
    pub secret: u32,
    /// Balance immediately before the bet
    pub starting_balance: Satoshis,
    pub server_seed: String,
}

/// Decode an automated batch response.
///
/// The payload does not echo the client seed, so the caller passes the one
/// the batch was placed with.
pub fn parse_automated_bets_response(json: &str, client_seed: i32) -> Result<BatchResult, WireError> {
    let object = parse_object(json)?;
    check_rejection(&object)?;

    let bet_count = required_i64(&object, "BetCount")?;
    let bet_count = u32::try_from(bet_count)
        .map_err(|_| WireError::Malformed(format!("BetCount out of range: {}", bet_count)))?;

    Ok(BatchResult {
        bet_id: required_i64(&object, "BetId")?,
        bet_count,
        server_seed: required_str(&object, "Seed")?,
        client_seed,
        total_pay_in: required_sat(&object, "PayIn")?,
        total_pay_out: required_sat(&object, "PayOut")?,
        starting_balance: required_sat(&object, "StartingBalance")?,
    })
}

/// Decode a single bet response
pub fn parse_place_bet_response(json: &str) -> Result<SingleBetResult, WireError> {
    let object = parse_object(json)?;
    check_rejection(&object)?;

    let secret = required_i64(&object, "Secret")?;
    let secret = u32::try_from(secret)
        .ok()
        .filter(|s| *s < crate::games::types::GUESS_SPAN)
        .ok_or_else(|| WireError::Malformed(format!("Secret out of range: {}", secret)))?;

    Ok(SingleBetResult {
        bet_id: required_i64(&object, "BetId")?,
        pay_out: required_sat(&object, "PayOut")?,
        secret,
        starting_balance: required_sat(&object, "StartingBalance")?,
        server_seed: required_str(&object, "ServerSeed")?,
    })
}

fn parse_object(json: &str) -> Result<Map<String, Value>, WireError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(object) => Ok(object),
        other => Err(WireError::Malformed(format!("expected a JSON object, got {}", other))),
    }
}

fn check_rejection(object: &Map<String, Value>) -> Result<(), WireError> {
    if let Some((_, rejection)) = REJECTION_FLAGS.iter().find(|(key, _)| object.contains_key(*key)) {
        return Err(WireError::Rejected(rejection.clone()));
    }
    if let Some(message) = object.get("error") {
        let message = message.as_str().map(str::to_string).unwrap_or_else(|| message.to_string());
        return Err(WireError::Rejected(BetRejection::Error(message)));
    }
    Ok(())
}

fn required<'a>(object: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, WireError> {
    object.get(field).ok_or(WireError::MissingField(field))
}

fn required_i64(object: &Map<String, Value>, field: &'static str) -> Result<i64, WireError> {
    let value = required(object, field)?;
    value
        .as_i64()
        .ok_or_else(|| WireError::Malformed(format!("{} is not an integer: {}", field, value)))
}

fn required_sat(object: &Map<String, Value>, field: &'static str) -> Result<Satoshis, WireError> {
    required_i64(object, field).map(Satoshis::from_sat)
}

fn required_str(object: &Map<String, Value>, field: &'static str) -> Result<String, WireError> {
    let value = required(object, field)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| WireError::Malformed(format!("{} is not a string: {}", field, value)))
}
