//! Error types for fairdice
//!
//! Verification failures, configuration problems and wire decoding problems
//! are kept in separate families and folded into [`FairDiceError`] at the
//! crate boundary.

use crate::money::Satoshis;
use crate::wire::BetRejection;
use thiserror::Error;

/// Root error type for all fairdice operations
#[derive(Debug, Error)]
pub enum FairDiceError {
    #[error("Verification error: {0}")]
    Verification(#[from] VerificationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while recomputing or cross-checking bet results.
///
/// None of these are retried: every input is deterministic, so the same
/// input fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("Malformed server seed: {reason}")]
    MalformedSeed { reason: String },

    #[error("Invalid guess range {low}..={high} (expected 0 <= low <= high <= 999999)")]
    InvalidRange { low: i64, high: i64 },

    #[error(
        "Ledger mismatch for batch {bet_id}: pay in {actual_pay_in} vs declared {expected_pay_in}, \
         pay out {actual_pay_out} vs declared {expected_pay_out}"
    )]
    LedgerMismatch {
        bet_id: i64,
        expected_pay_in: Satoshis,
        actual_pay_in: Satoshis,
        expected_pay_out: Satoshis,
        actual_pay_out: Satoshis,
    },

    #[error("Server seed commitment mismatch: committed {committed}, computed {computed}")]
    CommitmentMismatch { committed: String, computed: String },

    #[error("Batch {bet_id} reports {bet_count} bets but at most {max_bets} were requested")]
    TooManyBets { bet_id: i64, bet_count: u32, max_bets: u32 },

    #[error("Batch {bet_id} was placed with client seed {batch}, settings use {configured}")]
    ClientSeedMismatch { bet_id: i64, configured: i32, batch: i32 },

    #[error("Invalid bet settings: {0}")]
    InvalidSettings(String),

    #[error("Verification task failed: {0}")]
    TaskFailed(String),
}

/// Configuration loading and validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),
}

/// Errors decoding responses handed over by the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("Bet rejected by server: {0}")]
    Rejected(BetRejection),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for WireError {
    fn from(e: serde_json::Error) -> Self {
        WireError::Malformed(e.to_string())
    }
}

// Convenience type alias for Results
pub type FairDiceResult<T> = Result<T, FairDiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = VerificationError::InvalidRange { low: 10, high: 5 };
        let root: FairDiceError = err.into();

        assert!(root.to_string().contains("Verification error"));
        assert!(root.to_string().contains("10..=5"));
    }

    #[test]
    fn test_ledger_mismatch_details() {
        let err = VerificationError::LedgerMismatch {
            bet_id: 42,
            expected_pay_in: Satoshis::from_sat(-4),
            actual_pay_in: Satoshis::from_sat(-5),
            expected_pay_out: Satoshis::from_sat(3),
            actual_pay_out: Satoshis::from_sat(3),
        };

        let msg = err.to_string();
        assert!(msg.contains("batch 42"));
        assert!(msg.contains("-0.00000005"));
        assert!(msg.contains("-0.00000004"));
    }

    #[test]
    fn test_error_conversion() {
        let root: FairDiceError = ConfigurationError::ValidationFailed("test".to_string()).into();
        match root {
            FairDiceError::Configuration(_) => {}
            _ => panic!("Expected configuration error"),
        }
    }

    #[test]
    fn test_error_source() {
        let root: FairDiceError = WireError::MissingField("BetId").into();
        assert!(root.source().is_some());
    }
}
