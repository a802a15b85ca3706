//! Error types for updown-core

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::LedgerError;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error types for engine operations.
///
/// The taxonomy is closed: every public operation either succeeds or fails
/// with exactly one of these, and a failure leaves no observable effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Caller does not hold the role the operation requires
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Unknown market or prediction
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad direction tag, stake below minimum, or a non-winning claim
    #[error("Invalid prediction: {0}")]
    InvalidPrediction(String),

    /// Outside the block window for the requested action, or already resolved
    #[error("Market closed: {0}")]
    MarketClosed(String),

    /// Winnings for this prediction were already paid out
    #[error("Winnings already claimed for market {market_id}")]
    AlreadyClaimed { market_id: u64 },

    /// Caller or escrow lacks the funds for a transfer
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },

    /// Malformed numeric input (zero price, inverted block range, overflow)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Fieldless discriminant of [`EngineError`], for callers that only care
/// about which kind of failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    InvalidPrediction,
    MarketClosed,
    AlreadyClaimed,
    InsufficientBalance,
    InvalidParameter,
}

impl EngineError {
    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidPrediction(_) => ErrorKind::InvalidPrediction,
            Self::MarketClosed(_) => ErrorKind::MarketClosed,
            Self::AlreadyClaimed { .. } => ErrorKind::AlreadyClaimed,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
        }
    }

    pub(crate) fn overflow(what: &str) -> Self {
        Self::InvalidParameter(format!("{what} overflows u64"))
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds {
                required,
                available,
            } => Self::InsufficientBalance {
                required,
                available,
            },
            LedgerError::Overflow => Self::overflow("Recipient balance"),
        }
    }
}
