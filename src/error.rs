//! Unified error types for the wagering engine.

use rust_decimal::Decimal;
use thiserror::Error;

/// Unified error type surfaced by every core operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WagerError {
    /// Bad user input. Surfaced verbatim, never retried.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Unknown session id or slug.
    #[error("bet not found")]
    NotFound {
        /// What was looked up (id or slug).
        what: String,
    },

    /// Persistence hiccup. Reads may be retried; a failed append must not be.
    #[error("store temporarily unavailable, please try again: {0}")]
    TransientStore(String),
}

impl WagerError {
    /// Create a not-found error for the given key.
    pub fn not_found(what: impl Into<String>) -> Self {
        WagerError::NotFound { what: what.into() }
    }

    /// Whether the failed operation is safe to resubmit as a read.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WagerError::TransientStore(_))
    }

    /// Short machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            WagerError::Validation(_) => "validation",
            WagerError::NotFound { .. } => "not_found",
            WagerError::TransientStore(_) => "transient",
        }
    }
}

/// Rejected user input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Amount is zero or negative.
    #[error("amount must be positive")]
    NonPositiveAmount,

    /// Amount is under one cent.
    #[error("amount must be at least $0.01")]
    AmountTooSmall,

    /// Amount exceeds the largest stake the ledger accepts.
    #[error("amount too large: largest accepted bet is ${max}")]
    AmountTooLarge {
        /// Hard ceiling.
        max: Decimal,
    },

    /// Amount is under the session's minimum.
    #[error("below minimum: minimum bet is ${min}")]
    BelowMinimum {
        /// Current minimum.
        min: Decimal,
    },

    /// Amount is over the session's maximum.
    #[error("above maximum: maximum bet is ${max}")]
    AboveMaximum {
        /// Current maximum.
        max: Decimal,
    },

    /// A required creation field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Wagers need a display name.
    #[error("player name is required")]
    MissingPlayerName,

    /// Option index other than 0 or 1.
    #[error("option index must be 0 or 1, got {0}")]
    InvalidOption(u8),

    /// Only the session owner may change the limits.
    #[error("only the session owner can change bet limits")]
    NotOwner,

    /// Limits are frozen once the first wager exists.
    #[error("bet limits cannot change after the first bet")]
    LimitsLocked,

    /// The store refused the write.
    #[error("rejected by store: {0}")]
    Rejected(String),
}

/// Classified failures of the persistence collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No record for the key.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A uniqueness or integrity rule was violated.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// A write conditional on an empty ledger found wagers.
    #[error("session {0} already has wagers")]
    LedgerNotEmpty(String),

    /// Network or backend hiccup; outcome of a write is unknown.
    #[error("transient store failure: {0}")]
    Transient(String),
}

impl From<StoreError> for WagerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => WagerError::NotFound { what },
            StoreError::ConstraintViolation(reason) => {
                WagerError::Validation(ValidationError::Rejected(reason))
            }
            StoreError::LedgerNotEmpty(_) => WagerError::Validation(ValidationError::LimitsLocked),
            StoreError::Transient(reason) => WagerError::TransientStore(reason),
        }
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, WagerError>;
