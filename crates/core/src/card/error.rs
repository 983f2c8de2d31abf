//! Card error types.

use rust_decimal::Decimal;
use thiserror::Error;
use tucano_shared::types::CardId;

use crate::ledger::LedgerError;
use crate::store::StoreError;

use super::pin::PinError;

/// Errors that can occur during card operations.
#[derive(Debug, Error)]
pub enum CardError {
    /// Inactive cards accept no purchases.
    #[error("Card {0} is inactive")]
    CardInactive(CardId),

    /// PIN did not match.
    #[error("PIN authentication failed")]
    AuthenticationFailed,

    /// Purchase exceeds the available credit limit.
    #[error("Credit limit exceeded: available {available}, requested {requested}")]
    CreditLimitExceeded {
        /// Limit minus the unpaid statement total.
        available: Decimal,
        /// Requested purchase amount.
        requested: Decimal,
    },

    /// Purchase exceeds the card's daily debit cap.
    #[error("Daily limit exceeded: limit {limit}, spent today {spent_today}, requested {requested}")]
    DailyLimitExceeded {
        /// The card's daily limit.
        limit: Decimal,
        /// Debits already made today.
        spent_today: Decimal,
        /// Requested purchase amount.
        requested: Decimal,
    },

    /// Operation applies to the other card kind.
    #[error("Card {card_id} is not a {expected} card")]
    WrongCardKind {
        /// The rejected card.
        card_id: CardId,
        /// Expected kind ("credit" or "debit").
        expected: &'static str,
    },

    /// Amount or limit is negative (or zero where positivity is required).
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// PIN hashing or verification failed unexpectedly.
    #[error("PIN processing failed: {0}")]
    Pin(#[from] PinError),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Ledger-level failure (funds, store).
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<StoreError> for CardError {
    fn from(e: StoreError) -> Self {
        Self::Ledger(LedgerError::Store(e))
    }
}

impl CardError {
    /// Returns the error code preserved for the transport boundary.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CardInactive(_) => "CARD_INACTIVE",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::CreditLimitExceeded { .. } => "CREDIT_LIMIT_EXCEEDED",
            Self::DailyLimitExceeded { .. } => "DAILY_LIMIT_EXCEEDED",
            Self::WrongCardKind { .. } => "WRONG_CARD_KIND",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::Pin(_) => "PIN_PROCESSING_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Ledger(e) => e.error_code(),
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_retryable(),
            _ => false,
        }
    }
}
