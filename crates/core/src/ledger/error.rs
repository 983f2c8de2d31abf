//! Ledger error types for validation and state errors.

use rust_decimal::Decimal;
use thiserror::Error;
use tucano_shared::types::AccountId;

use crate::store::StoreError;

/// Errors that can occur during ledger operations.
///
/// All business-rule violations are detected before any write is staged; a
/// failed operation never leaves a partial balance change behind.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Amount is zero or negative.
    #[error("Amount must be strictly positive, got {0}")]
    InvalidAmount(Decimal),

    /// Balance does not cover the requested debit.
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Balance at validation time.
        balance: Decimal,
        /// Requested debit amount.
        requested: Decimal,
    },

    /// Origin and destination are the same account.
    #[error("Origin and destination accounts must differ")]
    SameAccount,

    /// PIX tax id resolved to no customer, or the customer has no account.
    #[error("No PIX recipient for tax id {0}")]
    RecipientNotFound(String),

    /// Operation applies to the other account kind.
    #[error("Account {account_id} is not a {expected} account")]
    WrongAccountKind {
        /// The rejected account.
        account_id: AccountId,
        /// Expected kind ("checking" or "savings").
        expected: &'static str,
    },

    /// Store-level failure (not found, conflict, unavailable).
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Returns the error code preserved for the transport boundary.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::SameAccount => "SAME_ACCOUNT",
            Self::RecipientNotFound(_) => "RECIPIENT_NOT_FOUND",
            Self::WrongAccountKind { .. } => "WRONG_ACCOUNT_KIND",
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}
