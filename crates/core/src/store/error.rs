//! Store error types.

use thiserror::Error;
use tucano_shared::types::{AccountId, CardId, CustomerId};

/// Errors surfaced by the persistence contract.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// No account with the given number.
    #[error("Account not found for number {0}")]
    AccountNumberNotFound(String),

    /// Customer not found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// No customer with the given tax id.
    #[error("Customer not found for tax id {0}")]
    TaxIdNotFound(String),

    /// Card not found.
    #[error("Card not found: {0}")]
    CardNotFound(CardId),

    /// Unique constraint violated (tax id, account number).
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// A row read by the unit changed before commit.
    #[error("Version conflict on {entity} {id}, please retry")]
    VersionConflict {
        /// Row kind ("account" or "card").
        entity: &'static str,
        /// Raw row id.
        id: i64,
    },

    /// Movement reference shape inconsistent with its kind.
    #[error("Invalid movement: {0}")]
    InvalidMovement(String),

    /// Transient infrastructure failure.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns the error code preserved for the transport boundary.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) | Self::AccountNumberNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::CustomerNotFound(_) | Self::TaxIdNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::CardNotFound(_) => "CARD_NOT_FOUND",
            Self::DuplicateKey(_) => "DUPLICATE_KEY",
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
            Self::InvalidMovement(_) => "INVALID_MOVEMENT",
            Self::Unavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Returns true if the operation may be retried as-is.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. } | Self::Unavailable(_))
    }
}
