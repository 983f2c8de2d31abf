//! Card domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tucano_shared::types::{AccountId, CardId};

/// Card kind with its kind-specific limit.
///
/// Credit limit and daily debit limit are mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum CardKind {
    /// Credit card: purchases accrue to a statement up to the limit.
    Credit {
        /// Maximum unpaid statement total.
        limit: Decimal,
    },
    /// Debit card: purchases debit the linked account up to a daily cap.
    Debit {
        /// Maximum debit total per calendar day.
        daily_limit: Decimal,
    },
}

impl CardKind {
    /// Returns true for credit cards.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::Credit { .. })
    }

    /// Returns true for debit cards.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::Debit { .. })
    }
}

/// A payment card linked to exactly one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Unique identifier, assigned by the store.
    pub id: CardId,
    /// Card number.
    pub number: String,
    /// Holder name as printed.
    pub holder: String,
    /// Expiry date.
    pub expires_at: NaiveDate,
    /// PIN hash (PHC string). The cleartext PIN is never stored.
    pub pin_hash: String,
    /// Card kind with its limit.
    pub kind: CardKind,
    /// Inactive cards accept no purchases.
    pub active: bool,
    /// The linked account.
    pub account_id: AccountId,
}

/// A card pending insertion, before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewCard {
    /// Card number.
    pub number: String,
    /// Holder name as printed.
    pub holder: String,
    /// Expiry date.
    pub expires_at: NaiveDate,
    /// PIN hash (PHC string).
    pub pin_hash: String,
    /// Card kind with its limit.
    pub kind: CardKind,
    /// Whether the card starts active.
    pub active: bool,
    /// The linked account.
    pub account_id: AccountId,
}

/// Requested kind when issuing a card.
///
/// The credit limit is not requested: it comes from the owner's category
/// tariff. The daily debit limit is caller-chosen.
#[derive(Debug, Clone, Copy)]
pub enum CardRequest {
    /// Issue a credit card.
    Credit,
    /// Issue a debit card with the given daily limit.
    Debit {
        /// Maximum debit total per calendar day.
        daily_limit: Decimal,
    },
}

/// Result of issuing a card.
///
/// The CVV is generated once and returned here; it is never stored.
#[derive(Debug, Clone)]
pub struct IssuedCard {
    /// The persisted card.
    pub card: Card,
    /// The card verification value, shown to the holder once.
    pub cvv: String,
}
