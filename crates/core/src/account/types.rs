//! Customer and account domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tucano_shared::types::{AccountId, CustomerId};

/// Customer category driving the fee/yield/credit-limit tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Entry-level customers.
    Common,
    /// Mid-tier customers with reduced fees.
    Super,
    /// Top-tier customers: no maintenance fee, highest limits.
    Premium,
}

/// A bank customer.
///
/// One customer owns zero-or-more accounts and zero-or-more cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique identifier, assigned by the store.
    pub id: CustomerId,
    /// Tax id (globally unique).
    pub tax_id: String,
    /// Full legal name.
    pub name: String,
    /// Date of birth.
    pub birth_date: NaiveDate,
    /// Category driving the tariff tables.
    pub category: Category,
}

/// Input for registering a new customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    /// Tax id (must be unique).
    pub tax_id: String,
    /// Full legal name.
    pub name: String,
    /// Date of birth.
    pub birth_date: NaiveDate,
    /// Category driving the tariff tables.
    pub category: Category,
}

/// Account kind with its kind-specific rate data.
///
/// A tagged variant instead of a class hierarchy: the engine dispatches on
/// the tag and the rate tables stay data-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum AccountKind {
    /// Checking account, charged a monthly maintenance fee.
    Checking {
        /// Monthly maintenance fee snapshotted from the tariff table at opening.
        monthly_fee: Decimal,
    },
    /// Savings account, credited a monthly yield.
    Savings {
        /// Nominal annual yield rate snapshotted from the tariff table at opening.
        annual_yield: Decimal,
    },
}

impl AccountKind {
    /// Returns the kind discriminant.
    #[must_use]
    pub const fn tag(&self) -> AccountKindTag {
        match self {
            Self::Checking { .. } => AccountKindTag::Checking,
            Self::Savings { .. } => AccountKindTag::Savings,
        }
    }

    /// Returns true for checking accounts.
    #[must_use]
    pub const fn is_checking(&self) -> bool {
        matches!(self, Self::Checking { .. })
    }

    /// Returns true for savings accounts.
    #[must_use]
    pub const fn is_savings(&self) -> bool {
        matches!(self, Self::Savings { .. })
    }
}

/// Account kind discriminant, used when enumerating accounts by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKindTag {
    /// Checking accounts.
    Checking,
    /// Savings accounts.
    Savings,
}

/// A bank account.
///
/// The balance is an exact decimal and is only ever mutated through ledger
/// operations, inside an atomic store unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier, assigned by the store.
    pub id: AccountId,
    /// Account number (unique).
    pub number: String,
    /// Branch code.
    pub branch: String,
    /// Current balance. Equals the sum of all applied movements from zero.
    pub balance: Decimal,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Account kind with its rate data.
    pub kind: AccountKind,
}

/// Input for opening a new account.
///
/// Accounts always open with a zero balance.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Account number (must be unique).
    pub number: String,
    /// Branch code.
    pub branch: String,
    /// Account kind with its rate data.
    pub kind: AccountKind,
}
