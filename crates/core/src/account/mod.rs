//! Customers, accounts, and the category tariff tables.
//!
//! This module defines the bank's master data:
//! - Customer identity and category
//! - Account rows with kind-specific rate data
//! - The per-category tariff schedule (fees, yield rates, credit limits)

pub mod tariff;
pub mod types;

pub use tariff::Tariffs;
pub use types::{Account, AccountKind, AccountKindTag, Category, Customer, NewAccount, NewCustomer};
