//! The persistence contract consumed by the core, and its reference
//! implementation.
//!
//! The relational store itself lives outside this repository; the core only
//! requires row-level reads, staged row-level writes, and an atomic unit
//! spanning multiple writes. `MemoryStore` implements the same contract for
//! tests and embedded use.
//!
//! Concurrency follows optimistic versioning: every account or card read
//! through a [`StoreUnit`] records the row's version, and `commit` validates
//! all recorded versions before applying any staged write. A row changed by
//! a concurrent commit fails the unit with a retryable
//! [`StoreError::VersionConflict`].

pub mod error;
pub mod memory;

use rust_decimal::Decimal;
use tucano_shared::types::{AccountId, CardId, CustomerId};

use crate::account::{Account, AccountKindTag, Customer};
use crate::card::types::{Card, NewCard};
use crate::ledger::movement::{Movement, NewMovement};

pub use error::StoreError;
pub use memory::MemoryStore;

/// The persistence contract consumed by the ledger and card services.
pub trait Store: Send + Sync {
    /// The scoped atomic unit produced by [`Store::begin`].
    type Unit<'a>: StoreUnit
    where
        Self: 'a;

    /// Opens a new atomic unit.
    fn begin(&self) -> Result<Self::Unit<'_>, StoreError>;

    /// Loads an account by id.
    fn get_account(&self, id: AccountId) -> Result<Account, StoreError>;

    /// Loads an account by its unique number.
    fn get_account_by_number(&self, number: &str) -> Result<Account, StoreError>;

    /// Lists all accounts of the given kind, ascending by id.
    fn list_accounts_by_kind(&self, kind: AccountKindTag) -> Result<Vec<Account>, StoreError>;

    /// Loads a customer by id.
    fn get_customer(&self, id: CustomerId) -> Result<Customer, StoreError>;

    /// Loads a customer by their unique tax id.
    fn get_customer_by_tax_id(&self, tax_id: &str) -> Result<Customer, StoreError>;

    /// Loads a card by id.
    fn get_card(&self, id: CardId) -> Result<Card, StoreError>;

    /// Lists movements touching the account, newest first.
    fn list_movements_by_account(&self, id: AccountId) -> Result<Vec<Movement>, StoreError>;

    /// Lists movements tagged with the card, newest first.
    fn list_movements_by_card(&self, id: CardId) -> Result<Vec<Movement>, StoreError>;
}

/// A scoped atomic unit: staged writes commit together or not at all.
///
/// Reads go against committed state and record row versions; staged writes
/// are not visible to subsequent reads within the same unit. Dropping a unit
/// without committing discards every staged write.
pub trait StoreUnit {
    /// Loads an account and records its version for commit validation.
    fn get_account(&mut self, id: AccountId) -> Result<Account, StoreError>;

    /// Loads a customer (customers are immutable in this core).
    fn get_customer(&mut self, id: CustomerId) -> Result<Customer, StoreError>;

    /// Loads a customer by tax id.
    fn get_customer_by_tax_id(&mut self, tax_id: &str) -> Result<Customer, StoreError>;

    /// Returns the customer's first account (lowest id), if any.
    fn first_account_for_customer(
        &mut self,
        id: CustomerId,
    ) -> Result<Option<Account>, StoreError>;

    /// Loads a card and records its version for commit validation.
    fn get_card(&mut self, id: CardId) -> Result<Card, StoreError>;

    /// Lists movements tagged with the card, newest first.
    ///
    /// Read the card first: its recorded version is what protects decisions
    /// derived from this list against concurrent card movements.
    fn list_movements_by_card(&mut self, id: CardId) -> Result<Vec<Movement>, StoreError>;

    /// Stages a balance write for the account.
    fn update_balance(&mut self, id: AccountId, new_balance: Decimal) -> Result<(), StoreError>;

    /// Stages a full-row card update.
    fn update_card(&mut self, card: Card) -> Result<(), StoreError>;

    /// Stages a movement insert; id and timestamp are assigned immediately
    /// (sequence semantics: ids burned by a rolled-back unit are not reused).
    fn insert_movement(&mut self, movement: NewMovement) -> Result<Movement, StoreError>;

    /// Stages a card insert; the id is assigned immediately.
    fn insert_card(&mut self, card: NewCard) -> Result<Card, StoreError>;

    /// Validates recorded versions and applies all staged writes atomically.
    fn commit(self) -> Result<(), StoreError>;

    /// Discards all staged writes.
    fn rollback(self)
    where
        Self: Sized,
    {
        let _ = self;
    }
}
