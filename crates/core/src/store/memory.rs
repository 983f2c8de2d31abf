//! In-memory reference implementation of the store contract.
//!
//! Backs the test suite and embedded use. Rows live in `RwLock`-guarded
//! tables; ids come from atomic sequences (ids burned by rolled-back units
//! are not reused, matching database sequence semantics); commits validate
//! recorded row versions before applying any staged write.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use chrono::Utc;
use rust_decimal::Decimal;
use tucano_shared::types::{AccountId, CardId, CustomerId, MovementId};

use crate::account::{Account, AccountKindTag, Customer, NewAccount, NewCustomer};
use crate::card::types::{Card, NewCard};
use crate::ledger::movement::{Movement, NewMovement};

use super::error::StoreError;
use super::{Store, StoreUnit};

#[derive(Debug, Clone)]
struct AccountRow {
    account: Account,
    version: u64,
}

#[derive(Debug, Clone)]
struct CardRow {
    card: Card,
    version: u64,
}

#[derive(Debug, Default)]
struct Inner {
    customers: BTreeMap<i64, Customer>,
    accounts: BTreeMap<i64, AccountRow>,
    cards: BTreeMap<i64, CardRow>,
    movements: Vec<Movement>,
}

/// In-memory store implementing the persistence contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    next_customer_id: AtomicI64,
    next_account_id: AtomicI64,
    next_card_id: AtomicI64,
    next_movement_id: AtomicI64,
    commit_faults: AtomicU32,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new customer.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the tax id is already registered.
    pub fn insert_customer(&self, new: NewCustomer) -> Result<Customer, StoreError> {
        let mut inner = self.write()?;
        if inner.customers.values().any(|c| c.tax_id == new.tax_id) {
            return Err(StoreError::DuplicateKey(format!("tax id {}", new.tax_id)));
        }

        let id = self.next_customer_id.fetch_add(1, Ordering::Relaxed) + 1;
        let customer = Customer {
            id: CustomerId::from_i64(id),
            tax_id: new.tax_id,
            name: new.name,
            birth_date: new.birth_date,
            category: new.category,
        };
        inner.customers.insert(id, customer.clone());
        Ok(customer)
    }

    /// Opens a new account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound` if the owner does not exist and
    /// `DuplicateKey` if the account number is taken.
    pub fn open_account(&self, new: NewAccount) -> Result<Account, StoreError> {
        let mut inner = self.write()?;
        if !inner.customers.contains_key(&new.customer_id.into_inner()) {
            return Err(StoreError::CustomerNotFound(new.customer_id));
        }
        if inner.accounts.values().any(|r| r.account.number == new.number) {
            return Err(StoreError::DuplicateKey(format!(
                "account number {}",
                new.number
            )));
        }

        let id = self.next_account_id.fetch_add(1, Ordering::Relaxed) + 1;
        let account = Account {
            id: AccountId::from_i64(id),
            number: new.number,
            branch: new.branch,
            balance: Decimal::ZERO,
            customer_id: new.customer_id,
            kind: new.kind,
        };
        inner.accounts.insert(
            id,
            AccountRow {
                account: account.clone(),
                version: 0,
            },
        );
        Ok(account)
    }

    /// Makes the next `n` commits fail with `Unavailable`.
    ///
    /// Fault-injection hook for exercising commit failure paths.
    pub fn fail_next_commits(&self, n: u32) {
        self.commit_faults.store(n, Ordering::SeqCst);
    }

    fn take_commit_fault(&self) -> bool {
        self.commit_faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

fn sort_newest_first(movements: &mut [Movement]) {
    movements.sort_by(|a, b| {
        b.occurred_at
            .cmp(&a.occurred_at)
            .then(b.id.into_inner().cmp(&a.id.into_inner()))
    });
}

impl Store for MemoryStore {
    type Unit<'a> = MemoryUnit<'a>;

    fn begin(&self) -> Result<Self::Unit<'_>, StoreError> {
        Ok(MemoryUnit {
            store: self,
            account_reads: BTreeMap::new(),
            card_reads: BTreeMap::new(),
            balance_writes: BTreeMap::new(),
            card_writes: Vec::new(),
            movement_inserts: Vec::new(),
            card_inserts: Vec::new(),
        })
    }

    fn get_account(&self, id: AccountId) -> Result<Account, StoreError> {
        let inner = self.read()?;
        inner
            .accounts
            .get(&id.into_inner())
            .map(|r| r.account.clone())
            .ok_or(StoreError::AccountNotFound(id))
    }

    fn get_account_by_number(&self, number: &str) -> Result<Account, StoreError> {
        let inner = self.read()?;
        inner
            .accounts
            .values()
            .find(|r| r.account.number == number)
            .map(|r| r.account.clone())
            .ok_or_else(|| StoreError::AccountNumberNotFound(number.to_string()))
    }

    fn list_accounts_by_kind(&self, kind: AccountKindTag) -> Result<Vec<Account>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .accounts
            .values()
            .filter(|r| r.account.kind.tag() == kind)
            .map(|r| r.account.clone())
            .collect())
    }

    fn get_customer(&self, id: CustomerId) -> Result<Customer, StoreError> {
        let inner = self.read()?;
        inner
            .customers
            .get(&id.into_inner())
            .cloned()
            .ok_or(StoreError::CustomerNotFound(id))
    }

    fn get_customer_by_tax_id(&self, tax_id: &str) -> Result<Customer, StoreError> {
        let inner = self.read()?;
        inner
            .customers
            .values()
            .find(|c| c.tax_id == tax_id)
            .cloned()
            .ok_or_else(|| StoreError::TaxIdNotFound(tax_id.to_string()))
    }

    fn get_card(&self, id: CardId) -> Result<Card, StoreError> {
        let inner = self.read()?;
        inner
            .cards
            .get(&id.into_inner())
            .map(|r| r.card.clone())
            .ok_or(StoreError::CardNotFound(id))
    }

    fn list_movements_by_account(&self, id: AccountId) -> Result<Vec<Movement>, StoreError> {
        let inner = self.read()?;
        let mut movements: Vec<Movement> = inner
            .movements
            .iter()
            .filter(|m| m.touches(id))
            .cloned()
            .collect();
        sort_newest_first(&mut movements);
        Ok(movements)
    }

    fn list_movements_by_card(&self, id: CardId) -> Result<Vec<Movement>, StoreError> {
        let inner = self.read()?;
        let mut movements: Vec<Movement> = inner
            .movements
            .iter()
            .filter(|m| m.card == Some(id))
            .cloned()
            .collect();
        sort_newest_first(&mut movements);
        Ok(movements)
    }
}

/// Atomic unit over [`MemoryStore`].
///
/// Reads observe committed state only; staged writes apply at commit after
/// version validation. Dropping the unit discards everything staged.
pub struct MemoryUnit<'a> {
    store: &'a MemoryStore,
    account_reads: BTreeMap<i64, u64>,
    card_reads: BTreeMap<i64, u64>,
    balance_writes: BTreeMap<i64, Decimal>,
    card_writes: Vec<Card>,
    movement_inserts: Vec<Movement>,
    card_inserts: Vec<Card>,
}

impl StoreUnit for MemoryUnit<'_> {
    fn get_account(&mut self, id: AccountId) -> Result<Account, StoreError> {
        let inner = self.store.read()?;
        let row = inner
            .accounts
            .get(&id.into_inner())
            .ok_or(StoreError::AccountNotFound(id))?;
        // Keep the first recorded version: a change between two reads in the
        // same unit must still fail the commit.
        self.account_reads
            .entry(id.into_inner())
            .or_insert(row.version);
        Ok(row.account.clone())
    }

    fn get_customer(&mut self, id: CustomerId) -> Result<Customer, StoreError> {
        self.store.get_customer(id)
    }

    fn get_customer_by_tax_id(&mut self, tax_id: &str) -> Result<Customer, StoreError> {
        self.store.get_customer_by_tax_id(tax_id)
    }

    fn first_account_for_customer(
        &mut self,
        id: CustomerId,
    ) -> Result<Option<Account>, StoreError> {
        let first = {
            let inner = self.store.read()?;
            inner
                .accounts
                .values()
                .find(|r| r.account.customer_id == id)
                .map(|r| r.account.id)
        };
        match first {
            Some(account_id) => Ok(Some(self.get_account(account_id)?)),
            None => Ok(None),
        }
    }

    fn get_card(&mut self, id: CardId) -> Result<Card, StoreError> {
        let inner = self.store.read()?;
        let row = inner
            .cards
            .get(&id.into_inner())
            .ok_or(StoreError::CardNotFound(id))?;
        self.card_reads.entry(id.into_inner()).or_insert(row.version);
        Ok(row.card.clone())
    }

    fn list_movements_by_card(&mut self, id: CardId) -> Result<Vec<Movement>, StoreError> {
        self.store.list_movements_by_card(id)
    }

    fn update_balance(&mut self, id: AccountId, new_balance: Decimal) -> Result<(), StoreError> {
        self.balance_writes.insert(id.into_inner(), new_balance);
        Ok(())
    }

    fn update_card(&mut self, card: Card) -> Result<(), StoreError> {
        self.card_writes.push(card);
        Ok(())
    }

    fn insert_movement(&mut self, movement: NewMovement) -> Result<Movement, StoreError> {
        if let Some(violation) = movement.shape_violation() {
            return Err(StoreError::InvalidMovement(violation));
        }

        let id = self.store.next_movement_id.fetch_add(1, Ordering::Relaxed) + 1;
        let movement = Movement {
            id: MovementId::from_i64(id),
            kind: movement.kind,
            amount: movement.amount,
            occurred_at: Utc::now(),
            origin: movement.origin,
            destination: movement.destination,
            card: movement.card,
            description: movement.description,
        };
        self.movement_inserts.push(movement.clone());
        Ok(movement)
    }

    fn insert_card(&mut self, card: NewCard) -> Result<Card, StoreError> {
        let id = self.store.next_card_id.fetch_add(1, Ordering::Relaxed) + 1;
        let card = Card {
            id: CardId::from_i64(id),
            number: card.number,
            holder: card.holder,
            expires_at: card.expires_at,
            pin_hash: card.pin_hash,
            kind: card.kind,
            active: card.active,
            account_id: card.account_id,
        };
        self.card_inserts.push(card.clone());
        Ok(card)
    }

    fn commit(self) -> Result<(), StoreError> {
        if self.store.take_commit_fault() {
            return Err(StoreError::Unavailable(
                "injected commit failure".to_string(),
            ));
        }

        let mut inner = self.store.write()?;

        // Validate every recorded version before touching anything.
        for (id, version) in &self.account_reads {
            let row = inner
                .accounts
                .get(id)
                .ok_or(StoreError::AccountNotFound(AccountId::from_i64(*id)))?;
            if row.version != *version {
                return Err(StoreError::VersionConflict {
                    entity: "account",
                    id: *id,
                });
            }
        }
        for (id, version) in &self.card_reads {
            let row = inner
                .cards
                .get(id)
                .ok_or(StoreError::CardNotFound(CardId::from_i64(*id)))?;
            if row.version != *version {
                return Err(StoreError::VersionConflict {
                    entity: "card",
                    id: *id,
                });
            }
        }

        // Referential checks for staged rows.
        for movement in &self.movement_inserts {
            for account_id in [movement.origin, movement.destination].into_iter().flatten() {
                if !inner.accounts.contains_key(&account_id.into_inner()) {
                    return Err(StoreError::AccountNotFound(account_id));
                }
            }
            if let Some(card_id) = movement.card {
                let staged = self.card_inserts.iter().any(|c| c.id == card_id);
                if !staged && !inner.cards.contains_key(&card_id.into_inner()) {
                    return Err(StoreError::CardNotFound(card_id));
                }
            }
        }
        for card in &self.card_inserts {
            if !inner.accounts.contains_key(&card.account_id.into_inner()) {
                return Err(StoreError::AccountNotFound(card.account_id));
            }
        }

        // Apply. Balance writes and card-tagged movements bump row versions
        // so concurrent units reading the same rows fail their commits.
        for (id, balance) in self.balance_writes {
            if let Some(row) = inner.accounts.get_mut(&id) {
                row.account.balance = balance;
                row.version += 1;
            } else {
                return Err(StoreError::AccountNotFound(AccountId::from_i64(id)));
            }
        }
        for card in self.card_writes {
            let id = card.id.into_inner();
            match inner.cards.get_mut(&id) {
                Some(row) => {
                    row.card = card;
                    row.version += 1;
                }
                None => return Err(StoreError::CardNotFound(card.id)),
            }
        }
        for card in self.card_inserts {
            inner.cards.insert(card.id.into_inner(), CardRow { card, version: 0 });
        }
        for movement in self.movement_inserts {
            if let Some(card_id) = movement.card {
                if let Some(row) = inner.cards.get_mut(&card_id.into_inner()) {
                    row.version += 1;
                }
            }
            inner.movements.push(movement);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountKind, Category};
    use rust_decimal_macros::dec;

    fn seed_account(store: &MemoryStore) -> Account {
        let customer = store
            .insert_customer(NewCustomer {
                tax_id: "111.111.111-11".to_string(),
                name: "Ana Souza".to_string(),
                birth_date: chrono::NaiveDate::from_ymd_opt(1990, 3, 14).unwrap(),
                category: Category::Common,
            })
            .unwrap();
        store
            .open_account(NewAccount {
                customer_id: customer.id,
                number: "0001-1".to_string(),
                branch: "0001".to_string(),
                kind: AccountKind::Checking {
                    monthly_fee: dec!(12.00),
                },
            })
            .unwrap()
    }

    #[test]
    fn test_open_account_starts_at_zero() {
        let store = MemoryStore::new();
        let account = seed_account(&store);

        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(store.get_account(account.id).unwrap().balance, Decimal::ZERO);
        assert_eq!(
            store.get_account_by_number("0001-1").unwrap().id,
            account.id
        );
    }

    #[test]
    fn test_duplicate_tax_id_rejected() {
        let store = MemoryStore::new();
        seed_account(&store);

        let result = store.insert_customer(NewCustomer {
            tax_id: "111.111.111-11".to_string(),
            name: "Other".to_string(),
            birth_date: chrono::NaiveDate::from_ymd_opt(1985, 1, 1).unwrap(),
            category: Category::Super,
        });
        assert!(matches!(result, Err(StoreError::DuplicateKey(_))));
    }

    #[test]
    fn test_duplicate_account_number_rejected() {
        let store = MemoryStore::new();
        let account = seed_account(&store);

        let result = store.open_account(NewAccount {
            customer_id: account.customer_id,
            number: "0001-1".to_string(),
            branch: "0001".to_string(),
            kind: AccountKind::Savings {
                annual_yield: dec!(0.005),
            },
        });
        assert!(matches!(result, Err(StoreError::DuplicateKey(_))));
    }

    #[test]
    fn test_unit_commit_applies_staged_writes() {
        let store = MemoryStore::new();
        let account = seed_account(&store);

        let mut unit = store.begin().unwrap();
        let loaded = unit.get_account(account.id).unwrap();
        unit.update_balance(account.id, loaded.balance + dec!(100)).unwrap();
        unit.insert_movement(NewMovement::deposit(account.id, dec!(100), "d"))
            .unwrap();
        unit.commit().unwrap();

        assert_eq!(store.get_account(account.id).unwrap().balance, dec!(100));
        assert_eq!(store.list_movements_by_account(account.id).unwrap().len(), 1);
    }

    #[test]
    fn test_unit_drop_discards_staged_writes() {
        let store = MemoryStore::new();
        let account = seed_account(&store);

        {
            let mut unit = store.begin().unwrap();
            unit.get_account(account.id).unwrap();
            unit.update_balance(account.id, dec!(999)).unwrap();
            unit.insert_movement(NewMovement::deposit(account.id, dec!(999), "d"))
                .unwrap();
            // dropped without commit
        }

        assert_eq!(store.get_account(account.id).unwrap().balance, Decimal::ZERO);
        assert!(store.list_movements_by_account(account.id).unwrap().is_empty());
    }

    #[test]
    fn test_version_conflict_detected() {
        let store = MemoryStore::new();
        let account = seed_account(&store);

        let mut first = store.begin().unwrap();
        let loaded = first.get_account(account.id).unwrap();
        first
            .update_balance(account.id, loaded.balance + dec!(10))
            .unwrap();

        let mut second = store.begin().unwrap();
        let loaded = second.get_account(account.id).unwrap();
        second
            .update_balance(account.id, loaded.balance + dec!(20))
            .unwrap();

        first.commit().unwrap();
        assert!(matches!(
            second.commit(),
            Err(StoreError::VersionConflict { entity: "account", .. })
        ));
        assert_eq!(store.get_account(account.id).unwrap().balance, dec!(10));
    }

    #[test]
    fn test_injected_commit_failure_applies_nothing() {
        let store = MemoryStore::new();
        let account = seed_account(&store);

        store.fail_next_commits(1);
        let mut unit = store.begin().unwrap();
        unit.get_account(account.id).unwrap();
        unit.update_balance(account.id, dec!(50)).unwrap();
        assert!(matches!(unit.commit(), Err(StoreError::Unavailable(_))));

        assert_eq!(store.get_account(account.id).unwrap().balance, Decimal::ZERO);

        // Next commit goes through.
        let mut unit = store.begin().unwrap();
        unit.get_account(account.id).unwrap();
        unit.update_balance(account.id, dec!(50)).unwrap();
        unit.commit().unwrap();
        assert_eq!(store.get_account(account.id).unwrap().balance, dec!(50));
    }

    #[test]
    fn test_invalid_movement_shape_rejected() {
        let store = MemoryStore::new();
        let account = seed_account(&store);

        let mut unit = store.begin().unwrap();
        let mut movement = NewMovement::deposit(account.id, dec!(10), "d");
        movement.destination = None;
        assert!(matches!(
            unit.insert_movement(movement),
            Err(StoreError::InvalidMovement(_))
        ));
    }

    #[test]
    fn test_movements_listed_newest_first() {
        let store = MemoryStore::new();
        let account = seed_account(&store);

        for amount in [dec!(1), dec!(2), dec!(3)] {
            let mut unit = store.begin().unwrap();
            let loaded = unit.get_account(account.id).unwrap();
            unit.update_balance(account.id, loaded.balance + amount).unwrap();
            unit.insert_movement(NewMovement::deposit(account.id, amount, "d"))
                .unwrap();
            unit.commit().unwrap();
        }

        let movements = store.list_movements_by_account(account.id).unwrap();
        assert_eq!(movements.len(), 3);
        assert_eq!(movements[0].amount, dec!(3));
        assert_eq!(movements[2].amount, dec!(1));
    }
}
