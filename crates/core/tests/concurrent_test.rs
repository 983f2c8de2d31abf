//! Concurrency tests for the ledger engine over the in-memory store.
//!
//! The engine must never lose an update: concurrent read-modify-write cycles
//! against the same account serialize through balance-version validation.

use std::sync::Arc;
use std::thread;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tucano_core::account::{AccountKind, Category, NewAccount, NewCustomer, Tariffs};
use tucano_core::ledger::{LedgerError, LedgerService, MovementKind};
use tucano_core::store::{MemoryStore, Store};
use tucano_shared::types::AccountId;

fn seed_checking(store: &MemoryStore, tax_id: &str, number: &str) -> AccountId {
    let customer = store
        .insert_customer(NewCustomer {
            tax_id: tax_id.to_string(),
            name: format!("Customer {tax_id}"),
            birth_date: chrono::NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            category: Category::Common,
        })
        .unwrap();
    store
        .open_account(NewAccount {
            customer_id: customer.id,
            number: number.to_string(),
            branch: "0001".to_string(),
            kind: AccountKind::Checking {
                monthly_fee: dec!(12.00),
            },
        })
        .unwrap()
        .id
}

/// N concurrent withdrawals with funds for exactly K of them: exactly K
/// succeed, the rest fail with `InsufficientFunds`, and the final balance is
/// the starting balance minus K times the amount.
#[test]
fn test_concurrent_withdrawals_lose_no_update() {
    const THREADS: usize = 8;
    const AFFORDABLE: usize = 5;

    let store = Arc::new(MemoryStore::new());
    let account = seed_checking(&store, "100", "0001-1");
    let ledger =
        LedgerService::new(Arc::clone(&store), Tariffs::default()).with_conflict_retries(1000);

    let amount = dec!(100.00);
    let starting = amount * Decimal::from(AFFORDABLE as u64);
    ledger.deposit(account, starting, "seed").unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let ledger = ledger.clone();
            thread::spawn(move || ledger.withdraw(account, amount, "concurrent"))
        })
        .collect();

    let mut successes = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(movement) => {
                assert_eq!(movement.kind, MovementKind::Withdrawal);
                successes += 1;
            }
            Err(LedgerError::InsufficientFunds { .. }) => insufficient += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(successes, AFFORDABLE);
    assert_eq!(insufficient, THREADS - AFFORDABLE);
    assert_eq!(store.get_account(account).unwrap().balance, Decimal::ZERO);

    // One deposit plus exactly K withdrawal movements on record.
    let movements = ledger.statement(account).unwrap();
    let withdrawals = movements
        .iter()
        .filter(|m| m.kind == MovementKind::Withdrawal)
        .count();
    assert_eq!(withdrawals, AFFORDABLE);
    assert_eq!(movements.len(), AFFORDABLE + 1);
}

/// Concurrent opposing transfers conserve the total balance of the closed
/// account set.
#[test]
fn test_concurrent_transfers_conserve_total() {
    const ROUNDS: usize = 20;

    let store = Arc::new(MemoryStore::new());
    let account_a = seed_checking(&store, "100", "0001-1");
    let account_b = seed_checking(&store, "200", "0001-2");
    let ledger =
        LedgerService::new(Arc::clone(&store), Tariffs::default()).with_conflict_retries(1000);

    ledger.deposit(account_a, dec!(1000.00), "seed").unwrap();
    ledger.deposit(account_b, dec!(1000.00), "seed").unwrap();

    let forward = {
        let ledger = ledger.clone();
        thread::spawn(move || {
            for _ in 0..ROUNDS {
                let _ = ledger.transfer(account_a, account_b, dec!(7.00), "ab");
            }
        })
    };
    let backward = {
        let ledger = ledger.clone();
        thread::spawn(move || {
            for _ in 0..ROUNDS {
                let _ = ledger.transfer(account_b, account_a, dec!(11.00), "ba");
            }
        })
    };
    forward.join().unwrap();
    backward.join().unwrap();

    let total = store.get_account(account_a).unwrap().balance
        + store.get_account(account_b).unwrap().balance;
    assert_eq!(total, dec!(2000.00));
}

/// With retries disabled, a genuine conflict surfaces as a retryable error
/// rather than a silent lost update.
#[test]
fn test_exhausted_retries_surface_retryable_conflict() {
    const THREADS: usize = 8;

    let store = Arc::new(MemoryStore::new());
    let account = seed_checking(&store, "100", "0001-1");
    let ledger =
        LedgerService::new(Arc::clone(&store), Tariffs::default()).with_conflict_retries(0);

    ledger.deposit(account, dec!(10000.00), "seed").unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let ledger = ledger.clone();
            thread::spawn(move || ledger.withdraw(account, dec!(1.00), "concurrent"))
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert!(e.is_retryable(), "non-retryable error: {e}"),
        }
    }

    // Whatever succeeded is exactly what the balance reflects.
    let expected = dec!(10000.00) - dec!(1.00) * Decimal::from(successes as u64);
    assert_eq!(store.get_account(account).unwrap().balance, expected);
}
