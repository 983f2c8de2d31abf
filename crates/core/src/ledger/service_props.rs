//! Property-based tests for the ledger engine.
//!
//! - Balance conservation under closed transfer sequences
//! - Balance reconstruction from deposits and withdrawals
//! - Yield computation determinism and scale

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::account::{AccountKind, Category, NewAccount, NewCustomer, Tariffs};
use crate::store::{MemoryStore, Store, StoreUnit};

use super::error::LedgerError;
use super::interest;
use super::service::LedgerService;

/// Strategy for positive amounts between 0.01 and 1000.00.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for a transfer instruction between three accounts.
fn transfer_strategy() -> impl Strategy<Value = (usize, usize, Decimal)> {
    (0usize..3, 0usize..3, amount_strategy())
}

/// Seeds three checking accounts with the given starting balances.
fn seed_accounts(
    store: &MemoryStore,
    balances: &[Decimal],
) -> Vec<tucano_shared::types::AccountId> {
    balances
        .iter()
        .enumerate()
        .map(|(i, balance)| {
            let customer = store
                .insert_customer(NewCustomer {
                    tax_id: format!("tax-{i}"),
                    name: format!("Customer {i}"),
                    birth_date: chrono::NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                    category: Category::Common,
                })
                .unwrap();
            let account = store
                .open_account(NewAccount {
                    customer_id: customer.id,
                    number: format!("acct-{i}"),
                    branch: "0001".to_string(),
                    kind: AccountKind::Checking {
                        monthly_fee: Decimal::new(1200, 2),
                    },
                })
                .unwrap();
            if *balance > Decimal::ZERO {
                let mut unit = store.begin().unwrap();
                unit.update_balance(account.id, *balance).unwrap();
                unit.commit().unwrap();
            }
            account.id
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any sequence of transfers within a closed set of accounts, the
    /// sum of all balances is invariant.
    #[test]
    fn prop_transfers_conserve_total_balance(
        balances in prop::collection::vec(amount_strategy(), 3),
        transfers in prop::collection::vec(transfer_strategy(), 0..20),
    ) {
        let store = Arc::new(MemoryStore::new());
        let accounts = seed_accounts(&store, &balances);
        let ledger = LedgerService::new(Arc::clone(&store), Tariffs::default());

        let initial_total: Decimal = balances.iter().copied().sum();

        for (from, to, amount) in transfers {
            // Rejected transfers (same account, insufficient funds) must not
            // move money either.
            let _ = ledger.transfer(accounts[from], accounts[to], amount, "prop");
        }

        let final_total: Decimal = accounts
            .iter()
            .map(|id| store.get_account(*id).unwrap().balance)
            .sum();
        prop_assert_eq!(initial_total, final_total);
    }

    /// The final balance equals the net of accepted deposits and withdrawals,
    /// and a rejected withdrawal leaves the balance untouched.
    #[test]
    fn prop_balance_is_net_of_accepted_operations(
        operations in prop::collection::vec((any::<bool>(), amount_strategy()), 1..30),
    ) {
        let store = Arc::new(MemoryStore::new());
        let accounts = seed_accounts(&store, &[Decimal::ZERO]);
        let ledger = LedgerService::new(Arc::clone(&store), Tariffs::default());
        let account = accounts[0];

        let mut expected = Decimal::ZERO;
        for (is_deposit, amount) in operations {
            if is_deposit {
                ledger.deposit(account, amount, "prop").unwrap();
                expected += amount;
            } else {
                match ledger.withdraw(account, amount, "prop") {
                    Ok(_) => expected -= amount,
                    Err(LedgerError::InsufficientFunds { .. }) => {
                        prop_assert!(expected < amount);
                    }
                    Err(e) => prop_assert!(false, "unexpected error: {}", e),
                }
            }
            prop_assert_eq!(store.get_account(account).unwrap().balance, expected);
        }

        // The statement replays to the same balance.
        let replayed: Decimal = ledger
            .statement(account)
            .unwrap()
            .iter()
            .map(|m| m.signed_effect_on(account))
            .sum();
        prop_assert_eq!(replayed, expected);
    }

    /// Yield computation is deterministic, non-negative for non-negative
    /// inputs, and never has more than 2 decimal places.
    #[test]
    fn prop_yield_deterministic_and_scaled(
        balance in amount_strategy(),
        rate_millis in 0i64..50i64,
    ) {
        let annual_rate = Decimal::new(rate_millis, 3);

        let first = interest::yield_amount(balance, annual_rate);
        let second = interest::yield_amount(balance, annual_rate);
        prop_assert_eq!(first, second);
        prop_assert!(first >= Decimal::ZERO);
        prop_assert!(first.scale() <= 2);
    }
}
