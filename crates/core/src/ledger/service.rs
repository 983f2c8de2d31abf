//! Ledger service applying balance-mutating operations.
//!
//! Every operation runs as a single atomic store unit: the balance write(s)
//! and the movement insert commit together or not at all. Business-rule
//! violations are detected before anything is staged. Version conflicts from
//! concurrent commits are retried a bounded number of times before the
//! conflict is surfaced as a retryable error.

use std::sync::Arc;

use rust_decimal::Decimal;
use tucano_shared::types::AccountId;

use crate::account::Tariffs;
use crate::store::{Store, StoreError, StoreUnit};

use super::error::LedgerError;
use super::interest;
use super::movement::{Movement, NewMovement};

/// Default bound on version-conflict retries per operation.
const DEFAULT_CONFLICT_RETRIES: u32 = 5;

/// The transaction engine.
pub struct LedgerService<S> {
    store: Arc<S>,
    tariffs: Tariffs,
    max_conflict_retries: u32,
}

impl<S> Clone for LedgerService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tariffs: self.tariffs.clone(),
            max_conflict_retries: self.max_conflict_retries,
        }
    }
}

impl<S: Store> LedgerService<S> {
    /// Creates a ledger service over the given store and tariff schedule.
    #[must_use]
    pub fn new(store: Arc<S>, tariffs: Tariffs) -> Self {
        Self {
            store,
            tariffs,
            max_conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }

    /// Overrides the version-conflict retry bound.
    #[must_use]
    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Returns the store this service operates on.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Deposits `amount` into the account.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for non-positive amounts, `AccountNotFound` if the
    /// account does not exist.
    pub fn deposit(
        &self,
        account_id: AccountId,
        amount: Decimal,
        description: &str,
    ) -> Result<Movement, LedgerError> {
        ensure_positive(amount)?;
        self.retrying(|| {
            let mut unit = self.store.begin()?;
            let account = unit.get_account(account_id)?;
            unit.update_balance(account_id, account.balance + amount)?;
            let movement =
                unit.insert_movement(NewMovement::deposit(account_id, amount, description))?;
            unit.commit()?;
            Ok(movement)
        })
    }

    /// Withdraws `amount` from the account.
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `AccountNotFound`, or `InsufficientFunds` when the
    /// balance does not cover the amount.
    pub fn withdraw(
        &self,
        account_id: AccountId,
        amount: Decimal,
        description: &str,
    ) -> Result<Movement, LedgerError> {
        ensure_positive(amount)?;
        self.retrying(|| {
            let mut unit = self.store.begin()?;
            let movement = debit(
                &mut unit,
                account_id,
                amount,
                NewMovement::withdrawal(account_id, amount, description),
            )?;
            unit.commit()?;
            Ok(movement)
        })
    }

    /// Transfers `amount` between two accounts.
    ///
    /// Both balance updates and the single movement commit as one unit; a
    /// partial transfer is never observable.
    ///
    /// # Errors
    ///
    /// `SameAccount` when origin equals destination, plus the withdraw errors.
    pub fn transfer(
        &self,
        origin: AccountId,
        destination: AccountId,
        amount: Decimal,
        description: &str,
    ) -> Result<Movement, LedgerError> {
        ensure_positive(amount)?;
        if origin == destination {
            return Err(LedgerError::SameAccount);
        }
        self.retrying(|| {
            let mut unit = self.store.begin()?;
            let movement = transfer_in_unit(
                &mut unit,
                origin,
                destination,
                NewMovement::transfer(origin, destination, amount, description),
            )?;
            unit.commit()?;
            Ok(movement)
        })
    }

    /// Transfers `amount` to the first account of the customer holding
    /// `recipient_tax_id`, recording the movement as PIX.
    ///
    /// # Errors
    ///
    /// `RecipientNotFound` when the tax id resolves to no customer or the
    /// customer has no account, plus the transfer errors.
    pub fn pix(
        &self,
        origin: AccountId,
        recipient_tax_id: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<Movement, LedgerError> {
        ensure_positive(amount)?;
        self.retrying(|| {
            let mut unit = self.store.begin()?;

            let recipient = match unit.get_customer_by_tax_id(recipient_tax_id) {
                Ok(customer) => customer,
                Err(StoreError::TaxIdNotFound(_)) => {
                    return Err(LedgerError::RecipientNotFound(recipient_tax_id.to_string()));
                }
                Err(e) => return Err(e.into()),
            };
            let destination = unit
                .first_account_for_customer(recipient.id)?
                .ok_or_else(|| LedgerError::RecipientNotFound(recipient_tax_id.to_string()))?;
            if destination.id == origin {
                return Err(LedgerError::SameAccount);
            }

            let movement = transfer_in_unit(
                &mut unit,
                origin,
                destination.id,
                NewMovement::pix(origin, destination.id, amount, description),
            )?;
            unit.commit()?;
            Ok(movement)
        })
    }

    /// Charges the monthly maintenance fee on a checking account.
    ///
    /// The fee comes from the owning customer's category tariff. A zero fee
    /// (e.g. Premium) is a no-op returning `None`, not an error.
    ///
    /// # Errors
    ///
    /// `WrongAccountKind` for savings accounts, `InsufficientFunds` when the
    /// balance does not cover the fee.
    pub fn apply_maintenance_fee(
        &self,
        account_id: AccountId,
    ) -> Result<Option<Movement>, LedgerError> {
        self.retrying(|| {
            let mut unit = self.store.begin()?;
            let account = unit.get_account(account_id)?;
            if !account.kind.is_checking() {
                return Err(LedgerError::WrongAccountKind {
                    account_id,
                    expected: "checking",
                });
            }

            let customer = unit.get_customer(account.customer_id)?;
            let fee = self.tariffs.maintenance_fee(customer.category);
            if fee <= Decimal::ZERO {
                unit.rollback();
                return Ok(None);
            }

            let movement = debit(
                &mut unit,
                account_id,
                fee,
                NewMovement::maintenance_fee(account_id, fee),
            )?;
            unit.commit()?;
            Ok(Some(movement))
        })
    }

    /// Credits the monthly yield on a savings account.
    ///
    /// The nominal annual rate comes from the owning customer's category
    /// tariff and is converted to an effective monthly rate; the credited
    /// amount is rounded half-to-even to 2 decimal places. A non-positive
    /// yield (zero balance, zero rate) is a no-op returning `None`.
    ///
    /// # Errors
    ///
    /// `WrongAccountKind` for checking accounts.
    pub fn apply_yield(&self, account_id: AccountId) -> Result<Option<Movement>, LedgerError> {
        self.retrying(|| {
            let mut unit = self.store.begin()?;
            let account = unit.get_account(account_id)?;
            if !account.kind.is_savings() {
                return Err(LedgerError::WrongAccountKind {
                    account_id,
                    expected: "savings",
                });
            }

            let customer = unit.get_customer(account.customer_id)?;
            let annual_rate = self.tariffs.annual_yield(customer.category);
            let amount = interest::yield_amount(account.balance, annual_rate);
            if amount <= Decimal::ZERO {
                unit.rollback();
                return Ok(None);
            }

            unit.update_balance(account_id, account.balance + amount)?;
            let movement = unit.insert_movement(NewMovement::yield_credit(account_id, amount))?;
            unit.commit()?;
            Ok(Some(movement))
        })
    }

    /// Returns all movements touching the account, newest first.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the account does not exist.
    pub fn statement(&self, account_id: AccountId) -> Result<Vec<Movement>, LedgerError> {
        self.store.get_account(account_id)?;
        Ok(self.store.list_movements_by_account(account_id)?)
    }

    /// Runs an operation, retrying on version conflicts up to the bound.
    fn retrying<T>(
        &self,
        mut op: impl FnMut() -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut attempts = 0;
        loop {
            match op() {
                Err(e) if is_conflict(&e) && attempts < self.max_conflict_retries => {
                    attempts += 1;
                }
                other => return other,
            }
        }
    }
}

fn is_conflict(error: &LedgerError) -> bool {
    matches!(
        error,
        LedgerError::Store(StoreError::VersionConflict { .. })
    )
}

/// Validates a strictly positive amount.
pub(crate) fn ensure_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

/// Stages a funds-checked debit plus its movement on an open unit.
///
/// Shared by withdrawals, fees, and the card flows so every debit observes
/// the same funds check and movement pairing.
pub(crate) fn debit<U: StoreUnit>(
    unit: &mut U,
    account_id: AccountId,
    amount: Decimal,
    movement: NewMovement,
) -> Result<Movement, LedgerError> {
    let account = unit.get_account(account_id)?;
    if account.balance < amount {
        return Err(LedgerError::InsufficientFunds {
            balance: account.balance,
            requested: amount,
        });
    }
    unit.update_balance(account_id, account.balance - amount)?;
    Ok(unit.insert_movement(movement)?)
}

fn transfer_in_unit<U: StoreUnit>(
    unit: &mut U,
    origin: AccountId,
    destination: AccountId,
    movement: NewMovement,
) -> Result<Movement, LedgerError> {
    let amount = movement.amount;
    let origin_account = unit.get_account(origin)?;
    let destination_account = unit.get_account(destination)?;
    if origin_account.balance < amount {
        return Err(LedgerError::InsufficientFunds {
            balance: origin_account.balance,
            requested: amount,
        });
    }
    unit.update_balance(origin, origin_account.balance - amount)?;
    unit.update_balance(destination, destination_account.balance + amount)?;
    Ok(unit.insert_movement(movement)?)
}
