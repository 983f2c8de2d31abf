//! Card service for issuing, purchase authorization, and management.
//!
//! Purchases are authorized and recorded inside a single atomic unit. The
//! card row's version is recorded by the in-unit read, so a concurrent
//! purchase on the same card invalidates the authorization decision and the
//! operation retries with fresh state - the limit checks cannot be raced.

use std::sync::Arc;

use chrono::{Months, NaiveDate, Utc};
use rand_core::{OsRng, TryRngCore};
use rust_decimal::Decimal;
use tucano_shared::types::{AccountId, CardId};

use crate::account::Tariffs;
use crate::ledger::movement::{Movement, MovementKind, NewMovement};
use crate::ledger::service as ledger;
use crate::store::{Store, StoreError, StoreUnit};

use super::error::CardError;
use super::pin;
use super::types::{Card, CardKind, CardRequest, IssuedCard, NewCard};

/// Default bound on version-conflict retries per operation.
const DEFAULT_CONFLICT_RETRIES: u32 = 5;

/// Months until a newly issued card expires.
const VALIDITY_MONTHS: u32 = 60;

/// Card issuing and authorization service.
pub struct CardService<S> {
    store: Arc<S>,
    tariffs: Tariffs,
    max_conflict_retries: u32,
}

impl<S> Clone for CardService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tariffs: self.tariffs.clone(),
            max_conflict_retries: self.max_conflict_retries,
        }
    }
}

impl<S: Store> CardService<S> {
    /// Creates a card service over the given store and tariff schedule.
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

    /// Issues a new card for the account.
    ///
    /// Credit limits come from the owner's category tariff; the daily debit
    /// limit is caller-chosen. The card number, expiry, and CVV are
    /// generated; the CVV is returned once and never stored. Cards start
    /// active.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a negative daily limit, plus store lookup errors.
    pub fn issue_card(
        &self,
        account_id: AccountId,
        request: CardRequest,
        pin: &str,
    ) -> Result<IssuedCard, CardError> {
        let account = self.store.get_account(account_id)?;
        let customer = self.store.get_customer(account.customer_id)?;

        let kind = match request {
            CardRequest::Credit => CardKind::Credit {
                limit: self.tariffs.credit_limit(customer.category),
            },
            CardRequest::Debit { daily_limit } => {
                if daily_limit < Decimal::ZERO {
                    return Err(CardError::InvalidAmount(daily_limit));
                }
                CardKind::Debit { daily_limit }
            }
        };

        let pin_hash = pin::hash_pin(pin)?;
        let number = random_digits(16)?;
        let cvv = random_digits(3)?;
        let expires_at = expiry_date(Utc::now().date_naive())?;

        let mut unit = self.store.begin()?;
        let card = unit.insert_card(NewCard {
            number,
            holder: customer.name,
            expires_at,
            pin_hash,
            kind,
            active: true,
            account_id,
        })?;
        unit.commit()?;

        Ok(IssuedCard { card, cvv })
    }

    /// Authorizes a purchase on the card.
    ///
    /// Credit cards accrue the purchase to their statement (the account
    /// balance is untouched); debit cards debit the linked account within
    /// the daily cap, recording a card-tagged withdrawal.
    ///
    /// # Errors
    ///
    /// `CardInactive`, `AuthenticationFailed`, `CreditLimitExceeded`,
    /// `DailyLimitExceeded`, or `InsufficientFunds` (debit path).
    pub fn authorize_purchase(
        &self,
        card_id: CardId,
        amount: Decimal,
        pin: &str,
        description: &str,
    ) -> Result<Movement, CardError> {
        if amount <= Decimal::ZERO {
            return Err(CardError::InvalidAmount(amount));
        }

        // Argon2 verification is deliberately slow; do it once, outside the
        // retry loop. The in-unit re-read below stays authoritative for the
        // card's state.
        let card = self.store.get_card(card_id)?;
        if !card.active {
            return Err(CardError::CardInactive(card_id));
        }
        if !pin::verify_pin(pin, &card.pin_hash)? {
            return Err(CardError::AuthenticationFailed);
        }

        self.retrying(|| {
            let mut unit = self.store.begin()?;
            let card = unit.get_card(card_id)?;
            if !card.active {
                return Err(CardError::CardInactive(card_id));
            }

            match card.kind {
                CardKind::Credit { limit } => {
                    // The card read above recorded the row version; any
                    // concurrent card movement invalidates this list.
                    let unpaid = unpaid_total(&unit.list_movements_by_card(card_id)?);
                    let available = limit - unpaid;
                    if amount > available {
                        return Err(CardError::CreditLimitExceeded {
                            available,
                            requested: amount,
                        });
                    }
                    let movement = unit.insert_movement(NewMovement::credit_purchase(
                        card_id,
                        amount,
                        description,
                    ))?;
                    unit.commit()?;
                    Ok(movement)
                }
                CardKind::Debit { daily_limit } => {
                    let spent_today = debits_on(
                        &unit.list_movements_by_card(card_id)?,
                        Utc::now().date_naive(),
                    );
                    if spent_today + amount > daily_limit {
                        return Err(CardError::DailyLimitExceeded {
                            limit: daily_limit,
                            spent_today,
                            requested: amount,
                        });
                    }
                    let movement = ledger::debit(
                        &mut unit,
                        card.account_id,
                        amount,
                        NewMovement::card_withdrawal(card.account_id, card_id, amount, description),
                    )?;
                    unit.commit()?;
                    Ok(movement)
                }
            }
        })
    }

    /// Pays the credit card invoice from the linked account.
    ///
    /// # Errors
    ///
    /// `WrongCardKind` for debit cards, `InsufficientFunds` when the linked
    /// account balance does not cover the amount.
    pub fn pay_invoice(&self, card_id: CardId, amount: Decimal) -> Result<Movement, CardError> {
        if amount <= Decimal::ZERO {
            return Err(CardError::InvalidAmount(amount));
        }
        self.retrying(|| {
            let mut unit = self.store.begin()?;
            let card = unit.get_card(card_id)?;
            if !card.kind.is_credit() {
                return Err(CardError::WrongCardKind {
                    card_id,
                    expected: "credit",
                });
            }
            let movement = ledger::debit(
                &mut unit,
                card.account_id,
                amount,
                NewMovement::invoice_payment(card.account_id, card_id, amount),
            )?;
            unit.commit()?;
            Ok(movement)
        })
    }

    /// Activates or deactivates the card.
    pub fn set_active(&self, card_id: CardId, active: bool) -> Result<Card, CardError> {
        self.retrying(|| {
            let mut unit = self.store.begin()?;
            let mut card = unit.get_card(card_id)?;
            card.active = active;
            unit.update_card(card.clone())?;
            unit.commit()?;
            Ok(card)
        })
    }

    /// Sets a new credit limit.
    ///
    /// # Errors
    ///
    /// `WrongCardKind` for debit cards, `InvalidAmount` for negative limits.
    pub fn set_credit_limit(
        &self,
        card_id: CardId,
        new_limit: Decimal,
    ) -> Result<Card, CardError> {
        if new_limit < Decimal::ZERO {
            return Err(CardError::InvalidAmount(new_limit));
        }
        self.retrying(|| {
            let mut unit = self.store.begin()?;
            let mut card = unit.get_card(card_id)?;
            if !card.kind.is_credit() {
                return Err(CardError::WrongCardKind {
                    card_id,
                    expected: "credit",
                });
            }
            card.kind = CardKind::Credit { limit: new_limit };
            unit.update_card(card.clone())?;
            unit.commit()?;
            Ok(card)
        })
    }

    /// Sets a new daily debit limit.
    ///
    /// # Errors
    ///
    /// `WrongCardKind` for credit cards, `InvalidAmount` for negative limits.
    pub fn set_daily_debit_limit(
        &self,
        card_id: CardId,
        new_limit: Decimal,
    ) -> Result<Card, CardError> {
        if new_limit < Decimal::ZERO {
            return Err(CardError::InvalidAmount(new_limit));
        }
        self.retrying(|| {
            let mut unit = self.store.begin()?;
            let mut card = unit.get_card(card_id)?;
            if !card.kind.is_debit() {
                return Err(CardError::WrongCardKind {
                    card_id,
                    expected: "debit",
                });
            }
            card.kind = CardKind::Debit {
                daily_limit: new_limit,
            };
            unit.update_card(card.clone())?;
            unit.commit()?;
            Ok(card)
        })
    }

    /// Returns the credit card's unpaid statement total.
    ///
    /// # Errors
    ///
    /// `WrongCardKind` for debit cards.
    pub fn unpaid_statement_total(&self, card_id: CardId) -> Result<Decimal, CardError> {
        let card = self.store.get_card(card_id)?;
        if !card.kind.is_credit() {
            return Err(CardError::WrongCardKind {
                card_id,
                expected: "credit",
            });
        }
        Ok(unpaid_total(&self.store.list_movements_by_card(card_id)?))
    }

    /// Runs an operation, retrying on version conflicts up to the bound.
    fn retrying<T>(&self, mut op: impl FnMut() -> Result<T, CardError>) -> Result<T, CardError> {
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

fn is_conflict(error: &CardError) -> bool {
    matches!(
        error,
        CardError::Ledger(crate::ledger::LedgerError::Store(
            StoreError::VersionConflict { .. }
        ))
    )
}

/// Sums unpaid credit purchases: everything since the latest invoice payment.
///
/// Expects movements newest first, as the store lists them.
fn unpaid_total(movements: &[Movement]) -> Decimal {
    let mut total = Decimal::ZERO;
    for movement in movements {
        match movement.kind {
            MovementKind::InvoicePayment => break,
            MovementKind::CreditPurchase => total += movement.amount,
            _ => {}
        }
    }
    total
}

/// Sums card-tagged debits recorded on the given calendar day.
fn debits_on(movements: &[Movement], day: NaiveDate) -> Decimal {
    movements
        .iter()
        .filter(|m| m.kind == MovementKind::Withdrawal && m.occurred_at.date_naive() == day)
        .map(|m| m.amount)
        .sum()
}

fn random_digits(count: u32) -> Result<String, CardError> {
    let mut digits = String::with_capacity(count as usize);
    let mut word = 0u64;
    let mut remaining = 0u32;
    for _ in 0..count {
        if remaining == 0 {
            word = OsRng
                .try_next_u64()
                .map_err(|e| CardError::Internal(format!("rng failure: {e}")))?;
            remaining = 18;
        }
        digits.push(char::from(b'0' + (word % 10) as u8));
        word /= 10;
        remaining -= 1;
    }
    Ok(digits)
}

fn expiry_date(from: NaiveDate) -> Result<NaiveDate, CardError> {
    from.checked_add_months(Months::new(VALIDITY_MONTHS))
        .ok_or_else(|| CardError::Internal("expiry date out of range".to_string()))
}
