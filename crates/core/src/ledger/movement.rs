//! Movement domain types.
//!
//! A movement is the append-only audit record of a balance-affecting event.
//! It is created exactly once, inside the same atomic unit as the balance
//! update(s) it describes, and is never updated or deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tucano_shared::types::{AccountId, CardId, MovementId};

/// Movement kind classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Cash in: destination account only.
    Deposit,
    /// Cash out: origin account only. Card-tagged when a debit card drove it.
    Withdrawal,
    /// Account-to-account transfer: origin and destination.
    Transfer,
    /// PIX transfer resolved through the recipient's tax id: origin and destination.
    Pix,
    /// Monthly checking-account maintenance fee: origin account only.
    MaintenanceFee,
    /// Monthly savings yield credit: destination account only.
    Yield,
    /// Credit-card purchase accruing to the statement: card only.
    CreditPurchase,
    /// Credit-card invoice payment: origin account and card.
    InvoicePayment,
}

/// A persisted movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    /// Unique identifier, assigned by the store at insert time.
    pub id: MovementId,
    /// Movement kind.
    pub kind: MovementKind,
    /// Amount (always strictly positive).
    pub amount: Decimal,
    /// When the movement was recorded.
    pub occurred_at: DateTime<Utc>,
    /// Origin account, when the kind debits one.
    pub origin: Option<AccountId>,
    /// Destination account, when the kind credits one.
    pub destination: Option<AccountId>,
    /// Card reference, when a card drove the movement.
    pub card: Option<CardId>,
    /// Free-text description.
    pub description: String,
}

impl Movement {
    /// Returns true if the movement references the account as origin or destination.
    #[must_use]
    pub fn touches(&self, account_id: AccountId) -> bool {
        self.origin == Some(account_id) || self.destination == Some(account_id)
    }

    /// Returns the movement's effect on the given account balance.
    ///
    /// Positive for credits, negative for debits, zero when the movement does
    /// not touch the account balance (e.g. credit purchases).
    #[must_use]
    pub fn signed_effect_on(&self, account_id: AccountId) -> Decimal {
        let mut effect = Decimal::ZERO;
        if self.destination == Some(account_id) {
            effect += self.amount;
        }
        if self.origin == Some(account_id) {
            effect -= self.amount;
        }
        effect
    }
}

/// A movement pending insertion, before the store assigns id and timestamp.
///
/// Use the kind-specific constructors: they produce the reference shape the
/// kind requires, which the store re-checks at insert.
#[derive(Debug, Clone)]
pub struct NewMovement {
    /// Movement kind.
    pub kind: MovementKind,
    /// Amount (must be strictly positive).
    pub amount: Decimal,
    /// Origin account, when the kind debits one.
    pub origin: Option<AccountId>,
    /// Destination account, when the kind credits one.
    pub destination: Option<AccountId>,
    /// Card reference, when a card drove the movement.
    pub card: Option<CardId>,
    /// Free-text description.
    pub description: String,
}

impl NewMovement {
    /// A deposit into `destination`.
    #[must_use]
    pub fn deposit(destination: AccountId, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            kind: MovementKind::Deposit,
            amount,
            origin: None,
            destination: Some(destination),
            card: None,
            description: description.into(),
        }
    }

    /// A withdrawal from `origin`.
    #[must_use]
    pub fn withdrawal(origin: AccountId, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            kind: MovementKind::Withdrawal,
            amount,
            origin: Some(origin),
            destination: None,
            card: None,
            description: description.into(),
        }
    }

    /// A debit-card withdrawal from `origin`, tagged with the card.
    #[must_use]
    pub fn card_withdrawal(
        origin: AccountId,
        card: CardId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            card: Some(card),
            ..Self::withdrawal(origin, amount, description)
        }
    }

    /// A transfer from `origin` to `destination`.
    #[must_use]
    pub fn transfer(
        origin: AccountId,
        destination: AccountId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind: MovementKind::Transfer,
            amount,
            origin: Some(origin),
            destination: Some(destination),
            card: None,
            description: description.into(),
        }
    }

    /// A PIX transfer from `origin` to `destination`.
    #[must_use]
    pub fn pix(
        origin: AccountId,
        destination: AccountId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind: MovementKind::Pix,
            ..Self::transfer(origin, destination, amount, description)
        }
    }

    /// A maintenance fee debit from `origin`.
    #[must_use]
    pub fn maintenance_fee(origin: AccountId, amount: Decimal) -> Self {
        Self {
            kind: MovementKind::MaintenanceFee,
            amount,
            origin: Some(origin),
            destination: None,
            card: None,
            description: "Monthly maintenance fee".to_string(),
        }
    }

    /// A yield credit into `destination`.
    #[must_use]
    pub fn yield_credit(destination: AccountId, amount: Decimal) -> Self {
        Self {
            kind: MovementKind::Yield,
            amount,
            origin: None,
            destination: Some(destination),
            card: None,
            description: "Monthly savings yield".to_string(),
        }
    }

    /// A credit-card purchase accruing to the card's statement.
    #[must_use]
    pub fn credit_purchase(card: CardId, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            kind: MovementKind::CreditPurchase,
            amount,
            origin: None,
            destination: None,
            card: Some(card),
            description: description.into(),
        }
    }

    /// An invoice payment debiting `origin` for the card's statement.
    #[must_use]
    pub fn invoice_payment(origin: AccountId, card: CardId, amount: Decimal) -> Self {
        Self {
            kind: MovementKind::InvoicePayment,
            amount,
            origin: Some(origin),
            destination: None,
            card: Some(card),
            description: "Credit card invoice payment".to_string(),
        }
    }

    /// Checks the reference shape against the movement kind.
    ///
    /// Returns a human-readable violation, or `None` when the shape is valid.
    /// The store rejects invalid shapes at insert.
    #[must_use]
    pub fn shape_violation(&self) -> Option<String> {
        if self.amount <= Decimal::ZERO {
            return Some(format!("amount must be strictly positive, got {}", self.amount));
        }

        let (origin, destination, card) = (
            self.origin.is_some(),
            self.destination.is_some(),
            self.card.is_some(),
        );
        let expected: (bool, bool, bool) = match self.kind {
            MovementKind::Deposit | MovementKind::Yield => (false, true, false),
            MovementKind::MaintenanceFee => (true, false, false),
            MovementKind::Transfer | MovementKind::Pix => (true, true, false),
            MovementKind::CreditPurchase => (false, false, true),
            MovementKind::InvoicePayment => (true, false, true),
            // Plain withdrawals carry no card; debit-card purchases do.
            MovementKind::Withdrawal => (true, false, card),
        };

        if (origin, destination, card) == expected {
            if matches!(self.kind, MovementKind::Transfer | MovementKind::Pix)
                && self.origin == self.destination
            {
                return Some("origin and destination must differ".to_string());
            }
            None
        } else {
            Some(format!(
                "invalid references for {:?}: origin={origin}, destination={destination}, card={card}",
                self.kind
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(id: i64) -> AccountId {
        AccountId::from_i64(id)
    }

    #[test]
    fn test_constructors_produce_valid_shapes() {
        let shapes = [
            NewMovement::deposit(account(1), dec!(10), "d"),
            NewMovement::withdrawal(account(1), dec!(10), "w"),
            NewMovement::card_withdrawal(account(1), CardId::from_i64(7), dec!(10), "cw"),
            NewMovement::transfer(account(1), account(2), dec!(10), "t"),
            NewMovement::pix(account(1), account(2), dec!(10), "p"),
            NewMovement::maintenance_fee(account(1), dec!(12)),
            NewMovement::yield_credit(account(1), dec!(0.42)),
            NewMovement::credit_purchase(CardId::from_i64(7), dec!(10), "cp"),
            NewMovement::invoice_payment(account(1), CardId::from_i64(7), dec!(10)),
        ];

        for movement in shapes {
            assert_eq!(movement.shape_violation(), None, "{:?}", movement.kind);
        }
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let zero = NewMovement::deposit(account(1), Decimal::ZERO, "d");
        assert!(zero.shape_violation().is_some());

        let negative = NewMovement::deposit(account(1), dec!(-1), "d");
        assert!(negative.shape_violation().is_some());
    }

    #[test]
    fn test_wrong_references_rejected() {
        let mut movement = NewMovement::deposit(account(1), dec!(10), "d");
        movement.origin = Some(account(2));
        assert!(movement.shape_violation().is_some());

        let mut movement = NewMovement::credit_purchase(CardId::from_i64(1), dec!(10), "cp");
        movement.destination = Some(account(1));
        assert!(movement.shape_violation().is_some());
    }

    #[test]
    fn test_self_transfer_rejected() {
        let movement = NewMovement::transfer(account(1), account(1), dec!(10), "t");
        assert!(movement.shape_violation().is_some());
    }

    #[test]
    fn test_signed_effect() {
        let movement = Movement {
            id: MovementId::from_i64(1),
            kind: MovementKind::Transfer,
            amount: dec!(200),
            occurred_at: Utc::now(),
            origin: Some(account(1)),
            destination: Some(account(2)),
            card: None,
            description: "t".to_string(),
        };

        assert_eq!(movement.signed_effect_on(account(1)), dec!(-200));
        assert_eq!(movement.signed_effect_on(account(2)), dec!(200));
        assert_eq!(movement.signed_effect_on(account(3)), dec!(0));
        assert!(movement.touches(account(1)));
        assert!(movement.touches(account(2)));
        assert!(!movement.touches(account(3)));
    }
}
