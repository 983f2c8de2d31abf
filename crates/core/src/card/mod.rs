//! Card issuing and purchase authorization.
//!
//! This module implements the card side of the bank:
//! - Card domain types (debit and credit kinds)
//! - PIN hashing and verification
//! - Purchase authorization, invoice payment, and card management
//! - Error types for card operations

pub mod error;
pub mod pin;
pub mod service;
pub mod types;

pub use error::CardError;
pub use service::CardService;
pub use types::{Card, CardKind, CardRequest, IssuedCard, NewCard};
