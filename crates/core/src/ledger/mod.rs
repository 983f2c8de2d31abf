//! The account ledger and transaction engine.
//!
//! This module implements the core ledger functionality:
//! - Movement domain types and reference-shape validation
//! - The ledger service applying balance-mutating operations
//! - Savings yield computation
//! - Error types for ledger operations

pub mod error;
pub mod interest;
pub mod movement;
pub mod service;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use movement::{Movement, MovementKind, NewMovement};
pub use service::LedgerService;
