//! Card PIN hashing with Argon2id.
//!
//! PINs are stored as salted Argon2id hashes in PHC string format and are
//! never compared in cleartext.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Errors that can occur during PIN operations.
#[derive(Debug, Error)]
pub enum PinError {
    /// Failed to hash PIN.
    #[error("failed to hash PIN: {0}")]
    HashError(String),

    /// Failed to verify PIN.
    #[error("failed to verify PIN: {0}")]
    VerifyError(String),

    /// Invalid PIN hash format.
    #[error("invalid PIN hash format")]
    InvalidHash,
}

/// Hashes a PIN using Argon2id.
///
/// Returns the hash as a PHC string.
///
/// # Errors
///
/// Returns `PinError::HashError` if hashing fails.
pub fn hash_pin(pin: &str) -> Result<String, PinError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(pin.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PinError::HashError(e.to_string()))
}

/// Verifies a PIN against a stored hash.
///
/// Returns `true` if the PIN matches, `false` otherwise.
///
/// # Errors
///
/// Returns `PinError::InvalidHash` if the hash format is invalid.
/// Returns `PinError::VerifyError` if verification fails unexpectedly.
pub fn verify_pin(pin: &str, hash: &str) -> Result<bool, PinError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PinError::InvalidHash)?;

    let argon2 = Argon2::default();

    match argon2.verify_password(pin.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PinError::VerifyError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_pin_phc_format() {
        let hash = hash_pin("4821").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, "4821");
    }

    #[test]
    fn test_verify_correct_pin() {
        let hash = hash_pin("4821").unwrap();
        assert!(verify_pin("4821", &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_pin() {
        let hash = hash_pin("4821").unwrap();
        assert!(!verify_pin("0000", &hash).unwrap());
    }

    #[test]
    fn test_same_pin_different_hashes() {
        let hash1 = hash_pin("4821").unwrap();
        let hash2 = hash_pin("4821").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(matches!(
            verify_pin("4821", "not-a-phc-string"),
            Err(PinError::InvalidHash)
        ));
    }
}
