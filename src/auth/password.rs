//! Credential hashing. Only the PHC string leaves this module; plaintext is
//! never stored or logged.

use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::rngs::OsRng;

use crate::error::AppError;

fn hasher() -> Argon2<'static> {
    // Argon2id v19 with the crate's default cost parameters.
    Argon2::default()
}

/// Salted Argon2id hash in PHC string form.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(AppError::PasswordHash)?;
    Ok(hash.to_string())
}

/// `Ok(false)` for a wrong password. A stored hash that is not a PHC string
/// is an error.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored).map_err(AppError::PasswordHash)?;
    match hasher().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::PasswordHash(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_hash_is_phc_argon2id() {
        let hash = hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2id$"), "{hash}");
        assert!(!hash.contains("password123"));
        assert!(verify_password("password123", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let a = hash_password("password123").unwrap();
        let b = hash_password("password123").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("password123", &b).unwrap());
    }

    #[test]
    fn wrong_password_is_a_mismatch_not_an_error() {
        let hash = hash_password("correct-horse-battery-staple").unwrap();
        assert!(!verify_password("Correct-horse-battery-staple", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn unreadable_stored_hash_is_an_error() {
        for stored in ["not-a-valid-hash", "", "argon2id$v=19"] {
            let err = verify_password("anything", stored).unwrap_err();
            assert!(matches!(err, AppError::PasswordHash(_)), "{stored:?}");
        }
    }
}
