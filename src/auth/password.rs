// Password hashing and verification service

use crate::auth::error::AuthError;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

/// Password service for hashing and verification
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using Argon2id with a fresh random salt.
    ///
    /// Hashing the same plaintext twice yields different PHC strings.
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHashError)
    }

    /// Verify a password against a stored PHC hash string.
    ///
    /// Returns false for a malformed hash instead of erroring; a corrupt
    /// stored hash must read as a failed login, not a 500.
    pub fn verify_password(password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = PasswordService::hash_password("passw0rd").unwrap();
        assert!(PasswordService::verify_password("passw0rd", &hash));
        assert!(!PasswordService::verify_password("wrongpass1", &hash));
    }

    #[test]
    fn identical_passwords_get_distinct_hashes() {
        let first = PasswordService::hash_password("passw0rd").unwrap();
        let second = PasswordService::hash_password("passw0rd").unwrap();
        assert_ne!(first, second, "each hash must use a fresh salt");
    }

    #[test]
    fn hash_is_not_the_plaintext() {
        let hash = PasswordService::hash_password("passw0rd").unwrap();
        assert!(!hash.contains("passw0rd"));
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn malformed_hashes_verify_false_instead_of_erroring() {
        assert!(!PasswordService::verify_password("passw0rd", ""));
        assert!(!PasswordService::verify_password("passw0rd", "not-a-phc-string"));
        assert!(!PasswordService::verify_password("passw0rd", "$argon2id$broken"));
    }
}
