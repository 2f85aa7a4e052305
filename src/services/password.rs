//! Password hashing module
//!
//! Secure password hashing and verification using Argon2id with the
//! crate's default parameters and a random per-hash salt.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2id with secure defaults.
///
/// Returns the hash as a PHC string (algorithm, parameters, salt, hash).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored hash.
///
/// Returns `true` if the password matches, `false` otherwise. Errors only
/// on a malformed hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))
        .context("Failed to parse password hash")?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e))
            .context("Password verification error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_produces_argon2id_hash() {
        let hash = hash_password("test_password_123").expect("Failed to hash password");
        assert!(hash.starts_with("$argon2id$"), "Hash should use Argon2id");
    }

    #[test]
    fn test_hash_password_produces_different_hashes() {
        let password = "same_password";
        let hash1 = hash_password(password).expect("Failed to hash password");
        let hash2 = hash_password(password).expect("Failed to hash password");
        assert_ne!(hash1, hash2, "Random salt should vary the hash");
    }

    #[test]
    fn test_verify_password_correct() {
        let password = "correct_password";
        let hash = hash_password(password).expect("Failed to hash password");
        assert!(verify_password(password, &hash).expect("Verification should not error"));
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("correct_password").expect("Failed to hash password");
        assert!(!verify_password("wrong_password", &hash).expect("Verification should not error"));
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "invalid_hash_format").is_err());
    }

    #[test]
    fn test_hash_password_unicode() {
        let password = "pässwörd🔐";
        let hash = hash_password(password).expect("Failed to hash unicode password");
        assert!(verify_password(password, &hash).expect("Verification should not error"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// For any password: the stored hash differs from the plaintext,
        /// the correct password verifies, and a mutated password does not.
        #[test]
        fn password_secure_storage(password in "[a-zA-Z0-9!@#$%^&*()_+-=]{1,50}") {
            let hash = hash_password(&password).expect("Password hashing should succeed");

            prop_assert_ne!(&hash, &password);
            prop_assert!(hash.starts_with("$argon2id$"));

            let verify_result = verify_password(&password, &hash)
                .expect("Password verification should not error");
            prop_assert!(verify_result);

            let wrong_password = format!("{}wrong", password);
            let wrong_verify_result = verify_password(&wrong_password, &hash)
                .expect("Password verification should not error");
            prop_assert!(!wrong_verify_result);
        }
    }
}
