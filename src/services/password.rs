// SPDX-License-Identifier: MIT

//! Password hashing (Argon2) and registration strength rules.
//!
//! Strength rules are an ordered short-circuit list: the first failing
//! check's message is returned, keyed under the `password` field.

use crate::error::AppError;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

/// Fixed PHC string verified when login hits an unknown email, so the
/// failure path costs the same as a real verification.
pub const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$gZiV/M1gPc22ElAH/Jh1Hw$CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

/// Hash a password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

/// Verify a password against a stored PHC string.
pub fn verify_password(password: &str, phc: &str) -> bool {
    PasswordHash::new(phc)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Validate password strength at registration, returning the first failing
/// rule's message. The order is fixed: match, length, uppercase, lowercase,
/// digit, special character.
pub fn validate_password(password: &str, confirm_password: &str) -> Result<(), &'static str> {
    if password != confirm_password {
        return Err("Password fields did not match.");
    }
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long.");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter.");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter.");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit.");
    }
    if !password.chars().any(is_special) {
        return Err("Password must contain at least one special character.");
    }
    Ok(())
}

/// A "special" character is anything outside the alphanumeric, underscore
/// and whitespace sets.
fn is_special(c: char) -> bool {
    !(c.is_alphanumeric() || c == '_' || c.is_whitespace())
}
