/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{CryptoError, Result};

/// Hash a password using Argon2id
///
/// ## Security
///
/// - Algorithm: Argon2id (default configuration)
/// - Salt: random per password
///
/// ## Returns
///
/// PHC-formatted hash string safe for database storage
pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(CryptoError::EmptyPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CryptoError::Hashing(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its hash
///
/// Returns `Ok(false)` on mismatch and an error only when the stored hash
/// cannot be parsed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| CryptoError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CryptoError::InvalidHash(e.to_string())),
    }
}

/// Whether a stored credential is already a PHC string (`$argon2id$...`)
pub fn is_phc_hash(value: &str) -> bool {
    value.starts_with('$') && PasswordHash::new(value).is_ok()
}

/// Recover the plaintext from the legacy storage format
///
/// Accounts imported from the old platform store `base64(reverse(password))`.
/// Returns `None` when the value is not valid base64 or not UTF-8.
pub fn decode_legacy_password(stored: &str) -> Option<String> {
    let bytes = STANDARD.decode(stored.trim()).ok()?;
    let reversed = String::from_utf8(bytes).ok()?;
    let password: String = reversed.chars().rev().collect();

    if password.is_empty() {
        None
    } else {
        Some(password)
    }
}
