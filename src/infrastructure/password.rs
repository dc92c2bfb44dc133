//! Password hashing with Argon2id and bcrypt migration support
//!
//! New passwords are hashed with Argon2id; bcrypt hashes from the previous
//! credential system still verify so accounts migrate transparently on
//! their next successful login.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::domain::error::{Error, Result};

/// Hash a password using Argon2id.
///
/// Returns the PHC string format hash that includes algorithm parameters.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::password_hash(e.to_string()))
}

/// Verify a password against a stored hash, auto-detecting the algorithm.
///
/// Supports Argon2id (PHC format, `$argon2...`) and bcrypt (`$2a$`/`$2b$`/
/// `$2y$`). An empty stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    if hash.is_empty() {
        return Ok(false);
    }

    if hash.starts_with("$argon2") {
        let parsed = PasswordHash::new(hash).map_err(|e| Error::password_hash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    } else if hash.starts_with("$2") {
        bcrypt::verify(password, hash).map_err(|e| Error::password_hash(e.to_string()))
    } else {
        Err(Error::password_hash("unknown password hash format"))
    }
}

/// Check whether a stored hash should be re-hashed with Argon2id.
///
/// Call after a successful verification; bcrypt hashes are upgraded by
/// re-hashing the plaintext the user just presented.
pub fn needs_rehash(hash: &str) -> bool {
    hash.starts_with("$2")
}
