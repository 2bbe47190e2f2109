use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use std::sync::OnceLock;

use crate::error::{Error, Result};

pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2.hash_password(plain.as_bytes(), &salt)?.to_string();
    Ok(password_hash)
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hashed)?;
    let ok = Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok();
    Ok(ok)
}

/// Argon2 is deliberately slow; keep it off the async worker threads.
pub async fn hash_password_blocking(plain: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| Error::Internal(format!("password hashing task failed: {}", e)))?
}

/// Hash of a random secret nobody knows, built once per process.
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

fn dummy_hash() -> Result<&'static str> {
    if let Some(hash) = DUMMY_HASH.get() {
        return Ok(hash.as_str());
    }
    let secret: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let hash = hash_password(&secret)?;
    Ok(DUMMY_HASH.get_or_init(|| hash).as_str())
}

/// Spends one Argon2 verification when there is no stored hash to check
/// against, so an unknown username costs as much as a wrong password.
/// Always `false`.
pub fn verify_dummy_password(plain: &str) -> Result<bool> {
    verify_password(plain, dummy_hash()?)?;
    Ok(false)
}

pub async fn verify_dummy_password_blocking(plain: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_dummy_password(&plain))
        .await
        .map_err(|e| Error::Internal(format!("password verification task failed: {}", e)))?
}

pub async fn verify_password_blocking(plain: String, hashed: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hashed))
        .await
        .map_err(|e| Error::Internal(format!("password verification task failed: {}", e)))?
}
