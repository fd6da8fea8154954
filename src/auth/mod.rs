//! Password hashing for records carrying a `password` field.
//!
//! Hashes are bcrypt with a configurable cost, so a stored value never equals
//! the plaintext and two hashes of the same password differ.

use serde_json::Value;
use thiserror::Error;

/// Column name that gets hashed before insert.
pub const PASSWORD_FIELD: &str = "password";

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Password verification failed: {0}")]
    Verify(String),
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    bcrypt::hash(password, cost).map_err(|e| PasswordError::Hash(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    bcrypt::verify(password, hash).map_err(|e| PasswordError::Verify(e.to_string()))
}

/// Text a scalar password would be stored as. Numbers and booleans are
/// accepted by character columns, so they count as plaintext too; null does not.
pub fn password_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

/// bcrypt is CPU bound; keep it off the async worker threads.
pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| PasswordError::Hash(e.to_string()))?
}
