use bcrypt::{hash, verify, DEFAULT_COST};

use super::error::AuthError;

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hashes a password with the default bcrypt cost.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hashes a password into a self-describing `$2b$<cost>$...` string with a
/// fresh random salt.
///
/// Passwords longer than [`MAX_PASSWORD_BYTES`] are rejected instead of
/// truncated, so two passwords sharing a 72-byte prefix never collide.
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AuthError> {
    ensure_within_limit(password)?;
    hash(password, cost).map_err(|e| AuthError::Hashing(format!("Failed to hash password: {}", e)))
}

/// Checks a candidate password against a stored bcrypt hash.
///
/// The same length rule as hashing applies to the candidate.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AuthError> {
    ensure_within_limit(password)?;
    verify(password, hashed_password)
        .map_err(|e| AuthError::Hashing(format!("Failed to verify password: {}", e)))
}

pub(crate) fn ensure_within_limit(password: &str) -> Result<(), AuthError> {
    let len = password.len();
    if len > MAX_PASSWORD_BYTES {
        return Err(AuthError::PasswordTooLong { len });
    }
    Ok(())
}
