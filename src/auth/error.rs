//! Errors raised by the password hasher, token service and `AuthService`.
//!
//! Lower-level failures (bcrypt, jsonwebtoken, storage) are translated into
//! these variants at the `AuthService` boundary. Failed logins and rejected
//! tokens are not errors at all: they surface as `None`.

use std::fmt;

use super::password::MAX_PASSWORD_BYTES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The password exceeds the bcrypt input limit. Reported before hashing.
    PasswordTooLong { len: usize },
    /// Another account already uses this email.
    EmailAlreadyRegistered,
    /// Hashing or storage failed while creating an account.
    RegistrationFailed(String),
    /// bcrypt failed outside of registration (e.g. a malformed stored hash).
    Hashing(String),
    /// A token could not be signed.
    Token(String),
    /// The user store could not be reached or returned an error.
    Storage(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::PasswordTooLong { len } => write!(
                f,
                "Password is {} bytes long; at most {} bytes are allowed",
                len, MAX_PASSWORD_BYTES
            ),
            AuthError::EmailAlreadyRegistered => write!(f, "Email already registered"),
            AuthError::RegistrationFailed(cause) => write!(f, "Registration failed: {}", cause),
            AuthError::Hashing(msg) => write!(f, "Password hashing error: {}", msg),
            AuthError::Token(msg) => write!(f, "Token error: {}", msg),
            AuthError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}
