pub mod error;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::UserResponse;

// Re-export necessary items
pub use error::AuthError;
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, hash_password_with_cost, verify_password, MAX_PASSWORD_BYTES};
pub use service::AuthService;
pub use token::{Claims, TokenService};

/// Represents the payload for a user login request.
///
/// Not validated: any credentials that do not match an account get the
/// same 401, whatever their shape.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address for the new account.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Password for the new account.
    /// Must be at least 6 characters long; the 72-byte ceiling is enforced
    /// by the hasher.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Response structure after successful authentication (login or registration).
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The JWT for subsequent `Authorization: Bearer` requests.
    pub token: String,
    pub user: UserResponse,
}
