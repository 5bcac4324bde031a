use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use crate::config::AuthConfig;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the user's id.
    pub sub: i32,
    /// Email of the user at the time the token was issued.
    pub email: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Issues and verifies signed bearer tokens with a shared secret.
///
/// Tokens are stateless: a token stays valid until `exp` and there is no
/// way to revoke it earlier.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    expiry: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm: config.jwt_algorithm,
            expiry: Duration::days(config.jwt_expiry_days),
        }
    }

    /// Signs a token for `user_id` that expires `expiry_days` from now.
    pub fn issue(&self, user_id: i32, email: &str) -> Result<String, AuthError> {
        self.issue_expiring_at(user_id, email, Utc::now() + self.expiry)
    }

    fn issue_expiring_at(
        &self,
        user_id: i32,
        email: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            exp: expires_at.timestamp().max(0) as usize,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| AuthError::Token(format!("Failed to generate token: {}", e)))
    }

    /// Verifies the signature, algorithm and expiry of a token.
    ///
    /// Every failure (malformed, tampered, wrong key, expired) yields `None`.
    /// A token is valid strictly before its `exp` second.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let claims = match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("Rejected bearer token: {}", e);
                return None;
            }
        };

        // jsonwebtoken still accepts exp == now.
        if claims.exp as i64 <= Utc::now().timestamp() {
            debug!("Rejected bearer token: expires at {}", claims.exp);
            return None;
        }
        Some(claims)
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }
}
