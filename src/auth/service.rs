//! Registration, login and identity lookup.
//!
//! `AuthService` is the boundary where storage and crypto failures are
//! translated into [`AuthError`]. Login failures are opaque:
//! an unknown email and a wrong password both come back as `Ok(None)`.

use actix_web::web;
use log::{error, info, warn};
use std::sync::Arc;

use super::error::AuthError;
use super::password::{ensure_within_limit, hash_password_with_cost, verify_password};
use super::token::{Claims, TokenService};
use crate::config::AuthConfig;
use crate::models::User;
use crate::repository::{RepoError, UserRepository};

const STORAGE_UNAVAILABLE: &str = "storage unavailable";

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, config: &AuthConfig) -> Self {
        Self {
            users,
            tokens: TokenService::new(config),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Creates an account for `email`.
    ///
    /// Fails with `EmailAlreadyRegistered` if the email exists, including
    /// when a concurrent registration wins the race at the unique index.
    /// `RegistrationFailed` carries a client-safe cause; the underlying
    /// error is only logged.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        match self.users.find_by_email(email).await {
            Ok(Some(_)) => {
                warn!("Registration rejected: email already registered");
                return Err(AuthError::EmailAlreadyRegistered);
            }
            Ok(None) => {}
            Err(e) => {
                error!("Registration lookup failed: {}", e);
                return Err(AuthError::RegistrationFailed(STORAGE_UNAVAILABLE.into()));
            }
        }

        let password_hash = match self.hash(password).await {
            Ok(hash) => hash,
            Err(e @ AuthError::PasswordTooLong { .. }) => return Err(e),
            Err(e) => {
                error!("Password hashing failed during registration: {}", e);
                return Err(AuthError::RegistrationFailed("password hashing failed".into()));
            }
        };

        match self.users.insert(email, &password_hash).await {
            Ok(user) => {
                info!("Registered user {}", user.id);
                Ok(user)
            }
            Err(RepoError::UniqueViolation(_)) => {
                warn!("Registration lost a race on the email unique index");
                Err(AuthError::EmailAlreadyRegistered)
            }
            Err(e) => {
                error!("Failed to insert user: {}", e);
                Err(AuthError::RegistrationFailed(STORAGE_UNAVAILABLE.into()))
            }
        }
    }

    /// Returns the user when `password` matches, `None` otherwise.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, AuthError> {
        let user = match self.users.find_by_email(email).await {
            Ok(Some(user)) => user,
            Ok(None) => return Ok(None),
            Err(e) => {
                error!("Login lookup failed: {}", e);
                return Err(AuthError::Storage(e.to_string()));
            }
        };

        match self.verify(password, &user.password_hash).await {
            Ok(true) => Ok(Some(user)),
            Ok(false) | Err(AuthError::PasswordTooLong { .. }) => Ok(None),
            Err(e) => {
                error!("Stored hash for user {} is unusable: {}", user.id, e);
                Ok(None)
            }
        }
    }

    // bcrypt is CPU-bound; keep it off the async workers.
    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        ensure_within_limit(password)?;
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        web::block(move || hash_password_with_cost(&password, cost))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        ensure_within_limit(password)?;
        let password = password.to_owned();
        let hash = hash.to_owned();
        web::block(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    pub async fn identify(&self, user_id: i32) -> Result<Option<User>, AuthError> {
        self.users.find_by_id(user_id).await.map_err(|e| {
            error!("User lookup failed: {}", e);
            AuthError::Storage(e.to_string())
        })
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        self.tokens.issue(user.id, &user.email)
    }

    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        self.tokens.verify(token)
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryUserRepository;
    use async_trait::async_trait;

    fn service_with(users: Arc<dyn UserRepository>) -> AuthService {
        let mut config = AuthConfig::new("service-test-secret");
        config.bcrypt_cost = 4;
        AuthService::new(users, &config)
    }

    fn service() -> AuthService {
        service_with(Arc::new(InMemoryUserRepository::new()))
    }

    #[tokio::test]
    async fn test_register_then_duplicate() {
        let auth = service();
        let user = auth.register("a@x.com", "secret123").await.unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_ne!(user.password_hash, "secret123");

        let err = auth.register("a@x.com", "other").await.unwrap_err();
        assert_eq!(err, AuthError::EmailAlreadyRegistered);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let auth = service();
        let user = auth.register("a@x.com", "secret123").await.unwrap();

        assert_eq!(auth.authenticate("a@x.com", "secret123").await.unwrap(), Some(user));
        assert_eq!(auth.authenticate("a@x.com", "wrong").await.unwrap(), None);
        assert_eq!(auth.authenticate("nouser@x.com", "anything").await.unwrap(), None);
        assert_eq!(
            auth.authenticate("a@x.com", &"x".repeat(100)).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_register_rejects_long_password() {
        let auth = service();
        let err = auth.register("long@x.com", &"x".repeat(73)).await.unwrap_err();

        assert_eq!(err, AuthError::PasswordTooLong { len: 73 });
        assert_eq!(auth.identify(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_identify_and_tokens() {
        let auth = service();
        let user = auth.register("a@x.com", "secret123").await.unwrap();

        assert_eq!(auth.identify(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(auth.identify(user.id + 1).await.unwrap(), None);

        let token = auth.issue_token(&user).unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(auth.verify_token("garbage"), None);
    }

    #[tokio::test]
    async fn test_password_check_does_not_stall_the_runtime() {
        let users = Arc::new(InMemoryUserRepository::new());
        let hash = crate::auth::hash_password_with_cost("secret123", 12).unwrap();
        users.insert("slow@x.com", &hash).await.unwrap();
        let auth = service_with(users);

        // Single-threaded runtime: if bcrypt ran inline, the first branch
        // would complete before the timer was ever polled.
        let timer_won = tokio::select! {
            biased;
            _ = auth.authenticate("slow@x.com", "secret123") => false,
            _ = tokio::time::sleep(std::time::Duration::from_millis(5)) => true,
        };
        assert!(timer_won);

        let user = auth.authenticate("slow@x.com", "secret123").await.unwrap();
        assert_eq!(user.map(|u| u.email), Some("slow@x.com".to_string()));
    }

    /// Finds nothing on lookup, then reports a duplicate on insert, as a
    /// concurrent registration would.
    struct RacingRepository;

    #[async_trait]
    impl UserRepository for RacingRepository {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, RepoError> {
            Ok(None)
        }

        async fn find_by_id(&self, _id: i32) -> Result<Option<User>, RepoError> {
            Ok(None)
        }

        async fn insert(&self, _email: &str, _hash: &str) -> Result<User, RepoError> {
            Err(RepoError::UniqueViolation("users_email_key".into()))
        }
    }

    struct BrokenRepository;

    #[async_trait]
    impl UserRepository for BrokenRepository {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, RepoError> {
            Err(RepoError::Database("connection refused".into()))
        }

        async fn find_by_id(&self, _id: i32) -> Result<Option<User>, RepoError> {
            Err(RepoError::Database("connection refused".into()))
        }

        async fn insert(&self, _email: &str, _hash: &str) -> Result<User, RepoError> {
            Err(RepoError::Database("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_lost_race_maps_to_email_already_registered() {
        let auth = service_with(Arc::new(RacingRepository));
        let err = auth.register("a@x.com", "secret123").await.unwrap_err();
        assert_eq!(err, AuthError::EmailAlreadyRegistered);
    }

    #[tokio::test]
    async fn test_storage_failures_are_translated() {
        let auth = service_with(Arc::new(BrokenRepository));

        match auth.register("a@x.com", "secret123").await {
            Err(AuthError::RegistrationFailed(cause)) => assert_eq!(cause, "storage unavailable"),
            other => panic!("expected RegistrationFailed, got {:?}", other),
        }
        assert!(matches!(
            auth.authenticate("a@x.com", "secret123").await,
            Err(AuthError::Storage(_))
        ));
        assert!(matches!(auth.identify(1).await, Err(AuthError::Storage(_))));
    }

    #[tokio::test]
    async fn test_concurrent_registrations_create_one_user() {
        let auth = Arc::new(service());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let auth = Arc::clone(&auth);
                tokio::spawn(async move { auth.register("race@x.com", "secret123").await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) => assert_eq!(e, AuthError::EmailAlreadyRegistered),
            }
        }
        assert_eq!(created, 1);
    }
}
