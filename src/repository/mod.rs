//! Storage for users and tasks.
//!
//! Handlers and `AuthService` only see the `UserRepository` and
//! `TaskRepository` traits. `postgres` backs them with sqlx; `memory` keeps
//! everything in process and is what the test suite runs against.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use crate::models::{Task, TaskInput, TaskUpdate, User};

pub use memory::{InMemoryTaskRepository, InMemoryUserRepository};
pub use postgres::{PgTaskRepository, PgUserRepository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// An insert would duplicate a value in a unique column.
    UniqueViolation(String),
    /// Any other storage failure.
    Database(String),
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RepoError::UniqueViolation(msg) => write!(f, "Unique constraint violated: {}", msg),
            RepoError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for RepoError {}

impl From<sqlx::Error> for RepoError {
    fn from(error: sqlx::Error) -> RepoError {
        match &error {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepoError::UniqueViolation(db_err.message().to_string())
            }
            _ => RepoError::Database(error.to_string()),
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepoError>;

    /// Fails with `RepoError::UniqueViolation` when the email is taken.
    async fn insert(&self, email: &str, password_hash: &str) -> Result<User, RepoError>;
}

/// Task storage. Every operation is scoped to the owning user: a task that
/// exists but belongs to someone else behaves exactly like a missing one.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Tasks owned by `user_id`, newest first.
    async fn list(&self, user_id: i32, completed: Option<bool>) -> Result<Vec<Task>, RepoError>;

    async fn create(&self, user_id: i32, input: TaskInput) -> Result<Task, RepoError>;

    async fn find(&self, user_id: i32, id: Uuid) -> Result<Option<Task>, RepoError>;

    async fn update(
        &self,
        user_id: i32,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Option<Task>, RepoError>;

    async fn toggle_completed(&self, user_id: i32, id: Uuid) -> Result<Option<Task>, RepoError>;

    /// Returns whether a task was removed.
    async fn delete(&self, user_id: i32, id: Uuid) -> Result<bool, RepoError>;
}
