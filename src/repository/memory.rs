use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RepoError, TaskRepository, UserRepository};
use crate::models::{Task, TaskInput, TaskUpdate, User};

#[derive(Default)]
struct UserTable {
    next_id: i32,
    rows: Vec<User>,
}

/// Process-local user store.
///
/// The uniqueness check and the insert happen under one write lock, so two
/// concurrent registrations for the same email cannot both succeed.
#[derive(Default)]
pub struct InMemoryUserRepository {
    table: RwLock<UserTable>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepoError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, email: &str, password_hash: &str) -> Result<User, RepoError> {
        let mut table = self.table.write().await;
        if table.rows.iter().any(|u| u.email == email) {
            return Err(RepoError::UniqueViolation(format!(
                "email '{}' already exists",
                email
            )));
        }

        table.next_id += 1;
        let user = User {
            id: table.next_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        table.rows.push(user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list(&self, user_id: i32, completed: Option<bool>) -> Result<Vec<Task>, RepoError> {
        let tasks = self.tasks.read().await;
        let mut owned: Vec<Task> = tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .filter(|t| completed.map_or(true, |c| t.completed == c))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn create(&self, user_id: i32, input: TaskInput) -> Result<Task, RepoError> {
        let task = Task::new(input, user_id);
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find(&self, user_id: i32, id: Uuid) -> Result<Option<Task>, RepoError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).filter(|t| t.user_id == user_id).cloned())
    }

    async fn update(
        &self,
        user_id: i32,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Option<Task>, RepoError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id) {
            Some(task) if task.user_id == user_id => {
                task.apply(update);
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn toggle_completed(&self, user_id: i32, id: Uuid) -> Result<Option<Task>, RepoError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id) {
            Some(task) if task.user_id == user_id => {
                let completed = !task.completed;
                task.apply(TaskUpdate {
                    completed: Some(completed),
                    ..Default::default()
                });
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, user_id: i32, id: Uuid) -> Result<bool, RepoError> {
        let mut tasks = self.tasks.write().await;
        let owned = tasks.get(&id).map_or(false, |t| t.user_id == user_id);
        if owned {
            tasks.remove(&id);
        }
        Ok(owned)
    }
}
