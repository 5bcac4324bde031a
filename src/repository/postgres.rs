use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{RepoError, TaskRepository, UserRepository};
use crate::models::{Task, TaskInput, TaskUpdate, User};

const USER_COLUMNS: &str = "id, email, password_hash, created_at";
const TASK_COLUMNS: &str = "id, title, description, completed, user_id, created_at, updated_at";

/// `UserRepository` over the `users` table. Each call checks a connection
/// out of the pool for one statement and returns it afterwards.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, email: &str, password_hash: &str) -> Result<User, RepoError> {
        // `users_email_key` turns a concurrent duplicate into a unique violation.
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}

#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn list(&self, user_id: i32, completed: Option<bool>) -> Result<Vec<Task>, RepoError> {
        let mut sql = format!("SELECT {} FROM tasks WHERE user_id = $1", TASK_COLUMNS);
        if completed.is_some() {
            sql.push_str(" AND completed = $2");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query_as::<_, Task>(&sql).bind(user_id);
        if let Some(completed) = completed {
            query = query.bind(completed);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn create(&self, user_id: i32, input: TaskInput) -> Result<Task, RepoError> {
        let task = Task::new(input, user_id);

        let created = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (id, title, description, completed, user_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(task.id)
        .bind(task.title)
        .bind(task.description)
        .bind(task.completed)
        .bind(task.user_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find(&self, user_id: i32, id: Uuid) -> Result<Option<Task>, RepoError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn update(
        &self,
        user_id: i32,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Option<Task>, RepoError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = COALESCE($1, title),
                 description = COALESCE($2, description),
                 completed = COALESCE($3, completed),
                 updated_at = NOW()
             WHERE id = $4 AND user_id = $5
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(update.title)
        .bind(update.description)
        .bind(update.completed)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn toggle_completed(&self, user_id: i32, id: Uuid) -> Result<Option<Task>, RepoError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET completed = NOT completed, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn delete(&self, user_id: i32, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
