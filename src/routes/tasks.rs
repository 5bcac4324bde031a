use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{TaskInput, TaskQuery, TaskUpdate},
    repository::TaskRepository,
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Retrieves the authenticated user's tasks, newest first.
///
/// ## Query Parameters:
/// - `completed` (optional): `true` or `false` to filter by completion state.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<dyn TaskRepository>,
    query: web::Query<TaskQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = tasks.list(user.id, query.completed).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Request Body:
/// - `title`: 1 to 200 characters.
/// - `description` (optional): up to 1000 characters.
///
/// ## Responses:
/// - `201 Created`: the new `Task`, with `completed` set to `false`.
/// - `422 Unprocessable Entity`: validation failed.
#[post("")]
pub async fn create_task(
    tasks: web::Data<dyn TaskRepository>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = tasks.create(user.id, task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a specific task by its ID.
///
/// Tasks owned by other users are reported as `404 Not Found`.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<dyn TaskRepository>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    match tasks.find(user.id, task_id.into_inner()).await? {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(not_found()),
    }
}

/// Updates an existing task.
///
/// Only the fields present in the body (`title`, `description`,
/// `completed`) are changed.
#[put("/{id}")]
pub async fn update_task(
    tasks: web::Data<dyn TaskRepository>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    match tasks
        .update(user.id, task_id.into_inner(), task_data.into_inner())
        .await?
    {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(not_found()),
    }
}

/// Flips the `completed` flag of a task.
#[patch("/{id}/complete")]
pub async fn toggle_task(
    tasks: web::Data<dyn TaskRepository>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    match tasks.toggle_completed(user.id, task_id.into_inner()).await? {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(not_found()),
    }
}

/// Deletes a task by its ID.
///
/// ## Responses:
/// - `204 No Content`: on successful deletion.
/// - `404 Not Found`: the task does not exist or belongs to someone else.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<dyn TaskRepository>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    if !tasks.delete(user.id, task_id.into_inner()).await? {
        return Err(not_found());
    }

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthMiddleware, TokenService};
    use crate::config::AuthConfig;
    use crate::repository::InMemoryTaskRepository;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;
    use std::sync::Arc;

    fn bearer(tokens: &TokenService, user_id: i32) -> (&'static str, String) {
        let token = tokens.issue(user_id, "user@example.com").unwrap();
        ("Authorization", format!("Bearer {}", token))
    }

    #[actix_rt::test]
    async fn test_create_task_validation() {
        let tokens = TokenService::new(&AuthConfig::new("tasks-test-secret"));
        let repo: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
        let app = test::init_service(
            App::new().app_data(web::Data::from(repo)).service(
                web::scope("/api/tasks")
                    .wrap(AuthMiddleware::new(tokens.clone()))
                    .service(create_task),
            ),
        )
        .await;

        for payload in [
            json!({ "title": "" }),
            json!({ "title": "a".repeat(201) }),
            json!({ "title": "ok", "description": "b".repeat(1001) }),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/tasks")
                .insert_header(bearer(&tokens, 1))
                .set_json(&payload)
                .to_request();

            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", payload);
        }
    }

    #[actix_rt::test]
    async fn test_unknown_task_is_not_found() {
        let tokens = TokenService::new(&AuthConfig::new("tasks-test-secret"));
        let repo: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
        let app = test::init_service(
            App::new().app_data(web::Data::from(repo)).service(
                web::scope("/api/tasks")
                    .wrap(AuthMiddleware::new(tokens.clone()))
                    .service(get_task)
                    .service(delete_task),
            ),
        )
        .await;

        let uri = format!("/api/tasks/{}", Uuid::new_v4());

        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(&tokens, 1))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&tokens, 1))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_missing_token_is_rejected() {
        let tokens = TokenService::new(&AuthConfig::new("tasks-test-secret"));
        let repo: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
        let app = test::init_service(
            App::new().app_data(web::Data::from(repo)).service(
                web::scope("/api/tasks")
                    .wrap(AuthMiddleware::new(tokens))
                    .service(get_tasks),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/tasks").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
