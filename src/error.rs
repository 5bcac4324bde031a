//!
//! # Custom Error Handling
//!
//! `AppError` is what route handlers return. It implements
//! `actix_web::error::ResponseError`, turning every failure into a status
//! code and a `{"error": "..."}` JSON body.
//!
//! Domain errors (`AuthError`, `RepoError`) and `validator::ValidationErrors`
//! convert into it through `From`, so handlers can use `?` throughout.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use log::error;
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::repository::RepoError;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or is missing (HTTP 401).
    Unauthorized(String),
    /// Malformed or conflicting request (HTTP 400).
    BadRequest(String),
    /// Requested resource was not found (HTTP 404).
    NotFound(String),
    /// Unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Storage failure (HTTP 500). The detail is logged, never sent to the client.
    DatabaseError(String),
    /// Input failed validation (HTTP 422 Unprocessable Entity).
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::DatabaseError(detail) => {
                error!("Database error: {}", detail);
                "Database error"
            }
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::InternalServerError(msg)
            | AppError::ValidationError(msg) => msg.as_str(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
///
/// Only field names and rule codes make it into the message; the rejected
/// values (passwords included) never do.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, failures)| {
                let codes: Vec<&str> = failures.iter().map(|f| f.code.as_ref()).collect();
                format!("{}: {}", field, codes.join(", "))
            })
            .collect();
        fields.sort();
        AppError::ValidationError(format!("Invalid input ({})", fields.join("; ")))
    }
}

impl From<RepoError> for AppError {
    fn from(error: RepoError) -> AppError {
        match error {
            RepoError::UniqueViolation(msg) => AppError::BadRequest(msg),
            RepoError::Database(msg) => AppError::DatabaseError(msg),
        }
    }
}

/// Registration errors keep their reason; everything else is generic.
impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        match error {
            AuthError::PasswordTooLong { .. } => AppError::ValidationError(error.to_string()),
            AuthError::EmailAlreadyRegistered => AppError::BadRequest(error.to_string()),
            AuthError::RegistrationFailed(_) => AppError::InternalServerError(error.to_string()),
            AuthError::Hashing(_) | AuthError::Token(_) => {
                error!("{}", error);
                AppError::InternalServerError("Authentication error".into())
            }
            AuthError::Storage(msg) => AppError::DatabaseError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_responses() {
        let cases = [
            (AppError::Unauthorized("Invalid token".into()), StatusCode::UNAUTHORIZED),
            (AppError::BadRequest("Invalid input".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("Resource not found".into()), StatusCode::NOT_FOUND),
            (AppError::InternalServerError("Server error".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::DatabaseError("connection reset".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::ValidationError("title: length".into()), StatusCode::UNPROCESSABLE_ENTITY),
        ];

        for (error, status) in cases {
            assert_eq!(error.error_response().status(), status, "{}", error);
        }
    }

    #[test]
    fn test_auth_error_mapping() {
        let too_long: AppError = AuthError::PasswordTooLong { len: 80 }.into();
        assert_eq!(too_long.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let duplicate: AppError = AuthError::EmailAlreadyRegistered.into();
        assert_eq!(duplicate.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(duplicate.to_string(), "Bad Request: Email already registered");

        let failed: AppError = AuthError::RegistrationFailed("disk full".into()).into();
        assert_eq!(failed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(failed.to_string().contains("disk full"));

        let hashing: AppError = AuthError::Hashing("bad hash".into()).into();
        assert!(!hashing.to_string().contains("bad hash"));
    }

    #[test]
    fn test_validation_message_omits_submitted_values() {
        let request = crate::auth::RegisterRequest {
            email: "not-an-email".into(),
            password: "s3cr".into(),
        };
        let error: AppError = validator::Validate::validate(&request).unwrap_err().into();
        let message = error.to_string();

        assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(message.contains("email: email"), "{}", message);
        assert!(message.contains("password: length"), "{}", message);
        assert!(!message.contains("s3cr"), "{}", message);
        assert!(!message.contains("not-an-email"), "{}", message);
    }

    #[actix_rt::test]
    async fn test_database_detail_is_not_exposed() {
        let response = AppError::DatabaseError("password authentication failed".into())
            .error_response();
        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "Database error");
    }
}
