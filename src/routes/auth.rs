use crate::{
    auth::{AuthResponse, AuthService, AuthenticatedUser, LoginRequest, RegisterRequest},
    error::AppError,
    models::UserResponse,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use log::info;
use validator::Validate;

/// Register a new user
///
/// Creates a new user account and returns an authentication token.
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = auth
        .register(&register_data.email, &register_data.password)
        .await?;
    let token = auth.issue_token(&user)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

/// Login user
///
/// Authenticates a user and returns an authentication token. Unknown emails
/// and wrong passwords get the same response.
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    match auth
        .authenticate(&login_data.email, &login_data.password)
        .await?
    {
        Some(user) => {
            let token = auth.issue_token(&user)?;
            info!("User {} logged in", user.id);
            Ok(HttpResponse::Ok().json(AuthResponse {
                token,
                user: UserResponse::from(&user),
            }))
        }
        None => Err(AppError::Unauthorized("Invalid credentials".into())),
    }
}

/// Current user
///
/// Returns the account behind the bearer token.
#[get("/me")]
pub async fn me(
    auth: web::Data<AuthService>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    match auth.identify(caller.id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(UserResponse::from(&user))),
        // Token outlived its account.
        None => Err(AppError::Unauthorized("Invalid or expired token".into())),
    }
}
