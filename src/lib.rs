#![doc = "The `todo_api` library crate."]
#![doc = ""]
#![doc = "Authentication (bcrypt password hashing, JWT issuance and verification),"]
#![doc = "per-user task storage, HTTP routes and error handling for the todo backend."]
#![doc = "The binary (`main.rs`) wires these into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;

pub use crate::auth::{AuthError, AuthService, Claims, TokenService};
pub use crate::error::AppError;
