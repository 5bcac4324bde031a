use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpResponse, HttpServer};
use log::{error, info};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;

use todo_api::auth::{AuthMiddleware, AuthService};
use todo_api::config::Config;
use todo_api::repository::{PgTaskRepository, PgUserRepository, TaskRepository, UserRepository};
use todo_api::routes;

fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    info!("Database ready");

    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
    let tasks: Arc<dyn TaskRepository> = Arc::new(PgTaskRepository::new(pool));
    let auth = web::Data::new(AuthService::new(users, &config.auth));
    let tasks = web::Data::from(tasks);
    let origins = config.cors_origins.clone();

    info!(
        "JWT algorithm {:?}, tokens valid for {} days",
        config.auth.jwt_algorithm, config.auth.jwt_expiry_days
    );
    info!("CORS origins: {:?}", origins);
    info!("Starting server at {}", config.server_url());

    HttpServer::new(move || {
        App::new()
            .app_data(auth.clone())
            .app_data(tasks.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({ "error": message })),
                )
                .into()
            }))
            .wrap(cors(&origins))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(auth.tokens().clone()))
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
