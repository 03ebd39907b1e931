pub mod account;
pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod error;
pub mod jwt;
pub mod mail;
pub mod password;
pub mod validation;

use account::AccountService;
use api::create_api_router;
use auth::{RoleResolver, TokenService};
use axum::Router;
use db::Database;
use error::ApiError;
use jwt::JwtConfig;
use mail::Mailer;
use std::sync::Arc;
use tokio::net::TcpListener;
use url::Url;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing access tokens
    pub access_secret: Vec<u8>,
    /// Secret for signing refresh tokens (must differ from the access secret)
    pub refresh_secret: Vec<u8>,
    /// Frontend base URL for links in emails
    pub frontend_url: Url,
    /// Outbound email
    pub mailer: Arc<dyn Mailer>,
}

/// Create the application router with the given configuration.
///
/// The role cache lives for the lifetime of the returned router; role
/// definitions must not be changed underneath a running app without
/// invalidating it.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(
        &config.access_secret,
        &config.refresh_secret,
    ));
    let tokens = Arc::new(TokenService::new(config.db.clone(), jwt));
    let resolver = Arc::new(RoleResolver::new(config.db.clone()));
    let account = Arc::new(AccountService::new(
        config.db.clone(),
        tokens.clone(),
        resolver.clone(),
        config.mailer.clone(),
        config.frontend_url.clone(),
    ));

    let api_router = create_api_router(config.db.clone(), account, tokens, resolver);

    Router::new()
        .nest("/api", api_router)
        .fallback(not_found)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Run cleanup tasks and spawn background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(db: &Database) {
    cleanup::run_cleanup(db).await;
    cleanup::spawn_cleanup_scheduler(db.clone());
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to run cleanup on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}
