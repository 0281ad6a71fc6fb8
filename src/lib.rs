pub mod auth;
pub mod client;
pub mod config;
pub mod conversations;
pub mod db;
pub mod error;
pub mod messages;
pub mod profiles;
pub mod store;

use axum::{Router, extract::FromRef};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

pub use config::Config;
pub use error::{AppError, AppResult};

use auth::TokenKeys;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, tokens: TokenKeys) -> Self {
        Self { db_pool, tokens }
    }
}

/// The full API surface under /api. The SPA is served separately, so CORS
/// stays permissive.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/conversations", conversations::router())
        .nest("/api/messages", messages::router())
        .nest("/api/profiles", profiles::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
