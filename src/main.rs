use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::EnvFilter;

use wasl::auth::TokenKeys;
use wasl::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wasl=info")),
        )
        .init();

    let config = Config::from_env()?;

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&config.database_url)
        .await?;
    wasl::db::migrate(&db_pool).await?;

    let state = AppState::new(db_pool, TokenKeys::new(config.token_secret.as_bytes()));
    let app = wasl::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
