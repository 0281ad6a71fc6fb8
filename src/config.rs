use anyhow::Context;

/// Server configuration, read once at startup from the environment
/// (a `.env` file is honored if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub token_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
            bind_addr: std::env::var("WASL_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            token_secret: std::env::var("WASL_TOKEN_SECRET")
                .context("WASL_TOKEN_SECRET is not set")?,
        })
    }
}
