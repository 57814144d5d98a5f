use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub rust_log: String,
    /// JSON question catalog file, read once on first use. Unset means the
    /// catalog compiled into the binary.
    pub question_catalog_path: Option<String>,
    /// Questions served by the shuffled endpoint when the caller gives no count.
    pub default_question_count: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            question_catalog_path: std::env::var("QUESTION_CATALOG_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty()),
            default_question_count: std::env::var("DEFAULT_QUESTION_COUNT")
                .unwrap_or_else(|_| "5".to_string())
                .parse::<usize>()
                .context("DEFAULT_QUESTION_COUNT must be a non-negative integer")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
