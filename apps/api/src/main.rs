mod config;
mod db;
mod errors;
mod interview;
mod models;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::question_bank::QuestionBank;
use crate::interview::sessions::PgInterviewStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    let db = db::connect(&config).await?;

    // Load the question catalog off the async workers so no request pays for it
    let question_bank = Arc::new(match &config.question_catalog_path {
        Some(path) => QuestionBank::new(path),
        None => QuestionBank::bundled(),
    });
    let warming = Arc::clone(&question_bank);
    let question_count = tokio::task::spawn_blocking(move || warming.warm())
        .await
        .context("Question catalog load task panicked")?;
    if question_count == 0 {
        warn!("Question catalog is empty; question endpoints will return no results");
    }

    let state = AppState {
        config: config.clone(),
        question_bank,
        interviews: Arc::new(PgInterviewStore::new(db)),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web client once its host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
