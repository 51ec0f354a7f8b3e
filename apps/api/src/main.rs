mod config;
mod errors;
mod llm_client;
mod models;
mod optimize;
mod routes;
mod state;

use anyhow::Result;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::optimize::content::LlmContentGenerator;
use crate::optimize::gap_bullets::LlmGapBulletSource;
use crate::optimize::options::LlmOptionSource;
use crate::optimize::scoring::LlmMatchScorer;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client — the single entry point for all oracle calls
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Build app state with the LLM-backed oracle adapters
    let state = AppState {
        config: config.clone(),
        scorer: Arc::new(LlmMatchScorer(llm.clone())),
        content: Arc::new(LlmContentGenerator(llm.clone())),
        gap_bullets: Arc::new(LlmGapBulletSource(llm.clone())),
        option_source: Arc::new(LlmOptionSource(llm)),
        sessions: Arc::new(RwLock::new(HashMap::new())),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
