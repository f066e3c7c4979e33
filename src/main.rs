use anyhow::{Context, Result};
use polyglot::config::Config;
use polyglot::server::{router, AppState};
use polyglot::service::TranslationService;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("polyglot=info".parse()?),
        )
        .init();

    info!("Starting polyglot translation service");

    let config = Config::from_env()?;

    if config.hf_api_token.is_none() {
        warn!("HF_API_TOKEN not set, inference requests will be rate limited");
    }
    if config.api_key.is_none() {
        warn!("API_KEY not set, endpoints are open to anyone");
    }

    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let state = AppState {
        service: Arc::new(TranslationService::from_config(client, &config)),
        api_key: config.api_key.clone(),
    };
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
