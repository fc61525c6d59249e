//! desa-cms - Admin dashboard for a village landing page

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use desa_cms::{
    api::{self, AppState},
    config::Config,
};

/// How often stale sign-in throttle records are pruned
const THROTTLE_CLEANUP_INTERVAL_SECS: u64 = 300;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "desa_cms=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting desa-cms...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");
    tracing::info!("Content backend: {}", config.backend.api_url);

    let state = AppState::from_config(&config)?;
    tracing::info!("Services initialized");

    // Start sign-in throttle cleanup task
    {
        let limiter = state.rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
                THROTTLE_CLEANUP_INTERVAL_SECS,
            ));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }

    let app = api::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
