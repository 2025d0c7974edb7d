//! Memo server
//!
//! Serves a revision store over REST, backed by SQLite or kept in memory.

use std::sync::Arc;

use markdown_memo::config::Config;
use markdown_memo::{create_router, init_tracing, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_tracing(&config.log_level);

    tracing::info!("Starting memo server");
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (MEMO_API_PSK). Authentication is disabled!");
    }

    let backend = config.open_backend().await?;

    let state = AppState {
        backend,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
