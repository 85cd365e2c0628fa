//! Codepad server binary.
//!
//! Startup sequence:
//! 1. Load configuration (`CODEPAD_CONFIG` or `codepad-config.yaml`)
//! 2. Initialize structured logging
//! 3. Open the document store (`PostgreSQL` when configured, else memory)
//! 4. Serve the HTTP API until `Ctrl-C`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use codepad_core::CodepadConfig;
use codepad_core::config::LoggingConfig;
use codepad_db::{DocumentStore, MemoryStore, PgDocumentStore};
use codepad_server::{AppState, ServerConfig, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "codepad-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = std::env::var("CODEPAD_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = CodepadConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        config = %config_path.display(),
        host = config.server.host,
        port = config.server.port,
        "codepad-server starting"
    );

    // 3. Pick a backend and serve.
    let server_config = ServerConfig::from(&config.server);
    if config.database.url.is_some() {
        let store = PgDocumentStore::connect(&config.database)
            .await
            .context("connecting to PostgreSQL")?;
        info!("Using PostgreSQL document store");
        let result = serve(&server_config, store.clone()).await;
        store.close().await;
        result
    } else {
        let meetings = config.seed_meetings();
        info!(
            seeded_meetings = meetings.len(),
            "No database URL configured, using in-memory document store"
        );
        serve(&server_config, MemoryStore::seeded(meetings)).await
    }
}

async fn serve<S: DocumentStore>(config: &ServerConfig, store: S) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(Arc::new(store)));
    start_server(config, state).await?;
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
