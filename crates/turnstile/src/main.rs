//! # Turnstile - Turnkey Verification Code Service
//!
//! Issues single-use, time-limited verification codes and validates them
//! exactly once. Admins register codes over a shared-secret header; clients
//! redeem them at most once (configurable reuse) before expiry.
//!
//! ## Architecture
//! ```text
//! Client → Turnstile → CodeStore (memory | Redis)
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod auth;
mod config;
mod routes;
mod state;
mod store;

use config::{AppConfig, StorageBackend};
use state::AppState;
use store::purge_worker;

/// Turnkey Turnstile - verification code service
#[derive(Parser, Debug)]
#[command(name = "turnstile")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/turnstile.toml")]
    config: String,

    /// Admin shared secret (overrides config)
    #[arg(long, env = "ADMIN_API_KEY")]
    admin_key: Option<String>,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Store backend: memory or redis (overrides config)
    #[arg(long, value_enum, env = "STORAGE_BACKEND")]
    storage: Option<StorageBackend>,

    /// Redis URL (overrides config)
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Default code TTL in seconds (overrides config)
    #[arg(long, env = "DEFAULT_TTL_SECONDS")]
    default_ttl: Option<u64>,

    /// Allow codes to be redeemed more than once (overrides config)
    #[arg(long, env = "ALLOW_REUSE")]
    allow_reuse: Option<bool>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    info!("Starting Turnstile v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::load(&args.config, &args)?;
    info!("Configuration loaded from {}", args.config);

    if config.admin_api_key.is_empty() {
        tracing::warn!("No admin API key configured; admin endpoints will reject every request");
    }

    // Create shutdown broadcast channel
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    // Initialize application state (connects the store backend)
    let state = AppState::new(config.clone()).await?;
    info!(storage = ?config.storage, "Code store ready");

    // Spawn background purge worker when configured
    if config.purge_interval_secs > 0 {
        let store = state.store.clone();
        let purge_shutdown = shutdown_tx.subscribe();
        let interval = config.purge_interval_secs;
        tokio::spawn(async move {
            purge_worker(store, interval, purge_shutdown).await;
        });
    }

    // Build router
    let app = routes::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Turnstile listening on {}", config.listen_addr);

    // Handle graceful shutdown
    let shutdown_signal = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    info!("Turnstile shutdown complete");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }

    Ok(())
}
