//! Application state and shared resources.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::{AppConfig, StorageBackend};
use crate::store::{CodeStore, MemoryStore, RedisStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Code lifecycle store (backend selected at startup)
    pub store: Arc<dyn CodeStore>,
}

impl AppState {
    /// Create new application state, connecting the selected store backend
    pub async fn new(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn CodeStore> = match config.storage {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::Redis => Arc::new(
                RedisStore::connect(&config.redis_url)
                    .await
                    .context("Failed to connect to Redis")?,
            ),
        };

        Ok(Self { config, store })
    }
}
