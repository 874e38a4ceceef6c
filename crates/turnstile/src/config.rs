//! Configuration management for Turnstile.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::Path;

use turnkey_common::constants::{
    DEFAULT_LISTEN_ADDR, DEFAULT_REDIS_URL, DEFAULT_TTL_SECS, MAX_TTL_SECS,
};

/// Which store backend holds the code records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map, lost on restart
    Memory,
    /// Redis-backed durable store
    Redis,
}

/// Application configuration
///
/// Read once at startup and treated as immutable for the process lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Shared secret for admin endpoints. Empty means admin operations
    /// always fail (closed), never that they are open.
    #[serde(default)]
    pub admin_api_key: String,

    /// TTL applied when a registration supplies none
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// Upper bound on caller-supplied TTLs
    #[serde(default = "default_max_ttl_secs")]
    pub max_ttl_secs: u64,

    /// Allow a code to be redeemed more than once
    #[serde(default)]
    pub allow_reuse: bool,

    /// Store backend selection
    #[serde(default = "default_storage")]
    pub storage: StorageBackend,

    /// Redis connection URL (redis backend only)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Interval between background purge sweeps, 0 disables the sweeper
    #[serde(default)]
    pub purge_interval_secs: u64,
}

// Default value functions
fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}
fn default_redis_url() -> String {
    DEFAULT_REDIS_URL.to_string()
}
fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}
fn default_max_ttl_secs() -> u64 {
    MAX_TTL_SECS
}
fn default_storage() -> StorageBackend {
    StorageBackend::Memory
}

impl AppConfig {
    /// Load configuration from file, with CLI/env overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            tracing::warn!("Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(ref admin_key) = args.admin_key {
            config.admin_api_key = admin_key.clone();
        }
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(ref redis_url) = args.redis_url {
            config.redis_url = redis_url.clone();
        }
        if let Some(storage) = args.storage {
            config.storage = storage;
        }
        if let Some(default_ttl) = args.default_ttl {
            config.default_ttl_secs = default_ttl;
        }
        if let Some(allow_reuse) = args.allow_reuse {
            config.allow_reuse = allow_reuse;
        }

        if config.default_ttl_secs == 0 || config.default_ttl_secs > config.max_ttl_secs {
            anyhow::bail!(
                "default_ttl_secs must be within 1..={}",
                config.max_ttl_secs
            );
        }

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            admin_api_key: String::new(),
            default_ttl_secs: default_ttl_secs(),
            max_ttl_secs: default_max_ttl_secs(),
            allow_reuse: false,
            storage: default_storage(),
            redis_url: default_redis_url(),
            purge_interval_secs: 0,
        }
    }
}
