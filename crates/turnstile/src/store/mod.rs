//! Code lifecycle store.
//!
//! The store is the exclusive custodian of code records: registration,
//! atomic check-and-consume, and purge of dead records. Two backends
//! implement the same contract and are interchangeable at startup.

mod memory;
mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use turnkey_common::{CodeRecord, ConsumeError};

/// Store contract shared by all backends.
///
/// Callers depend only on this trait, never on backend identity. Inputs are
/// pre-validated by the HTTP adapter: `code` is non-empty after trimming and
/// `ttl_secs` is within the configured bounds.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Register `code` with `expires_at = now + ttl_secs`, replacing any
    /// existing record under the same code. Returns the computed expiry
    /// (Unix epoch seconds).
    async fn add(&self, code: &str, ttl_secs: u64, metadata: serde_json::Value) -> Result<i64>;

    /// Redeem `code`. The lookup, expiry/used checks, and the `used`
    /// mutation happen as one indivisible unit: two concurrent redemptions
    /// of the same code must not both succeed when reuse is disallowed.
    ///
    /// On success the returned record carries the stored metadata and
    /// `used = true`. With `allow_reuse`, an already-used record redeems
    /// again and still returns its current metadata.
    async fn check_and_consume(
        &self,
        code: &str,
        allow_reuse: bool,
    ) -> Result<CodeRecord, ConsumeError>;

    /// Delete every record that is expired or used. Returns the number
    /// removed. Records added concurrently may or may not be seen by the
    /// scan; live unused unexpired records are never removed.
    async fn purge(&self) -> Result<u64>;
}

/// Background sweeper invoking [`CodeStore::purge`] on a fixed interval.
///
/// The `/purge` endpoint remains the explicit trigger; this worker is the
/// periodic scheduler for deployments that want one in-process.
pub async fn purge_worker(
    store: Arc<dyn CodeStore>,
    interval_secs: u64,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    tracing::info!(interval_secs, "Purge worker started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(interval_secs)) => {
                match store.purge().await {
                    Ok(removed) if removed > 0 => {
                        tracing::info!(removed, "Purged dead code records");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Purge sweep failed");
                    }
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Purge worker shutting down");
                break;
            }
        }
    }
}
