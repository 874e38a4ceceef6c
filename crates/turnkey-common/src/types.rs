//! Core types shared across Turnkey components.

use serde::{Deserialize, Serialize};

/// A registered verification code and its redemption state.
///
/// Records are owned exclusively by the store; the `code` string is the
/// unique key and a later registration under the same code replaces the
/// whole record (last-write-wins, no merge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeRecord {
    /// Caller-supplied opaque code string (unique key)
    pub code: String,

    /// Absolute expiry timestamp (Unix epoch seconds, UTC), fixed at creation
    pub expires_at: i64,

    /// Set on first successful redemption, never cleared
    pub used: bool,

    /// Opaque caller-supplied payload, returned verbatim on redemption
    #[serde(default = "empty_metadata")]
    pub metadata: serde_json::Value,
}

fn empty_metadata() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl CodeRecord {
    /// Create a fresh unused record expiring `ttl_secs` from now.
    pub fn new(code: String, ttl_secs: u64, metadata: serde_json::Value) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            code,
            expires_at: now + ttl_secs as i64,
            used: false,
            metadata,
        }
    }

    /// Expiry test. A record whose `expires_at` equals `now` is still valid;
    /// only a strictly-past expiry counts as dead.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at < now
    }

    /// A dead record can never be redeemed again and is eligible for purge.
    pub fn is_dead(&self, now: i64) -> bool {
        self.is_expired(now) || self.used
    }
}
