//! In-memory store backend.
//!
//! The default backend: a single map behind one mutex. Every operation
//! holds the lock for its whole critical section, which is what makes
//! check-and-consume atomic. No await happens while the lock is held.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use turnkey_common::{CodeRecord, ConsumeError};

use super::CodeStore;

/// Process-local code store, lost on restart
pub struct MemoryStore {
    codes: Mutex<HashMap<String, CodeRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            codes: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeStore for MemoryStore {
    async fn add(&self, code: &str, ttl_secs: u64, metadata: serde_json::Value) -> Result<i64> {
        let record = CodeRecord::new(code.to_string(), ttl_secs, metadata);
        let expires_at = record.expires_at;

        let mut codes = self.codes.lock().await;
        codes.insert(code.to_string(), record);

        tracing::debug!(code = %code, expires_at, "Code registered");

        Ok(expires_at)
    }

    async fn check_and_consume(
        &self,
        code: &str,
        allow_reuse: bool,
    ) -> Result<CodeRecord, ConsumeError> {
        let mut codes = self.codes.lock().await;

        let record = codes.get_mut(code).ok_or(ConsumeError::NotFound)?;

        let now = chrono::Utc::now().timestamp();
        if record.is_expired(now) {
            return Err(ConsumeError::Expired);
        }
        if record.used && !allow_reuse {
            return Err(ConsumeError::AlreadyUsed);
        }

        record.used = true;

        Ok(record.clone())
    }

    async fn purge(&self) -> Result<u64> {
        let now = chrono::Utc::now().timestamp();

        let mut codes = self.codes.lock().await;
        let before = codes.len();
        codes.retain(|_, record| !record.is_dead(now));

        Ok((before - codes.len()) as u64)
    }
}
