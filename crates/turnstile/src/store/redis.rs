//! Redis store backend.
//!
//! Records are stored as JSON strings under `code:{code}` with a key TTL
//! matching the record expiry, so Redis reclaims dead records on its own
//! even between purges. Check-and-consume runs as a single server-side Lua
//! script, which gives the same atomicity the in-memory backend gets from
//! its mutex.

use anyhow::{Context, Result};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use turnkey_common::constants::redis_keys::CODE_PREFIX;
use turnkey_common::{CodeRecord, ConsumeError};

use super::CodeStore;

/// Lookup, expiry/used checks, and the used-flag write in one atomic unit.
///
/// KEYS[1] = record key, ARGV[1] = now (epoch secs), ARGV[2] = allow_reuse.
/// Returns {status, record_json}: 0 ok, 1 not found, 2 expired, 3 used.
/// TTL + SET EX instead of KEEPTTL to stay compatible with Redis < 6.0.
const CONSUME_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
  return {1, ''}
end
local rec = cjson.decode(raw)
local now = tonumber(ARGV[1])
if rec.expires_at < now then
  return {2, ''}
end
if rec.used and ARGV[2] ~= '1' then
  return {3, ''}
end
rec.used = true
local out = cjson.encode(rec)
local ttl = redis.call('TTL', KEYS[1])
if ttl > 0 then
  redis.call('SET', KEYS[1], out, 'EX', ttl)
else
  redis.call('SET', KEYS[1], out)
end
return {0, out}
"#;

/// Durable code store backed by Redis
pub struct RedisStore {
    /// Redis connection manager (auto-reconnecting)
    redis: ConnectionManager,

    /// Pre-parsed check-and-consume script
    consume_script: redis::Script,
}

impl RedisStore {
    /// Connect to Redis and build the store
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let redis = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        Ok(Self {
            redis,
            consume_script: redis::Script::new(CONSUME_SCRIPT),
        })
    }

    fn record_key(code: &str) -> String {
        format!("{}{}", CODE_PREFIX, code)
    }
}

#[async_trait::async_trait]
impl CodeStore for RedisStore {
    async fn add(&self, code: &str, ttl_secs: u64, metadata: serde_json::Value) -> Result<i64> {
        let record = CodeRecord::new(code.to_string(), ttl_secs, metadata);
        let expires_at = record.expires_at;
        let value = serde_json::to_string(&record)?;

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(Self::record_key(code), &value, ttl_secs)
            .await
            .context("Failed to store code record")?;

        tracing::debug!(code = %code, expires_at, "Code registered");

        Ok(expires_at)
    }

    async fn check_and_consume(
        &self,
        code: &str,
        allow_reuse: bool,
    ) -> Result<CodeRecord, ConsumeError> {
        let now = chrono::Utc::now().timestamp();

        let mut conn = self.redis.clone();
        let (status, raw): (i64, String) = self
            .consume_script
            .key(Self::record_key(code))
            .arg(now)
            .arg(if allow_reuse { "1" } else { "0" })
            .invoke_async(&mut conn)
            .await
            .map_err(|e| ConsumeError::Storage(e.to_string()))?;

        match status {
            0 => serde_json::from_str(&raw).map_err(|e| ConsumeError::Storage(e.to_string())),
            1 => Err(ConsumeError::NotFound),
            2 => Err(ConsumeError::Expired),
            3 => Err(ConsumeError::AlreadyUsed),
            other => Err(ConsumeError::Storage(format!(
                "unexpected consume status {other}"
            ))),
        }
    }

    async fn purge(&self) -> Result<u64> {
        let now = chrono::Utc::now().timestamp();
        let pattern = format!("{}*", CODE_PREFIX);

        // Collect first: the scan iterator holds the connection
        let mut scan_conn = self.redis.clone();
        let mut keys = Vec::new();
        {
            let mut iter = scan_conn
                .scan_match::<_, String>(&pattern)
                .await
                .context("Failed to scan code records")?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        let mut conn = self.redis.clone();
        let mut removed: u64 = 0;
        for key in keys {
            let raw: Option<String> = conn
                .get(&key)
                .await
                .context("Failed to read code record")?;

            // Already expired out of Redis between scan and read
            let Some(raw) = raw else { continue };

            let record: CodeRecord = match serde_json::from_str(&raw) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping unparseable code record");
                    continue;
                }
            };

            if record.is_dead(now) {
                let deleted: u64 = conn
                    .del(&key)
                    .await
                    .context("Failed to delete code record")?;
                removed += deleted;
            }
        }

        Ok(removed)
    }
}
