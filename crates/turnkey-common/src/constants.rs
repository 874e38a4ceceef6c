//! Shared constants for Turnkey components.

/// Default Redis connection URL
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Default Turnstile HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Default code validity when the caller supplies no TTL (15 minutes)
pub const DEFAULT_TTL_SECS: u64 = 900;

/// Upper bound on caller-supplied TTLs (24 hours)
pub const MAX_TTL_SECS: u64 = 86_400;

/// Redis key prefixes
pub mod redis_keys {
    /// Code record: code:{code}
    pub const CODE_PREFIX: &str = "code:";
}

/// HTTP header names
pub mod headers {
    /// Admin shared-secret header
    pub const X_API_KEY: &str = "X-API-KEY";
}
