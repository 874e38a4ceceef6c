//! Admin shared-secret gate.

use axum::http::HeaderMap;

use turnkey_common::constants::headers::X_API_KEY;

/// Check the admin secret header against the configured secret.
///
/// Fails closed: an empty configured secret never matches anything,
/// including an empty or absent header.
pub fn admin_authorized(headers: &HeaderMap, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }

    headers
        .get(X_API_KEY)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|provided| provided == expected)
}
