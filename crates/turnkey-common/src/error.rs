//! Store-level failure classifications.

use thiserror::Error;

/// Why a redemption attempt was refused.
///
/// The store distinguishes the three denial reasons for testability and
/// logging; the HTTP adapter collapses all of them into a single
/// `invalid_or_expired` response so callers cannot probe whether a code
/// ever existed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsumeError {
    /// No record exists under this code
    #[error("code not found")]
    NotFound,

    /// The record's expiry is strictly in the past
    #[error("code expired")]
    Expired,

    /// The record was already redeemed and reuse is disallowed
    #[error("code already used")]
    AlreadyUsed,

    /// Backend I/O failure (durable store only)
    #[error("storage error: {0}")]
    Storage(String),
}

impl ConsumeError {
    /// Returns the HTTP status code for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound | Self::Expired | Self::AlreadyUsed => 404,
            Self::Storage(_) => 500,
        }
    }

    /// True for the three denial classifications that are collapsed into
    /// the uniform outward `invalid_or_expired` signal.
    pub fn is_denial(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}
