// src/errors.rs

// error handling for the window guard

// dependencies
use http::StatusCode;
use thiserror::Error;

use crate::clock::ClockError;

/// Internal failures of the engine.
///
/// None of these reach the caller of the interceptor: they are logged and the
/// request is admitted.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("limit must be positive")]
    InvalidLimit,
    #[error("window must be positive and fit in u64 milliseconds")]
    InvalidWindow,
    #[error("clock error occurred: {0}")]
    Clock(#[from] ClockError),
    #[error("no rate limit algorithm is registered")]
    NoAlgorithmRegistered,
}

/// A request was rejected because its quota is exhausted.
///
/// This is the only failure the interceptor surfaces to its caller. It maps
/// onto a `429 Too Many Requests` response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({limit_info}), retry after {retry_after_seconds} seconds")]
pub struct RateLimitExceeded {
    /// The bucket that ran out
    pub key: String,
    /// Human-readable quota, e.g. `"10 requests per 1 minute"`
    pub limit_info: String,
    /// Whole seconds until a retry may succeed, at least 1
    pub retry_after_seconds: u64,
    /// Configured rejection message
    pub message: String,
    pub limit: u64,
    pub remaining: u64,
    /// Seconds since the Unix epoch at which quota frees up
    pub reset_at_seconds: u64,
}

impl RateLimitExceeded {
    pub fn status(&self) -> StatusCode {
        StatusCode::TOO_MANY_REQUESTS
    }
}
