// src/result.rs

//! Outcome of a single quota check

/// Result of a rate limiting decision with metadata for HTTP responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether the request should be allowed
    pub allowed: bool,
    /// Admissions left in the current window
    pub remaining: u64,
    /// Configured quota
    pub total: u64,
    /// When quota frees up (milliseconds since epoch)
    pub reset_at_millis: u64,
    /// Whole seconds until the client may retry; 0 when allowed
    pub retry_after_seconds: u64,
    /// The bucket this decision was made against
    pub key: String,
    /// Human-readable quota description
    pub limit_info: String,
}

impl RateLimitResult {
    pub(crate) fn allowed(
        key: &str,
        limit: u64,
        remaining: u64,
        reset_at_millis: u64,
        limit_info: String,
    ) -> Self {
        Self {
            allowed: true,
            remaining,
            total: limit,
            reset_at_millis,
            retry_after_seconds: 0,
            key: key.to_string(),
            limit_info,
        }
    }

    pub(crate) fn rejected(
        key: &str,
        limit: u64,
        reset_at_millis: u64,
        now_millis: u64,
        limit_info: String,
    ) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            total: limit,
            reset_at_millis,
            retry_after_seconds: retry_after_seconds(reset_at_millis, now_millis),
            key: key.to_string(),
            limit_info,
        }
    }

    /// Admission produced when the engine cannot decide (fail-open).
    pub(crate) fn unrestricted(key: &str, limit: u64, limit_info: String) -> Self {
        Self {
            allowed: true,
            remaining: limit,
            total: limit,
            reset_at_millis: 0,
            retry_after_seconds: 0,
            key: key.to_string(),
            limit_info,
        }
    }

    /// Reset instant in whole seconds since the epoch, rounded up.
    pub fn reset_at_seconds(&self) -> u64 {
        self.reset_at_millis.div_ceil(1000)
    }
}

// ceil((reset - now) / 1000), never below one second
fn retry_after_seconds(reset_at_millis: u64, now_millis: u64) -> u64 {
    reset_at_millis
        .saturating_sub(now_millis)
        .div_ceil(1000)
        .max(1)
}
