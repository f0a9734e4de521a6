// src/algorithm.rs

// the seam between the limiter manager and the window implementations

// dependencies
use crate::config::{Algorithm, RateLimitConfig};
use crate::errors::RateLimitError;
use crate::result::RateLimitResult;
use std::time::Duration;

/// A windowing algorithm that owns its own per-key state.
///
/// Implementations must be safe to call concurrently for the same and for
/// different keys, and `cleanup` must be safe to run while `try_acquire` is in
/// flight.
pub trait WindowAlgorithm: Send + Sync {
    /// Which `Algorithm` selector this implementation answers to.
    fn algorithm(&self) -> Algorithm;

    /// Decide whether one more request for `key` fits in its quota, recording it if so.
    fn try_acquire(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError>;

    /// Drop state for keys unobserved for at least `stale_after` whose window
    /// has also run out. Returns the number of keys removed.
    fn cleanup(&self, stale_after: Duration) -> Result<usize, RateLimitError>;

    /// Forget all state for `key`. Returns whether anything was tracked.
    fn reset(&self, key: &str) -> bool;

    /// Number of keys currently holding state.
    fn tracked_keys(&self) -> usize;
}
