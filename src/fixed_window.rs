// src/fixed_window.rs

// fixed window counter: one counter per key per window-aligned bucket

// dependencies
use crate::algorithm::WindowAlgorithm;
use crate::clock::{Clock, SystemClock};
use crate::config::{Algorithm, RateLimitConfig};
use crate::errors::RateLimitError;
use crate::result::RateLimitResult;
use crate::store::KeyedStore;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
struct FixedWindowState {
    window_start_millis: u64,
    window_millis: u64,
    count: u64,
    last_access_millis: u64,
}

impl FixedWindowState {
    fn is_stale(&self, now_millis: u64, stale_after_millis: u64) -> bool {
        let window_end = self.window_start_millis.saturating_add(self.window_millis);
        now_millis.saturating_sub(self.last_access_millis) >= stale_after_millis
            && now_millis >= window_end
    }
}

/// Counts admissions in discrete windows aligned to multiples of the window size.
///
/// O(1) memory per key. Up to twice the limit can pass around a window boundary
/// (end of one bucket plus start of the next).
#[derive(Debug)]
pub struct FixedWindowLimiter<C = SystemClock>
where
    C: Clock,
{
    windows: KeyedStore<FixedWindowState>,
    clock: C,
}

impl Default for FixedWindowLimiter<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C> FixedWindowLimiter<C>
where
    C: Clock,
{
    pub fn new(clock: C) -> Self {
        Self {
            windows: KeyedStore::default(),
            clock,
        }
    }
}

impl<C> WindowAlgorithm for FixedWindowLimiter<C>
where
    C: Clock,
{
    fn algorithm(&self) -> Algorithm {
        Algorithm::FixedWindow
    }

    fn try_acquire(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError> {
        config.validate()?;
        let window_millis = config.window_millis()?;
        let limit = config.limit;
        let now = self.clock.now_millis()?;
        let window_start = now - now % window_millis;
        let window_end = window_start.saturating_add(window_millis);

        let result = self.windows.with_state(
            key,
            || FixedWindowState {
                window_start_millis: window_start,
                window_millis,
                count: 0,
                last_access_millis: now,
            },
            |state| {
                // rollover happens before the count check, so the first
                // instant of a window already belongs to the new one
                if state.window_start_millis != window_start {
                    state.window_start_millis = window_start;
                    state.count = 0;
                }
                state.window_millis = window_millis;

                if state.count >= limit {
                    return RateLimitResult::rejected(
                        key,
                        limit,
                        window_end,
                        now,
                        config.limit_info(),
                    );
                }

                state.count += 1;
                state.last_access_millis = now;
                RateLimitResult::allowed(
                    key,
                    limit,
                    limit - state.count,
                    window_end,
                    config.limit_info(),
                )
            },
        );

        debug!(
            key,
            allowed = result.allowed,
            remaining = result.remaining,
            "fixed window decision"
        );
        Ok(result)
    }

    fn cleanup(&self, stale_after: Duration) -> Result<usize, RateLimitError> {
        let now = self.clock.now_millis()?;
        let stale_after_millis = stale_after.as_millis() as u64;
        let removed = self
            .windows
            .sweep(|state| state.is_stale(now, stale_after_millis));
        debug!(removed, remaining = self.windows.len(), "fixed window cleanup complete");
        Ok(removed)
    }

    fn reset(&self, key: &str) -> bool {
        self.windows.remove(key)
    }

    fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}
