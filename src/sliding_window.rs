// src/sliding_window.rs

// sliding window log: exact trailing-interval counting from admission timestamps

// dependencies
use crate::algorithm::WindowAlgorithm;
use crate::clock::{Clock, SystemClock};
use crate::config::{Algorithm, RateLimitConfig};
use crate::errors::RateLimitError;
use crate::result::RateLimitResult;
use crate::store::KeyedStore;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
struct SlidingWindowState {
    // admission instants, oldest first
    timestamps: VecDeque<u64>,
    window_millis: u64,
    last_access_millis: u64,
}

impl SlidingWindowState {
    fn evict_expired(&mut self, now_millis: u64) {
        let Some(cutoff) = now_millis.checked_sub(self.window_millis) else {
            return;
        };
        while self.timestamps.front().is_some_and(|&ts| ts <= cutoff) {
            self.timestamps.pop_front();
        }
    }

    fn is_stale(&self, now_millis: u64, stale_after_millis: u64) -> bool {
        let newest_expired = self
            .timestamps
            .back()
            .is_none_or(|&ts| now_millis >= ts.saturating_add(self.window_millis));
        now_millis.saturating_sub(self.last_access_millis) >= stale_after_millis && newest_expired
    }
}

/// Counts admissions inside the trailing `window` ending now.
///
/// No boundary bursts, at the cost of O(admissions in window) memory per key.
#[derive(Debug)]
pub struct SlidingWindowLimiter<C = SystemClock>
where
    C: Clock,
{
    logs: KeyedStore<SlidingWindowState>,
    clock: C,
}

impl Default for SlidingWindowLimiter<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C> SlidingWindowLimiter<C>
where
    C: Clock,
{
    pub fn new(clock: C) -> Self {
        Self {
            logs: KeyedStore::default(),
            clock,
        }
    }
}

impl<C> WindowAlgorithm for SlidingWindowLimiter<C>
where
    C: Clock,
{
    fn algorithm(&self) -> Algorithm {
        Algorithm::SlidingWindow
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

        let result = self.logs.with_state(
            key,
            || SlidingWindowState {
                timestamps: VecDeque::new(),
                window_millis,
                last_access_millis: now,
            },
            |state| {
                state.window_millis = window_millis;
                state.last_access_millis = now;
                state.evict_expired(now);

                let in_window = state.timestamps.len() as u64;
                if in_window >= limit {
                    // in_window >= limit > 0, so there is an oldest entry
                    let oldest = state.timestamps.front().copied().unwrap_or(now);
                    return RateLimitResult::rejected(
                        key,
                        limit,
                        oldest.saturating_add(window_millis),
                        now,
                        config.limit_info(),
                    );
                }

                state.timestamps.push_back(now);
                RateLimitResult::allowed(
                    key,
                    limit,
                    limit - (in_window + 1),
                    now.saturating_add(window_millis),
                    config.limit_info(),
                )
            },
        );

        debug!(
            key,
            allowed = result.allowed,
            remaining = result.remaining,
            "sliding window decision"
        );
        Ok(result)
    }

    fn cleanup(&self, stale_after: Duration) -> Result<usize, RateLimitError> {
        let now = self.clock.now_millis()?;
        let stale_after_millis = stale_after.as_millis() as u64;
        let removed = self
            .logs
            .sweep(|state| state.is_stale(now, stale_after_millis));
        debug!(removed, remaining = self.logs.len(), "sliding window cleanup complete");
        Ok(removed)
    }

    fn reset(&self, key: &str) -> bool {
        self.logs.remove(key)
    }

    fn tracked_keys(&self) -> usize {
        self.logs.len()
    }
}
