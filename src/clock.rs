// src/clock.rs

// clock module definition and implementations

// dependencies
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Clock trait to abstract time retrieval.
/// Implementors must be thread-safe (Send + Sync).
/// The `now_millis` method returns wall-clock milliseconds since the Unix epoch,
/// which is what window alignment and the `X-RateLimit-Reset` header are based on.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> Result<u64, ClockError>;
}

/// Clock error type
#[derive(Debug, Error)]
pub enum ClockError {
    #[error("system clock is set before the Unix epoch")]
    SystemTimeError,
}

/// SystemClock implementation using the system time.
/// This is the default clock used by both window algorithms.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Result<u64, ClockError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .map_err(|_| ClockError::SystemTimeError)
    }
}
