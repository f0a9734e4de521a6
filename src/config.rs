// src/config.rs

//! Configuration types for the window guard

// dependencies
use crate::errors::RateLimitError;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Which counting algorithm enforces a quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Discrete buckets aligned to multiples of the window size.
    FixedWindow,
    /// Continuously moving trailing interval backed by admission timestamps.
    SlidingWindow,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::FixedWindow => write!(f, "fixed_window"),
            Algorithm::SlidingWindow => write!(f, "sliding_window"),
        }
    }
}

/// The axis along which quota is partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// One bucket per client address.
    Ip,
    /// One bucket per authenticated principal.
    User,
    /// All callers share one bucket.
    Global,
    /// Bucket named by `custom_key_template`.
    Custom,
}

/// Unit the configured `window` is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn millis(self) -> u64 {
        match self {
            TimeUnit::Milliseconds => 1,
            TimeUnit::Seconds => 1_000,
            TimeUnit::Minutes => 60_000,
            TimeUnit::Hours => 3_600_000,
            TimeUnit::Days => 86_400_000,
        }
    }

    fn label(self, amount: u64) -> &'static str {
        match (self, amount == 1) {
            (TimeUnit::Milliseconds, true) => "millisecond",
            (TimeUnit::Milliseconds, false) => "milliseconds",
            (TimeUnit::Seconds, true) => "second",
            (TimeUnit::Seconds, false) => "seconds",
            (TimeUnit::Minutes, true) => "minute",
            (TimeUnit::Minutes, false) => "minutes",
            (TimeUnit::Hours, true) => "hour",
            (TimeUnit::Hours, false) => "hours",
            (TimeUnit::Days, true) => "day",
            (TimeUnit::Days, false) => "days",
        }
    }
}

/// Rate limit settings for one protected operation.
///
/// Resolved by the dispatch layer (method-level settings already merged over
/// class-level ones) and passed by reference into the engine. The engine never
/// mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub(crate) limit: u64,
    pub(crate) window: u64,
    pub(crate) unit: TimeUnit,
    pub(crate) algorithm: Algorithm,
    pub(crate) dimension: Dimension,
    pub(crate) key_prefix: String,
    pub(crate) custom_key_template: Option<String>,
    pub(crate) enabled: bool,
    pub(crate) message: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            window: 1,
            unit: TimeUnit::Seconds,
            algorithm: Algorithm::SlidingWindow,
            dimension: Dimension::Ip,
            key_prefix: String::new(),
            custom_key_template: None,
            enabled: true,
            message: "Too many requests, please try again later".to_string(),
        }
    }
}

impl RateLimitConfig {
    /// Create a new configuration allowing `limit` requests per `window` `unit`s
    pub fn new(limit: u64, window: u64, unit: TimeUnit) -> Self {
        Self {
            limit,
            window,
            unit,
            ..Self::default()
        }
    }

    /// Builder-style: set the quota
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Builder-style: set the window length and unit
    pub fn window(mut self, window: u64, unit: TimeUnit) -> Self {
        self.window = window;
        self.unit = unit;
        self
    }

    /// Builder-style: set the algorithm
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Builder-style: set the dimension
    pub fn dimension(mut self, dimension: Dimension) -> Self {
        self.dimension = dimension;
        self
    }

    /// Builder-style: set the key prefix
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Builder-style: set the CUSTOM dimension template
    pub fn custom_key_template(mut self, template: impl Into<String>) -> Self {
        self.custom_key_template = Some(template.into());
        self
    }

    /// Builder-style: enable or disable enforcement
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder-style: set the rejection message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn get_limit(&self) -> u64 {
        self.limit
    }

    pub fn get_algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn get_dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn get_key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn get_custom_key_template(&self) -> Option<&str> {
        self.custom_key_template.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get_message(&self) -> &str {
        &self.message
    }

    /// Window length in milliseconds.
    pub fn window_millis(&self) -> Result<u64, RateLimitError> {
        match self.window.checked_mul(self.unit.millis()) {
            Some(0) | None => Err(RateLimitError::InvalidWindow),
            Some(millis) => Ok(millis),
        }
    }

    /// Human-readable quota description, e.g. `"3 requests per 1 second"`.
    pub fn limit_info(&self) -> String {
        let noun = if self.limit == 1 { "request" } else { "requests" };
        format!(
            "{} {} per {} {}",
            self.limit,
            noun,
            self.window,
            self.unit.label(self.window)
        )
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RateLimitError> {
        if self.limit == 0 {
            return Err(RateLimitError::InvalidLimit);
        }
        self.window_millis()?;
        Ok(())
    }
}

/// Settings for the [`LimiterManager`](crate::LimiterManager) and its cleanup worker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawManagerConfig")]
pub struct ManagerConfig {
    pub(crate) cleanup_interval: Duration,
    pub(crate) stale_after: Duration,
    pub(crate) shutdown_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(5 * 60),
            stale_after: Duration::from_secs(60 * 60),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl ManagerConfig {
    /// Builder-style: how often the background worker sweeps stale keys
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Builder-style: how long a key must go unobserved before it is reclaimed
    pub fn stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Builder-style: how long `shutdown` waits for the worker to stop
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn get_cleanup_interval(&self) -> Duration {
        self.cleanup_interval
    }

    pub fn get_stale_after(&self) -> Duration {
        self.stale_after
    }

    pub fn get_shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

// on-disk shape of ManagerConfig
#[derive(Deserialize)]
#[serde(default)]
struct RawManagerConfig {
    cleanup_interval_secs: u64,
    stale_after_secs: u64,
    shutdown_timeout_ms: u64,
}

impl Default for RawManagerConfig {
    fn default() -> Self {
        let defaults = ManagerConfig::default();
        Self {
            cleanup_interval_secs: defaults.cleanup_interval.as_secs(),
            stale_after_secs: defaults.stale_after.as_secs(),
            shutdown_timeout_ms: defaults.shutdown_timeout.as_millis() as u64,
        }
    }
}

impl From<RawManagerConfig> for ManagerConfig {
    fn from(raw: RawManagerConfig) -> Self {
        Self {
            cleanup_interval: Duration::from_secs(raw.cleanup_interval_secs),
            stale_after: Duration::from_secs(raw.stale_after_secs),
            shutdown_timeout: Duration::from_millis(raw.shutdown_timeout_ms),
        }
    }
}
