// src/interceptor.rs

//! The enforcement point called by the dispatch layer before a protected
//! operation runs.
//!
//! This is the only place a negative [`RateLimitResult`] turns into an error
//! ([`RateLimitExceeded`]). Every other failure is logged and the request is
//! admitted.

// dependencies
use crate::context::{OperationIdentity, RequestContext};
use crate::config::RateLimitConfig;
use crate::errors::RateLimitExceeded;
use crate::key_generator::KeyGenerator;
use crate::manager::LimiterManager;
use crate::result::RateLimitResult;
use http::header::RETRY_AFTER;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// How a request got through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Rate limiting is disabled for the operation; nothing was counted.
    Skipped,
    /// The request was counted and fits in its quota.
    Admitted(RateLimitResult),
    /// The engine failed internally and let the request through unchecked.
    Degraded,
}

impl Admission {
    pub fn result(&self) -> Option<&RateLimitResult> {
        match self {
            Admission::Admitted(result) => Some(result),
            _ => None,
        }
    }
}

/// Derives a key, asks the manager for a decision, and publishes quota headers.
#[derive(Clone)]
pub struct RateLimitInterceptor {
    key_generator: KeyGenerator,
    manager: Arc<LimiterManager>,
}

impl RateLimitInterceptor {
    pub fn new(manager: Arc<LimiterManager>) -> Self {
        Self::with_key_generator(manager, KeyGenerator::default())
    }

    pub fn with_key_generator(manager: Arc<LimiterManager>, key_generator: KeyGenerator) -> Self {
        Self {
            key_generator,
            manager,
        }
    }

    pub fn manager(&self) -> &Arc<LimiterManager> {
        &self.manager
    }

    pub fn key_generator(&self) -> &KeyGenerator {
        &self.key_generator
    }

    /// Enforce `config` for one call of `operation`.
    ///
    /// Quota headers are written into `response` whenever a decision was made,
    /// including on rejection. `Retry-After` is only written on rejection.
    pub fn check(
        &self,
        config: &RateLimitConfig,
        operation: &OperationIdentity,
        request: &RequestContext,
        args: &[Value],
        response: &mut HeaderMap,
    ) -> Result<Admission, RateLimitExceeded> {
        if !config.is_enabled() {
            debug!(operation = %operation, "rate limiting disabled");
            return Ok(Admission::Skipped);
        }

        let key = self
            .key_generator
            .generate_key(config, operation, request, args);

        let result = match self.manager.try_check_rate_limit(&key, config) {
            Ok(result) => result,
            Err(e) => {
                error!(
                    key = %key,
                    operation = %operation,
                    error = %e,
                    "rate limit check failed, admitting request"
                );
                return Ok(Admission::Degraded);
            }
        };

        write_quota_headers(response, &result);

        if result.allowed {
            debug!(key = %key, remaining = result.remaining, "request admitted");
            return Ok(Admission::Admitted(result));
        }

        warn!(
            key = %key,
            limit = result.total,
            retry_after = result.retry_after_seconds,
            "rate limit exceeded"
        );
        Err(RateLimitExceeded {
            key: result.key.clone(),
            limit_info: result.limit_info.clone(),
            retry_after_seconds: result.retry_after_seconds,
            message: config.get_message().to_string(),
            limit: result.total,
            remaining: result.remaining,
            reset_at_seconds: result.reset_at_seconds(),
        })
    }
}

fn write_quota_headers(response: &mut HeaderMap, result: &RateLimitResult) {
    response.insert(X_RATELIMIT_LIMIT, HeaderValue::from(result.total));
    response.insert(X_RATELIMIT_REMAINING, HeaderValue::from(result.remaining));
    response.insert(X_RATELIMIT_RESET, HeaderValue::from(result.reset_at_seconds()));
    if !result.allowed {
        response.insert(RETRY_AFTER, HeaderValue::from(result.retry_after_seconds));
    }
}
