// src/lib.rs

//! # Window Guard
//!
//! A per-request rate limiting engine with fixed window and sliding window
//! algorithms, multi-dimensional keys (IP, user, global, custom template), and
//! background reclamation of stale per-key state.
//!
//! ## Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//! use http::HeaderMap;
//! use window_guard::{
//!     Algorithm, Dimension, LimiterManager, ManagerConfig, OperationIdentity,
//!     RateLimitConfig, RateLimitInterceptor, RequestContext, SystemClock, TimeUnit,
//! };
//!
//! let manager = Arc::new(LimiterManager::with_default_algorithms(
//!     ManagerConfig::default(),
//!     SystemClock,
//! ));
//! manager.start().unwrap();
//!
//! let interceptor = RateLimitInterceptor::new(Arc::clone(&manager));
//! let config = RateLimitConfig::new(10, 1, TimeUnit::Minutes)
//!     .algorithm(Algorithm::FixedWindow)
//!     .dimension(Dimension::Global);
//! let operation = OperationIdentity::new("ReportService", "export");
//!
//! let mut response = HeaderMap::new();
//! match interceptor.check(&config, &operation, &RequestContext::new(), &[], &mut response) {
//!     Ok(_) => println!("Request allowed"),
//!     Err(rejection) => println!("Rate limited - retry after {}s", rejection.retry_after_seconds),
//! }
//!
//! manager.shutdown();
//! ```

// private modules
mod algorithm;
mod clock;
mod config;
mod context;
mod errors;
mod fixed_window;
mod interceptor;
mod key_generator;
mod manager;
mod result;
mod sliding_window;
mod store;

// public API exports
pub use algorithm::WindowAlgorithm;
pub use clock::{Clock, ClockError, SystemClock};
pub use config::{Algorithm, Dimension, ManagerConfig, RateLimitConfig, TimeUnit};
pub use context::{OperationIdentity, RequestContext};
pub use errors::{RateLimitError, RateLimitExceeded};
pub use fixed_window::FixedWindowLimiter;
pub use interceptor::{
    Admission, RateLimitInterceptor, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET,
};
pub use key_generator::KeyGenerator;
pub use manager::LimiterManager;
pub use result::RateLimitResult;
pub use sliding_window::SlidingWindowLimiter;
