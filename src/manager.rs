// src/manager.rs

//! Routing of quota checks to registered algorithms, and periodic reclamation
//! of stale per-key state.

// dependencies
use crate::algorithm::WindowAlgorithm;
use crate::clock::Clock;
use crate::config::{Algorithm, ManagerConfig, RateLimitConfig};
use crate::errors::RateLimitError;
use crate::fixed_window::FixedWindowLimiter;
use crate::result::RateLimitResult;
use crate::sliding_window::SlidingWindowLimiter;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const DEFAULT_ALGORITHM: Algorithm = Algorithm::SlidingWindow;

type Registry = RwLock<HashMap<Algorithm, Arc<dyn WindowAlgorithm>>>;

// handle to the background cleanup thread
struct CleanupWorker {
    stop_tx: Sender<()>,
    done_rx: Receiver<()>,
    handle: JoinHandle<()>,
}

/// Owns the registered window algorithms and their cleanup schedule.
///
/// One explicitly constructed instance per process, shared behind an `Arc` by
/// every request-handling thread. Dropping a started manager shuts it down.
pub struct LimiterManager {
    registry: Arc<Registry>,
    config: ManagerConfig,
    worker: Mutex<Option<CleanupWorker>>,
}

impl LimiterManager {
    /// A manager with no algorithms registered.
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            registry: Arc::new(RwLock::new(HashMap::new())),
            config,
            worker: Mutex::new(None),
        }
    }

    /// A manager with the fixed and sliding window algorithms registered.
    pub fn with_default_algorithms<C>(config: ManagerConfig, clock: C) -> Self
    where
        C: Clock + Clone + 'static,
    {
        let manager = Self::new(config);
        manager.register(Arc::new(FixedWindowLimiter::new(clock.clone())));
        manager.register(Arc::new(SlidingWindowLimiter::new(clock)));
        manager
    }

    /// Register an algorithm, replacing any previous one for the same selector.
    pub fn register(&self, algorithm: Arc<dyn WindowAlgorithm>) {
        let kind = algorithm.algorithm();
        if self.registry.write().insert(kind, algorithm).is_some() {
            warn!(algorithm = %kind, "replaced registered rate limit algorithm");
        } else {
            debug!(algorithm = %kind, "registered rate limit algorithm");
        }
    }

    /// Selectors with a registered implementation.
    pub fn registered(&self) -> Vec<Algorithm> {
        self.registry.read().keys().copied().collect()
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Decide on one request, admitting it if the engine itself fails.
    pub fn check_rate_limit(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        self.try_check_rate_limit(key, config).unwrap_or_else(|e| {
            error!(key, error = %e, "rate limit check failed, admitting request");
            RateLimitResult::unrestricted(key, config.limit, config.limit_info())
        })
    }

    /// Decide on one request, surfacing internal failures instead of admitting.
    pub fn try_check_rate_limit(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError> {
        let algorithm = self.resolve(config.algorithm)?;
        algorithm.try_acquire(key, config)
    }

    // clone the handle out so no registry lock is held during the decision
    fn resolve(&self, requested: Algorithm) -> Result<Arc<dyn WindowAlgorithm>, RateLimitError> {
        let registry = self.registry.read();
        if let Some(algorithm) = registry.get(&requested) {
            return Ok(Arc::clone(algorithm));
        }

        let fallback = registry
            .get(&DEFAULT_ALGORITHM)
            .ok_or(RateLimitError::NoAlgorithmRegistered)?;
        warn!(
            requested = %requested,
            fallback = %DEFAULT_ALGORITHM,
            "rate limit algorithm not registered, using fallback"
        );
        Ok(Arc::clone(fallback))
    }

    /// Run one cleanup pass over every registered algorithm now.
    pub fn cleanup(&self) -> usize {
        cleanup_all(&self.registry, self.config.stale_after)
    }

    /// Forget `key` in every algorithm. Returns whether any state existed.
    pub fn reset(&self, key: &str) -> bool {
        self.registry
            .read()
            .values()
            .fold(false, |found, algorithm| algorithm.reset(key) || found)
    }

    /// Tracked key count per registered algorithm.
    pub fn stats(&self) -> HashMap<Algorithm, usize> {
        self.registry
            .read()
            .iter()
            .map(|(kind, algorithm)| (*kind, algorithm.tracked_keys()))
            .collect()
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Start the background cleanup worker. Calling it again is a no-op.
    pub fn start(&self) -> std::io::Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            debug!("cleanup worker already running");
            return Ok(());
        }

        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let (done_tx, done_rx) = channel::bounded::<()>(1);
        let registry = Arc::clone(&self.registry);
        let interval = self.config.cleanup_interval;
        let stale_after = self.config.stale_after;

        let handle = thread::Builder::new()
            .name("window-guard-cleanup".to_string())
            .spawn(move || {
                let ticker = channel::tick(interval);
                loop {
                    let stop = channel::select! {
                        recv(stop_rx) -> _ => true,
                        recv(ticker) -> _ => false,
                    };
                    if stop {
                        break;
                    }
                    cleanup_all(&registry, stale_after);
                }
                let _ = done_tx.send(());
            })?;

        *worker = Some(CleanupWorker {
            stop_tx,
            done_rx,
            handle,
        });
        info!(
            interval_secs = interval.as_secs(),
            stale_after_secs = stale_after.as_secs(),
            "rate limit cleanup worker started"
        );
        Ok(())
    }

    /// Stop the cleanup worker (waiting at most `shutdown_timeout`) and run a
    /// final cleanup pass.
    pub fn shutdown(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            stop_worker(worker, self.config.shutdown_timeout);
        }
        let removed = self.cleanup();
        info!(removed, "rate limit manager shut down");
    }
}

impl Drop for LimiterManager {
    fn drop(&mut self) {
        if self.is_running() {
            self.shutdown();
        }
    }
}

fn stop_worker(worker: CleanupWorker, timeout: Duration) {
    let CleanupWorker {
        stop_tx,
        done_rx,
        handle,
    } = worker;

    // a disconnected stop channel also ends the worker loop
    drop(stop_tx);

    match done_rx.recv_timeout(timeout) {
        Ok(()) | Err(RecvTimeoutError::Disconnected) => {
            if handle.join().is_err() {
                error!("rate limit cleanup worker panicked");
            }
        }
        Err(RecvTimeoutError::Timeout) => {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "rate limit cleanup worker did not stop in time, detaching"
            );
        }
    }
}

fn cleanup_all(registry: &Registry, stale_after: Duration) -> usize {
    // snapshot so registration is never blocked behind a sweep
    let algorithms: Vec<_> = registry.read().values().cloned().collect();
    let mut removed = 0;
    for algorithm in algorithms {
        match algorithm.cleanup(stale_after) {
            Ok(n) => removed += n,
            Err(e) => error!(
                algorithm = %algorithm.algorithm(),
                error = %e,
                "rate limit cleanup failed"
            ),
        }
    }
    debug!(removed, "rate limit cleanup pass complete");
    removed
}
