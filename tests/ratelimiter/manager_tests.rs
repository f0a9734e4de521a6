// tests/ratelimiter/manager_tests.rs

#[cfg(test)]
mod tests {
    use crate::TestClock;
    use crate::fixtures::logging;
    use std::sync::Arc;
    use std::time::Duration;
    use window_guard::{
        Algorithm, FixedWindowLimiter, LimiterManager, ManagerConfig, RateLimitConfig,
        TimeUnit,
    };

    fn manager(clock: &TestClock) -> LimiterManager {
        LimiterManager::with_default_algorithms(ManagerConfig::default(), clock.clone())
    }

    #[test]
    fn routes_to_the_requested_algorithm() {
        logging::init();
        let clock = TestClock::new(900);
        let manager = manager(&clock);
        let fixed = RateLimitConfig::new(1, 1, TimeUnit::Seconds).algorithm(Algorithm::FixedWindow);
        let sliding =
            RateLimitConfig::new(1, 1, TimeUnit::Seconds).algorithm(Algorithm::SlidingWindow);

        assert!(manager.check_rate_limit("fixed", &fixed).allowed);
        assert!(manager.check_rate_limit("sliding", &sliding).allowed);

        // the fixed window rolls over at t=1000, the sliding one does not
        clock.set_time(1_000);
        assert!(manager.check_rate_limit("fixed", &fixed).allowed);
        assert!(!manager.check_rate_limit("sliding", &sliding).allowed);

        let stats = manager.stats();
        assert_eq!(stats[&Algorithm::FixedWindow], 1);
        assert_eq!(stats[&Algorithm::SlidingWindow], 1);
    }

    #[test]
    fn unregistered_algorithm_falls_back_to_sliding_window() {
        logging::init();
        let clock = TestClock::new(0);
        let manager = LimiterManager::new(ManagerConfig::default());
        manager.register(Arc::new(window_guard::SlidingWindowLimiter::new(clock.clone())));
        assert_eq!(manager.registered(), [Algorithm::SlidingWindow]);

        let config = RateLimitConfig::new(1, 1, TimeUnit::Seconds).algorithm(Algorithm::FixedWindow);
        assert!(manager.check_rate_limit("k", &config).allowed);
        assert!(!manager.check_rate_limit("k", &config).allowed);
        assert_eq!(manager.stats()[&Algorithm::SlidingWindow], 1);
    }

    #[test]
    fn missing_fallback_fails_open() {
        logging::init();
        let clock = TestClock::new(0);
        let manager = LimiterManager::new(ManagerConfig::default());
        manager.register(Arc::new(FixedWindowLimiter::new(clock)));

        // only the fixed window exists, and the sliding window is requested
        let config = RateLimitConfig::new(1, 1, TimeUnit::Seconds);
        for _ in 0..3 {
            let result = manager.check_rate_limit("k", &config);
            assert!(result.allowed);
            assert_eq!(result.remaining, 1);
        }
    }

    #[test]
    fn register_replaces_same_selector() {
        let clock = TestClock::new(0);
        let manager = manager(&clock);
        let config = RateLimitConfig::new(1, 1, TimeUnit::Seconds).algorithm(Algorithm::FixedWindow);
        manager.check_rate_limit("k", &config);
        assert_eq!(manager.stats()[&Algorithm::FixedWindow], 1);

        manager.register(Arc::new(FixedWindowLimiter::new(clock)));
        assert_eq!(manager.stats()[&Algorithm::FixedWindow], 0);
        assert_eq!(manager.registered().len(), 2);
    }

    #[test]
    fn reset_clears_key_in_every_algorithm() {
        let clock = TestClock::new(0);
        let manager = manager(&clock);
        let fixed = RateLimitConfig::new(1, 1, TimeUnit::Seconds).algorithm(Algorithm::FixedWindow);
        let sliding = RateLimitConfig::new(1, 1, TimeUnit::Seconds);

        manager.check_rate_limit("k", &fixed);
        manager.check_rate_limit("k", &sliding);
        assert!(manager.reset("k"));
        assert!(manager.stats().values().all(|&n| n == 0));
        assert!(!manager.reset("k"));

        assert!(manager.check_rate_limit("k", &fixed).allowed);
        assert!(manager.check_rate_limit("k", &sliding).allowed);
    }

    #[test]
    fn background_worker_reclaims_stale_keys() {
        logging::init();
        let clock = TestClock::new(0);
        let config = ManagerConfig::default()
            .cleanup_interval(Duration::from_millis(10))
            .stale_after(Duration::from_secs(60));
        let manager = LimiterManager::with_default_algorithms(config, clock.clone());
        let limit = RateLimitConfig::new(5, 1, TimeUnit::Seconds);

        for i in 0..10 {
            manager.check_rate_limit(&format!("client{i}"), &limit);
        }
        assert_eq!(manager.stats()[&Algorithm::SlidingWindow], 10);

        manager.start().unwrap();
        clock.set_time(61_000);

        let mut remaining = usize::MAX;
        for _ in 0..200 {
            remaining = manager.stats()[&Algorithm::SlidingWindow];
            if remaining == 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(remaining, 0);
        manager.shutdown();
    }

    #[test]
    fn shutdown_runs_a_final_cleanup() {
        let clock = TestClock::new(0);
        let config = ManagerConfig::default().stale_after(Duration::from_secs(1));
        let manager = LimiterManager::with_default_algorithms(config, clock.clone());
        manager.start().unwrap();

        manager.check_rate_limit("k", &RateLimitConfig::new(5, 1, TimeUnit::Seconds));
        clock.set_time(5_000);

        // the worker interval is five minutes, so only shutdown can have swept
        manager.shutdown();
        assert!(!manager.is_running());
        assert_eq!(manager.stats()[&Algorithm::SlidingWindow], 0);
    }

    #[test]
    fn shutdown_without_start_is_harmless() {
        let clock = TestClock::new(0);
        let manager = manager(&clock);
        manager.shutdown();
        manager.shutdown();
        assert!(!manager.is_running());
    }

    #[test]
    fn dropping_a_running_manager_stops_the_worker() {
        let clock = TestClock::new(0);
        let manager = manager(&clock);
        manager.start().unwrap();
        drop(manager);
    }
}
