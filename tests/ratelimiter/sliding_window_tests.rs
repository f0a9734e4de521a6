// tests/ratelimiter/sliding_window_tests.rs

#[cfg(test)]
mod tests {

    use crate::TestClock;
    use window_guard::{RateLimitConfig, SlidingWindowLimiter, TimeUnit, WindowAlgorithm};

    #[test]
    fn trailing_interval_scenario() {
        let clock = TestClock::new(0);
        let limiter = SlidingWindowLimiter::new(clock.clone());
        let config = RateLimitConfig::new(2, 1_000, TimeUnit::Milliseconds);

        let first = limiter.try_acquire("client1", &config).unwrap();
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);

        clock.set_time(500);
        let second = limiter.try_acquire("client1", &config).unwrap();
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);

        clock.set_time(600);
        let rejected = limiter.try_acquire("client1", &config).unwrap();
        assert!(!rejected.allowed);
        // the t=0 admission leaves the window at t=1000
        assert_eq!(rejected.reset_at_millis, 1_000);
        assert_eq!(rejected.retry_after_seconds, 1);

        clock.set_time(1_001);
        let admitted = limiter.try_acquire("client1", &config).unwrap();
        assert!(admitted.allowed);
        assert_eq!(admitted.reset_at_millis, 2_001);
    }

    #[test]
    fn no_burst_across_window_boundary() {
        let clock = TestClock::new(900);
        let limiter = SlidingWindowLimiter::new(clock.clone());
        let config = RateLimitConfig::new(2, 1, TimeUnit::Seconds);

        assert!(limiter.try_acquire("k", &config).unwrap().allowed);
        assert!(limiter.try_acquire("k", &config).unwrap().allowed);

        // a fixed window would reset here; the trailing second still holds two
        clock.set_time(1_000);
        assert!(!limiter.try_acquire("k", &config).unwrap().allowed);
        clock.set_time(1_899);
        assert!(!limiter.try_acquire("k", &config).unwrap().allowed);
        clock.set_time(1_900);
        assert!(limiter.try_acquire("k", &config).unwrap().allowed);
    }

    #[test]
    fn retry_after_tracks_oldest_admission() {
        let clock = TestClock::new(5_000);
        let limiter = SlidingWindowLimiter::new(clock.clone());
        let config = RateLimitConfig::new(1, 10, TimeUnit::Seconds);

        assert!(limiter.try_acquire("k", &config).unwrap().allowed);
        clock.advance(2_500);
        let rejected = limiter.try_acquire("k", &config).unwrap();
        assert!(!rejected.allowed);
        assert_eq!(rejected.reset_at_millis, 15_000);
        // 7.5s left, rounded up
        assert_eq!(rejected.retry_after_seconds, 8);
    }

    #[test]
    fn rejected_requests_are_not_recorded() {
        let clock = TestClock::new(0);
        let limiter = SlidingWindowLimiter::new(clock.clone());
        let config = RateLimitConfig::new(1, 1, TimeUnit::Seconds);

        assert!(limiter.try_acquire("k", &config).unwrap().allowed);
        for t in [100, 300, 700, 999] {
            clock.set_time(t);
            assert!(!limiter.try_acquire("k", &config).unwrap().allowed);
        }
        // only the t=0 admission counted, so t=1000 is clear
        clock.set_time(1_000);
        assert!(limiter.try_acquire("k", &config).unwrap().allowed);
    }

    #[test]
    fn quota_holds_for_every_trailing_interval() {
        let clock = TestClock::new(0);
        let limiter = SlidingWindowLimiter::new(clock.clone());
        let window = 1_000;
        let config = RateLimitConfig::new(4, window, TimeUnit::Milliseconds);

        let mut admitted = Vec::new();
        for t in (0..5_000u64).step_by(70) {
            clock.set_time(t);
            if limiter.try_acquire("k", &config).unwrap().allowed {
                admitted.push(t);
            }
        }

        assert!(!admitted.is_empty());
        for &start in &admitted {
            let in_interval = admitted
                .iter()
                .filter(|&&t| t >= start && t < start + window)
                .count();
            assert!(in_interval <= 4, "{in_interval} admissions after t={start}");
        }
    }

    #[test]
    fn remaining_is_non_increasing_within_window() {
        let clock = TestClock::new(0);
        let limiter = SlidingWindowLimiter::new(clock.clone());
        let config = RateLimitConfig::new(5, 1, TimeUnit::Seconds);

        let mut last = u64::MAX;
        for _ in 0..5 {
            clock.advance(10);
            let result = limiter.try_acquire("k", &config).unwrap();
            assert!(result.allowed);
            assert!(result.remaining < last);
            last = result.remaining;
        }
        assert_eq!(last, 0);
    }
}
