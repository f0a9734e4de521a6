// tests/ratelimiter/config_tests.rs

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use window_guard::{
        Algorithm, Dimension, ManagerConfig, RateLimitConfig, RateLimitError, TimeUnit,
    };

    // Config validation tests
    #[test]
    fn config_rejects_zero_limit() {
        let config = RateLimitConfig::new(0, 1, TimeUnit::Seconds);
        let result = config.validate();
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), RateLimitError::InvalidLimit));
    }

    #[test]
    fn config_rejects_zero_window() {
        let config = RateLimitConfig::new(10, 0, TimeUnit::Seconds);
        let result = config.validate();
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), RateLimitError::InvalidWindow));
    }

    #[test]
    fn config_accepts_valid_parameters() {
        let config = RateLimitConfig::new(10, 500, TimeUnit::Milliseconds);
        assert!(config.validate().is_ok());
        assert_eq!(config.window_millis().unwrap(), 500);
    }

    // Test config builder pattern
    #[test]
    fn config_builder_pattern_works() {
        let config = RateLimitConfig::default()
            .limit(5)
            .window(2, TimeUnit::Hours)
            .algorithm(Algorithm::FixedWindow)
            .dimension(Dimension::Custom)
            .key_prefix("orders")
            .custom_key_template("biz_#arg0")
            .message("slow down");

        assert!(config.validate().is_ok());
        assert_eq!(config.get_limit(), 5);
        assert_eq!(config.window_millis().unwrap(), 7_200_000);
        assert_eq!(config.get_algorithm(), Algorithm::FixedWindow);
        assert_eq!(config.get_dimension(), Dimension::Custom);
        assert_eq!(config.get_key_prefix(), "orders");
        assert_eq!(config.get_custom_key_template(), Some("biz_#arg0"));
        assert_eq!(config.get_message(), "slow down");
        assert_eq!(config.limit_info(), "5 requests per 2 hours");
    }

    #[test]
    fn defaults_use_sliding_window_per_ip() {
        let config = RateLimitConfig::default();
        assert_eq!(config.get_algorithm(), Algorithm::SlidingWindow);
        assert_eq!(config.get_dimension(), Dimension::Ip);
        assert!(config.is_enabled());
        assert!(config.get_key_prefix().is_empty());
    }

    #[test]
    fn config_deserializes_from_toml() {
        let config: RateLimitConfig = toml::from_str(
            r#"
            limit = 3
            window = 30
            unit = "minutes"
            algorithm = "fixed_window"
            dimension = "custom"
            custom_key_template = "tenant_#arg0.tenant"
            "#,
        )
        .unwrap();

        assert_eq!(config.get_limit(), 3);
        assert_eq!(config.window_millis().unwrap(), 1_800_000);
        assert_eq!(config.get_algorithm(), Algorithm::FixedWindow);
        assert_eq!(config.get_dimension(), Dimension::Custom);
        assert_eq!(config.get_custom_key_template(), Some("tenant_#arg0.tenant"));
        assert!(config.is_enabled());
    }

    #[test]
    fn manager_config_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.get_cleanup_interval(), Duration::from_secs(300));
        assert_eq!(config.get_stale_after(), Duration::from_secs(3600));
    }

    #[test]
    fn manager_config_deserializes_from_toml() {
        let config: ManagerConfig = toml::from_str(
            r#"
            cleanup_interval_secs = 60
            shutdown_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.get_cleanup_interval(), Duration::from_secs(60));
        assert_eq!(config.get_stale_after(), Duration::from_secs(3600));
        assert_eq!(config.get_shutdown_timeout(), Duration::from_millis(250));
    }
}
