//! Common test utilities for treeharvest integration tests

#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;

use std::time::Duration;
use treeharvest::{Config, RetryConfig};

/// Config pointing at a mock server, with fast retries for test speed
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.api.account = "acme".into();
    config.api.auth_key = "test-auth-key".into();
    config.api.endpoints.list = format!("{base_url}/get_order");
    config.api.endpoints.detail = format!("{base_url}/get_order_detail");
    config.api.endpoints.expansion = format!("{base_url}/get_order_component");
    config.api.request_timeout = Duration::from_secs(5);
    config.retry = RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(20),
        max_delay: Duration::from_secs(1),
        backoff_multiplier: 2.0,
        jitter: false,
    };
    config
}
