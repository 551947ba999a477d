// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::StatusCode;

use crate::error::Result;
use crate::models::ApiConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &ApiConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Statuses worth another attempt: rate limiting and flaky upstreams.
pub fn is_retryable(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502..=504)
}

/// Exponential backoff for the given retry (0-based), capped.
pub fn calculate_backoff(config: &ApiConfig, retry: u32) -> Duration {
    let factor = 2u64.saturating_pow(retry);
    let delay_ms = config
        .retry_wait_ms
        .saturating_mul(factor)
        .min(config.retry_max_wait_ms);
    Duration::from_millis(delay_ms)
}
