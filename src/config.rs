//! Runtime configuration
//!
//! Environment-driven configuration for the resolver pipeline. Credentials
//! for the LLM providers are read by the clients themselves; this covers the
//! retailer endpoints and the retry/timeout policy.

use std::time::Duration;

/// Walmart affiliate API base (search, lookup).
pub const DEFAULT_AFFILIATE_BASE: &str =
    "https://developer.api.walmart.com/api-proxy/service/affil/product/v2";

/// Cart-import endpoint the checkout URL points at.
pub const DEFAULT_CART_BASE: &str = "https://affil.walmart.com/cart/addToCart";

const DEFAULT_MAX_RETRIES: u32 = 1;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolver pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL for the affiliate product API.
    pub affiliate_base_url: String,
    /// Base URL for the generated checkout link.
    pub cart_base_url: String,
    /// Affiliate consumer id, sent as `WM_CONSUMER.ID`.
    pub consumer_id: Option<String>,
    /// Affiliate key version, sent as `WM_SEC.KEY_VERSION`.
    pub key_version: String,
    /// Maximum retries per shopping-list item (total attempts = retries + 1).
    pub max_retries: u32,
    /// Timeout applied to each external call (search and oracle).
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            affiliate_base_url: DEFAULT_AFFILIATE_BASE.to_string(),
            cart_base_url: DEFAULT_CART_BASE.to_string(),
            consumer_id: None,
            key_version: "1".to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            affiliate_base_url: std::env::var("WALMART_AFFILIATE_BASE_URL")
                .unwrap_or(defaults.affiliate_base_url),
            cart_base_url: std::env::var("WALMART_CART_BASE_URL")
                .unwrap_or(defaults.cart_base_url),
            consumer_id: std::env::var("WALMART_CONSUMER_ID").ok(),
            key_version: std::env::var("WALMART_KEY_VERSION").unwrap_or(defaults.key_version),
            max_retries: std::env::var("MAX_ITEM_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            request_timeout: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.cart_base_url, DEFAULT_CART_BASE);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.consumer_id.is_none());
    }
}
