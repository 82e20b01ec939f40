//! Connector configuration.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::error::ApiError;
use crate::http::{DEFAULT_CALLS_PER_SECOND, DEFAULT_MAX_RETRIES};

pub const DEFAULT_BASE_URL: &str = "https://api.resolvepay.com/v5";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for one connector instance.
///
/// Deserializes from the same JSON settings object the tool host passes in;
/// anything omitted falls back to the defaults.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectorConfig {
    pub merchant_id: String,
    pub api_key: String,
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout: u64,
    pub max_retries: u32,
    pub rate_limit_calls_per_second: u32,
    pub debug_mode: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            merchant_id: String::new(),
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            rate_limit_calls_per_second: DEFAULT_CALLS_PER_SECOND,
            debug_mode: false,
        }
    }
}

impl fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("merchant_id", &self.merchant_id)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("rate_limit_calls_per_second", &self.rate_limit_calls_per_second)
            .field("debug_mode", &self.debug_mode)
            .finish()
    }
}

impl ConnectorConfig {
    /// Configuration with default URL, timeout, retries and rate limit.
    pub fn new(merchant_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Request timeout in seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = secs;
        self
    }

    /// Retries after the first attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Calls per second; 0 disables limiting.
    pub fn with_rate_limit(mut self, calls_per_second: u32) -> Self {
        self.rate_limit_calls_per_second = calls_per_second;
        self
    }

    /// Records that debug logging was requested.
    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// Builds and validates a config from a JSON settings object.
    pub fn from_settings(settings: &Value) -> Result<Self, ApiError> {
        let config: Self = serde_json::from_value(settings.clone())
            .map_err(|e| ApiError::configuration(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.merchant_id.is_empty() {
            return Err(ApiError::configuration("merchant_id is required"));
        }
        if self.api_key.is_empty() {
            return Err(ApiError::configuration("api_key is required"));
        }
        if self.base_url.trim().is_empty() {
            return Err(ApiError::configuration("base_url cannot be empty"));
        }
        if self.timeout == 0 {
            return Err(ApiError::configuration("timeout must be greater than 0"));
        }
        Ok(())
    }

    /// Timeout as a `Duration`.
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
