//! Typed failures returned by the ResolvePay client and connector.

use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Structured diagnostics attached to a failure.
pub type Details = Map<String, Value>;

/// Errors produced while talking to the ResolvePay API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials were rejected (HTTP 401) or could not be rendered.
    #[error("{message}")]
    Authentication { message: String, details: Details },

    /// Request data was rejected locally or by the API (HTTP 400/422).
    #[error("{message}")]
    Validation { message: String, details: Details },

    /// Too many requests (HTTP 429).
    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
        details: Details,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("{message}")]
    NotFound {
        resource: String,
        message: String,
        details: Details,
    },

    /// Any other non-success outcome.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        body: Value,
        details: Details,
    },

    /// Invalid construction-time input. Never retried.
    #[error("{message}")]
    Configuration { message: String },
}

impl ApiError {
    /// Authentication failure with no details.
    pub fn authentication(message: impl Into<String>) -> Self {
        ApiError::Authentication {
            message: message.into(),
            details: Details::new(),
        }
    }

    /// Local validation failure with no details.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Details::new(),
        }
    }

    /// Invalid connector configuration.
    pub fn configuration(message: impl Into<String>) -> Self {
        ApiError::Configuration {
            message: message.into(),
        }
    }

    /// Generic API failure with no response body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        ApiError::Api {
            status,
            message: message.into(),
            body: Value::Null,
            details: Details::new(),
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Authentication { message, .. }
            | ApiError::Validation { message, .. }
            | ApiError::RateLimited { message, .. }
            | ApiError::NotFound { message, .. }
            | ApiError::Api { message, .. }
            | ApiError::Configuration { message } => message,
        }
    }

    /// Structured diagnostics, if any were recorded.
    pub fn details(&self) -> Option<&Details> {
        let details = match self {
            ApiError::Authentication { details, .. }
            | ApiError::Validation { details, .. }
            | ApiError::RateLimited { details, .. }
            | ApiError::NotFound { details, .. }
            | ApiError::Api { details, .. } => details,
            ApiError::Configuration { .. } => return None,
        };
        (!details.is_empty()).then_some(details)
    }

    /// HTTP status associated with the failure, when there is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Authentication { .. } => Some(401),
            ApiError::RateLimited { .. } => Some(429),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Validation { details, .. } => details
                .get("status_code")
                .and_then(Value::as_u64)
                .and_then(|s| u16::try_from(s).ok()),
            ApiError::Configuration { .. } => None,
        }
    }

    /// Whether the same call might succeed later without changes.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RateLimited { .. } => true,
            ApiError::Api { status, .. } => {
                *status == 408
                    || crate::http::RETRYABLE_STATUSES
                        .iter()
                        .any(|s| s.as_u16() == *status)
            }
            _ => false,
        }
    }

    /// Short label for the failure category, used in tool results.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Authentication { .. } => "authentication",
            ApiError::Validation { .. } => "validation",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Api { .. } => "api",
            ApiError::Configuration { .. } => "configuration",
        }
    }
}
