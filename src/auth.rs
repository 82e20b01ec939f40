//! Basic-auth credentials for the ResolvePay API.

use base64::prelude::*;
use log::info;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::fmt;
use std::sync::RwLock;

use crate::error::ApiError;

/// Merchant identifier and API key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub merchant_id: String,
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("merchant_id", &self.merchant_id)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    fn checked(merchant_id: &str, api_key: &str) -> Result<Self, ApiError> {
        if merchant_id.is_empty() {
            return Err(ApiError::configuration(
                "merchant_id is required for authentication",
            ));
        }
        if api_key.is_empty() {
            return Err(ApiError::configuration(
                "api_key is required for authentication",
            ));
        }
        Ok(Self {
            merchant_id: merchant_id.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

/// Renders credentials into request headers.
///
/// Credentials can be swapped at runtime with [`Auth::replace`]; both fields
/// change together or not at all.
#[derive(Debug)]
pub struct Auth {
    credentials: RwLock<Credentials>,
}

impl Auth {
    /// Credentials for one merchant; both values must be non-empty.
    pub fn new(merchant_id: &str, api_key: &str) -> Result<Self, ApiError> {
        Ok(Self {
            credentials: RwLock::new(Credentials::checked(merchant_id, api_key)?),
        })
    }

    /// Snapshot of the current credentials.
    pub fn credentials(&self) -> Credentials {
        self.credentials
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Builds the `Authorization`, `Content-Type` and `Accept` headers.
    pub fn headers(&self) -> Result<HeaderMap, ApiError> {
        let creds = self.credentials();
        let encoded = BASE64_STANDARD.encode(format!("{}:{}", creds.merchant_id, creds.api_key));

        let mut auth_value = HeaderValue::from_str(&format!("Basic {}", encoded)).map_err(|e| {
            ApiError::authentication(format!("Authentication header creation failed: {}", e))
        })?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// True when both fields are non-blank.
    pub fn is_valid(&self) -> bool {
        let creds = self.credentials();
        !creds.merchant_id.trim().is_empty() && !creds.api_key.trim().is_empty()
    }

    /// Replaces both credentials. Nothing changes if either value is empty.
    pub fn replace(&self, merchant_id: &str, api_key: &str) -> Result<(), ApiError> {
        if merchant_id.is_empty() {
            return Err(ApiError::configuration("merchant_id cannot be empty"));
        }
        if api_key.is_empty() {
            return Err(ApiError::configuration("api_key cannot be empty"));
        }

        let mut creds = self.credentials.write().unwrap_or_else(|e| e.into_inner());
        *creds = Credentials {
            merchant_id: merchant_id.to_string(),
            api_key: api_key.to_string(),
        };
        info!("Authentication credentials updated");
        Ok(())
    }
}
