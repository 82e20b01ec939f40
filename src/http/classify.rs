//! Maps a completed HTTP exchange to decoded JSON or a typed failure.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value, json};
use std::time::Duration;

use crate::error::{ApiError, Details};

const UNKNOWN_ERROR: &str = "Unknown error";

/// The request a response belongs to, for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    pub method: &'a Method,
    pub url: &'a str,
}

/// Classifies a response. First matching rule wins:
/// 401, 429, 404, 400/422, any other non-2xx, 204, then success.
pub fn classify(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    request: RequestInfo<'_>,
) -> Result<Value, ApiError> {
    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::authentication(
            "Authentication failed. Check merchant_id and api_key.",
        )),
        StatusCode::TOO_MANY_REQUESTS => Err(ApiError::RateLimited {
            message: "Rate limit exceeded".to_string(),
            retry_after: retry_after(headers),
            details: details([("status_code", json!(429))]),
        }),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound {
            resource: request.url.to_string(),
            message: "Resource not found".to_string(),
            details: details([
                ("url", json!(request.url)),
                ("method", json!(request.method.as_str())),
            ]),
        }),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            let data = decode_json(body);
            let label = if status == StatusCode::BAD_REQUEST {
                "Validation error"
            } else {
                "Business validation error"
            };
            let message = extract_error_message(data.as_ref(), body)
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());

            Err(ApiError::Validation {
                message: format!("{}: {}", label, message),
                details: details([
                    ("status_code", json!(status.as_u16())),
                    ("response_data", data.unwrap_or(Value::Null)),
                ]),
            })
        }
        s if !s.is_success() => {
            let data = decode_json(body);
            let message = extract_error_message(data.as_ref(), body)
                .unwrap_or_else(|| format!("API request failed with status {}", s.as_u16()));
            let body = match data {
                Some(value) => value,
                None if body.is_empty() => Value::Null,
                None => Value::String(body.to_string()),
            };

            Err(ApiError::Api {
                status: s.as_u16(),
                message,
                details: details([
                    ("status_code", json!(s.as_u16())),
                    ("response_data", body.clone()),
                ]),
                body,
            })
        }
        StatusCode::NO_CONTENT => Ok(Value::Object(Map::new())),
        _ if body.is_empty() => Ok(Value::Object(Map::new())),
        _ => Ok(decode_json(body).unwrap_or_else(|| json!({ "raw_response": body }))),
    }
}

/// Parses `Retry-After` as integer seconds.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Decodes a body as JSON; malformed or empty bodies yield `None`.
fn decode_json(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    serde_json::from_str(body).ok()
}

/// Pulls a readable message out of an error body.
///
/// Prefers `error.message` (with `error.details[]` appended as
/// `path: message`), then a top-level `message`, then the raw text.
pub fn extract_error_message(data: Option<&Value>, text: &str) -> Option<String> {
    if let Some(obj) = data.and_then(Value::as_object) {
        if let Some(error) = obj.get("error") {
            return Some(structured_error_message(error));
        }
        if let Some(message) = obj.get("message").and_then(Value::as_str) {
            return Some(message.to_string());
        }
    }

    (!text.is_empty()).then(|| text.to_string())
}

fn structured_error_message(error: &Value) -> String {
    let Some(error) = error.as_object() else {
        return error.as_str().unwrap_or(UNKNOWN_ERROR).to_string();
    };

    let mut message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_ERROR)
        .to_string();

    if let Some(entries) = error.get("details").and_then(Value::as_array) {
        let formatted: Vec<String> = entries
            .iter()
            .map(|d| {
                let path = d.get("path").and_then(Value::as_str).unwrap_or("field");
                let msg = d.get("message").and_then(Value::as_str).unwrap_or("error");
                format!("{}: {}", path, msg)
            })
            .collect();
        if !formatted.is_empty() {
            message.push_str(" - ");
            message.push_str(&formatted.join(", "));
        }
    }

    message
}

fn details<const N: usize>(entries: [(&str, Value); N]) -> Details {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
