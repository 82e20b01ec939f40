//! Local checks on customer data before it is sent to the API.

use log::warn;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::error::ApiError;
use crate::models::PaymentTerms;

pub const REQUIRED_CUSTOMER_FIELDS: [&str; 8] = [
    "business_name",
    "business_address",
    "business_city",
    "business_state",
    "business_zip",
    "business_country",
    "business_ap_email",
    "email",
];

const SENSITIVE_KEYS: [&str; 4] = ["api_key", "password", "secret", "token"];

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

// ResolvePay only accepts US numbers written as ###-###-####.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-\d{3}-\d{4}$").expect("valid phone regex"));

/// Whether `email` looks like a deliverable address.
pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && EMAIL_PATTERN.is_match(email)
}

/// Two-letter ISO 3166-1 alpha-2 code.
pub fn validate_country_code(code: &str) -> bool {
    code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Whether `phone` is written as ###-###-####.
pub fn validate_phone_number(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

fn non_empty_str<'a>(data: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    data.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Validates customer fields. With `is_update` only the supplied fields are
/// checked; otherwise every required field must be present.
pub fn validate_customer_data(data: &Map<String, Value>, is_update: bool) -> Result<(), ApiError> {
    if !is_update {
        let missing: Vec<&str> = REQUIRED_CUSTOMER_FIELDS
            .into_iter()
            .filter(|field| non_empty_str(data, field).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
    }

    if let Some(country) = non_empty_str(data, "business_country") {
        if !validate_country_code(country) {
            return Err(ApiError::validation(
                "business_country must be a 2-letter ISO 3166-1 country code",
            ));
        }
    }

    for field in ["email", "business_ap_email"] {
        if let Some(email) = non_empty_str(data, field) {
            if !validate_email(email) {
                return Err(ApiError::validation(format!(
                    "Invalid email format for {}",
                    field
                )));
            }
        }
    }

    if let Some(phone) = non_empty_str(data, "business_ap_phone") {
        if !validate_phone_number(phone) {
            return Err(ApiError::validation(format!(
                "Invalid phone number format. Must be ###-###-#### (e.g., 212-555-0123), got: {}",
                phone
            )));
        }
        if phone.starts_with("555-") {
            warn!(
                "Phone number {} uses the 555 area code which ResolvePay may reject",
                phone
            );
        }
    }

    if let Some(terms) = non_empty_str(data, "default_terms") {
        terms.parse::<PaymentTerms>().map_err(ApiError::validation)?;
    }

    Ok(())
}

/// Trims business fields, upper-cases state and country, lower-cases emails.
pub fn normalize_business_data(data: &Map<String, Value>) -> Map<String, Value> {
    let mut normalized = data.clone();

    for (field, value) in normalized.iter_mut() {
        let Some(s) = value.as_str() else { continue };
        let updated = match field.as_str() {
            "business_name" | "business_address" | "business_city" | "business_zip" => {
                s.trim().to_string()
            }
            "business_state" | "business_country" => s.trim().to_uppercase(),
            "email" | "business_ap_email" => s.trim().to_lowercase(),
            _ => continue,
        };
        *value = Value::String(updated);
    }

    normalized
}

/// Copy of `data` with secret-looking keys replaced by `[REDACTED]`.
pub fn sanitize_response_data(data: &Value) -> Value {
    match data {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let lower = key.to_lowercase();
                    let value = if SENSITIVE_KEYS.iter().any(|s| lower.contains(s)) {
                        Value::String("[REDACTED]".to_string())
                    } else {
                        sanitize_response_data(value)
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_response_data).collect()),
        other => other.clone(),
    }
}

/// Builds `filter[field][eq]` query parameters from search criteria.
pub fn build_search_filters(criteria: &Map<String, Value>) -> Vec<(String, String)> {
    const FILTERABLE: [&str; 7] = [
        "email",
        "business_name",
        "business_ap_email",
        "business_city",
        "business_state",
        "business_zip",
        "business_country",
    ];

    let normalized = normalize_business_data(criteria);
    FILTERABLE
        .into_iter()
        .filter_map(|field| {
            non_empty_str(&normalized, field)
                .map(|value| (format!("filter[{}][eq]", field), value.to_string()))
        })
        .collect()
}
