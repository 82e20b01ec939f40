//! Request and response types for the ResolvePay customer and credit APIs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Payment terms a customer can be invoiced on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentTerms {
    Net7,
    Net10,
    Net15,
    Net30,
    Net45,
    Net60,
    Net90,
}

impl PaymentTerms {
    pub const ALL: [PaymentTerms; 7] = [
        PaymentTerms::Net7,
        PaymentTerms::Net10,
        PaymentTerms::Net15,
        PaymentTerms::Net30,
        PaymentTerms::Net45,
        PaymentTerms::Net60,
        PaymentTerms::Net90,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentTerms::Net7 => "net7",
            PaymentTerms::Net10 => "net10",
            PaymentTerms::Net15 => "net15",
            PaymentTerms::Net30 => "net30",
            PaymentTerms::Net45 => "net45",
            PaymentTerms::Net60 => "net60",
            PaymentTerms::Net90 => "net90",
        }
    }
}

impl fmt::Display for PaymentTerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentTerms {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentTerms::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid default_terms: {}. Expected one of net7, net10, net15, net30, net45, net60, net90",
                    s
                )
            })
    }
}

/// Credit check lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditCheckStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    Approved,
    Denied,
}

/// Body of `POST customers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRequest {
    pub business_name: String,
    pub business_address: String,
    pub business_city: String,
    pub business_state: String,
    pub business_zip: String,
    pub business_country: String,
    pub business_ap_email: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_ap_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_ap_phone_extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_terms: Option<PaymentTerms>,
}

/// Customer as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub id: String,
    pub business_name: String,
    pub business_address: String,
    pub business_city: String,
    pub business_state: String,
    pub business_zip: String,
    pub business_country: String,
    pub business_ap_email: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub amount_approved: Option<f64>,
    #[serde(default)]
    pub amount_available: Option<f64>,
    #[serde(default)]
    pub business_ap_phone: Option<String>,
    #[serde(default)]
    pub business_ap_phone_extension: Option<String>,
    #[serde(default)]
    pub default_terms: Option<String>,
    #[serde(default)]
    pub credit_status: Option<String>,
}

/// Body of `POST customers/{id}/credit-check`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCheckRequest {
    pub amount_requested: f64,
    #[serde(default)]
    pub has_purchase_history: bool,
}

/// Credit check state for a customer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreditCheckResult {
    #[serde(default)]
    pub customer_id: String,
    #[serde(default, deserialize_with = "status_or_pending")]
    pub status: CreditCheckStatus,
    #[serde(default)]
    pub amount_approved: Option<f64>,
    #[serde(default)]
    pub amount_available: Option<f64>,
    #[serde(default)]
    pub credit_limit: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Criteria for `GET customers`.
///
/// `filters` holds business fields matched exactly; `page` wins over
/// `offset` when both are given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub filters: Map<String, Value>,
    pub page: Option<u32>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerPage {
    pub customers: Vec<CustomerResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

// A `null` or empty status means the check has not started yet.
fn status_or_pending<'de, D>(deserializer: D) -> Result<CreditCheckStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::IntoDeserializer;

    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(CreditCheckStatus::Pending),
        Some(status) => {
            CreditCheckStatus::deserialize(IntoDeserializer::<D::Error>::into_deserializer(status))
        }
    }
}
