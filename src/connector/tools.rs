//! Tool catalog and argument handling for the MCP surface.

use serde_json::{Map, Value, json};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;
use crate::models::PaymentTerms;

/// Tools exposed by the connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    CreateCustomer,
    GetCustomer,
    UpdateCustomer,
    SearchCustomers,
    RequestCreditCheck,
    GetCreditCheckStatus,
    ValidateCustomerData,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::CreateCustomer,
        Tool::GetCustomer,
        Tool::UpdateCustomer,
        Tool::SearchCustomers,
        Tool::RequestCreditCheck,
        Tool::GetCreditCheckStatus,
        Tool::ValidateCustomerData,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::CreateCustomer => "create_customer",
            Tool::GetCustomer => "get_customer",
            Tool::UpdateCustomer => "update_customer",
            Tool::SearchCustomers => "search_customers",
            Tool::RequestCreditCheck => "request_customer_credit_check",
            Tool::GetCreditCheckStatus => "get_credit_check_status",
            Tool::ValidateCustomerData => "validate_customer_data",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::CreateCustomer => {
                "Create a new business customer in ResolvePay with complete business information, \
                 contact details and payment terms. All required fields are validated before the \
                 customer record is created."
            }
            Tool::GetCustomer => {
                "Retrieve a customer by its unique ID, including business details, contact \
                 information, credit status and available credit."
            }
            Tool::UpdateCustomer => {
                "Update an existing customer. Only the provided fields are changed; omitted \
                 fields keep their current values."
            }
            Tool::SearchCustomers => {
                "Search customers by exact business name, email or other business details, \
                 with pagination for large result sets."
            }
            Tool::RequestCreditCheck => {
                "Start a credit check for an existing customer to determine creditworthiness \
                 and available credit. Follow up with get_credit_check_status."
            }
            Tool::GetCreditCheckStatus => {
                "Retrieve the current credit check status for a customer, including approval \
                 status, approved amount and credit limit."
            }
            Tool::ValidateCustomerData => {
                "Validate customer data for format and completeness without creating or \
                 modifying any records."
            }
        }
    }

    /// JSON Schema for the tool's arguments.
    pub fn input_schema(&self) -> Value {
        match self {
            Tool::CreateCustomer => json!({
                "type": "object",
                "properties": customer_properties(""),
                "required": crate::validation::REQUIRED_CUSTOMER_FIELDS,
            }),
            Tool::GetCustomer | Tool::GetCreditCheckStatus => json!({
                "type": "object",
                "properties": {"customer_id": customer_id_property()},
                "required": ["customer_id"],
            }),
            Tool::UpdateCustomer => {
                let mut properties = customer_properties("Updated ");
                properties.insert("customer_id".to_string(), customer_id_property());
                json!({
                    "type": "object",
                    "properties": properties,
                    "required": ["customer_id"],
                })
            }
            Tool::SearchCustomers => json!({
                "type": "object",
                "properties": {
                    "business_name": {"type": "string", "description": "Exact business name"},
                    "email": {"type": "string", "description": "Primary contact email address"},
                    "business_ap_email": {"type": "string", "description": "Accounts payable email address"},
                    "business_city": {"type": "string", "description": "Business city"},
                    "business_state": {"type": "string", "description": "Business state/province"},
                    "business_zip": {"type": "string", "description": "Business ZIP/postal code"},
                    "business_country": {"type": "string", "description": "Business country code"},
                    "page": {"type": "integer", "minimum": 1, "description": "Page number (default: 1)"},
                    "offset": {"type": "integer", "minimum": 0, "description": "Records to skip; converted to a page when page is absent"},
                    "limit": {"type": "integer", "minimum": 25, "maximum": 100, "description": "Results per page, clamped to 25-100 (default: 25)"}
                },
                "required": [],
            }),
            Tool::RequestCreditCheck => json!({
                "type": "object",
                "properties": {
                    "customer_id": customer_id_property(),
                    "amount_requested": {"type": "number", "description": "Amount of credit to evaluate"},
                    "has_purchase_history": {"type": "boolean", "description": "Whether the customer has bought from the merchant before (default: false)"}
                },
                "required": ["customer_id", "amount_requested"],
            }),
            Tool::ValidateCustomerData => json!({
                "type": "object",
                "properties": customer_properties(""),
                "required": [],
            }),
        }
    }

    /// Catalog entry as served by `tools/list`.
    pub fn definition(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
        })
    }

    /// Summary used in the `message` field of a failed call.
    pub(crate) fn failure_summary(&self, error: &ApiError) -> &'static str {
        match (self, error) {
            (Tool::GetCustomer, ApiError::NotFound { .. }) => "Customer not found",
            (Tool::CreateCustomer, _) => "Failed to create customer",
            (Tool::GetCustomer, _) => "Failed to retrieve customer",
            (Tool::UpdateCustomer, _) => "Failed to update customer",
            (Tool::SearchCustomers, _) => "Failed to search customers",
            (Tool::RequestCreditCheck, _) => "Failed to request credit check",
            (Tool::GetCreditCheckStatus, _) => "Failed to get credit check status",
            (Tool::ValidateCustomerData, _) => "Failed to validate customer data",
        }
    }

    /// Uniform result for a failed call.
    pub(crate) fn failure(&self, error: &ApiError) -> Value {
        let mut result = json!({
            "success": false,
            "error": error.message(),
            "error_type": error.kind(),
            "message": self.failure_summary(error),
        });
        match self {
            Tool::CreateCustomer | Tool::GetCustomer | Tool::UpdateCustomer => {
                result["customer"] = Value::Null;
            }
            Tool::SearchCustomers => {
                result["customers"] = json!([]);
                result["total"] = json!(0);
            }
            Tool::RequestCreditCheck | Tool::GetCreditCheckStatus => {
                result["credit_check"] = Value::Null;
            }
            Tool::ValidateCustomerData => {
                result["valid"] = json!(false);
            }
        }
        result
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}

/// Every tool's catalog entry.
pub fn tool_definitions() -> Vec<Value> {
    Tool::ALL.iter().map(Tool::definition).collect()
}

fn customer_id_property() -> Value {
    json!({"type": "string", "description": "Unique ResolvePay customer ID"})
}

fn customer_properties(prefix: &str) -> Map<String, Value> {
    let terms: Vec<&str> = PaymentTerms::ALL.iter().map(PaymentTerms::as_str).collect();
    let field = |description: &str| {
        json!({"type": "string", "description": format!("{}{}", prefix, description)})
    };

    let mut properties = Map::new();
    properties.insert("business_name".into(), field("legal business name"));
    properties.insert("business_address".into(), field("street address of the business"));
    properties.insert("business_city".into(), field("city of the business"));
    properties.insert("business_state".into(), field("state/province code (e.g., NY, CA)"));
    properties.insert("business_zip".into(), field("ZIP/postal code"));
    properties.insert(
        "business_country".into(),
        field("2-letter ISO country code (e.g., US, CA)"),
    );
    properties.insert("business_ap_email".into(), field("accounts payable email address"));
    properties.insert("email".into(), field("primary contact email address"));
    properties.insert(
        "business_ap_phone".into(),
        field("phone number in ###-###-#### format (optional)"),
    );
    properties.insert(
        "business_ap_phone_extension".into(),
        field("phone extension (optional)"),
    );
    properties.insert(
        "default_terms".into(),
        json!({
            "type": "string",
            "enum": terms,
            "description": format!("{}default payment terms (optional)", prefix),
        }),
    );
    properties
}

/// Non-empty string argument.
pub(crate) fn required_str(args: &Map<String, Value>, key: &str) -> Result<String, ApiError> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::validation(format!("{} is required", key)))
}

/// Optional unsigned integer, given as a JSON number or a numeric string.
pub(crate) fn optional_u32(args: &Map<String, Value>, key: &str) -> Result<Option<u32>, ApiError> {
    let invalid = || ApiError::validation(format!("{} must be a non-negative integer", key));
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<u32>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}
