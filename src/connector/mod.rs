//! ResolvePay customer and credit operations, and their tool dispatch.

mod tools;

pub use tools::{Tool, tool_definitions};

use async_trait::async_trait;
use log::{error, info};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::auth::Auth;
use crate::config::ConnectorConfig;
use crate::error::{ApiError, Details};
use crate::http::{HttpClient, RateLimiter};
use crate::mcp::ToolHandler;
use crate::models::{
    CreditCheckRequest, CreditCheckResult, CustomerPage, CustomerRequest, CustomerResponse,
    SearchCriteria,
};
use crate::validation::{
    build_search_filters, normalize_business_data, sanitize_response_data, validate_customer_data,
};
use tools::{optional_u32, required_str};

pub const MIN_PAGE_SIZE: u32 = 25;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Connector for one ResolvePay merchant account.
pub struct Connector {
    config: ConnectorConfig,
    auth: Arc<Auth>,
    rate_limiter: Arc<RateLimiter>,
    http: HttpClient,
}

impl Connector {
    /// Validates `config` and builds the shared HTTP client.
    pub fn new(config: ConnectorConfig) -> Result<Self, ApiError> {
        config.validate()?;

        let auth = Arc::new(Auth::new(&config.merchant_id, &config.api_key)?);
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit_calls_per_second));
        let http = HttpClient::new(&config, auth.clone(), rate_limiter.clone())?;

        info!("ResolvePay connector initialized for {}", http.base_url());
        Ok(Self {
            config,
            auth,
            rate_limiter,
            http,
        })
    }

    /// Configuration the connector was built with.
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Credentials used for every request; see [`Auth::replace`] for rotation.
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Limiter shared by every request.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    #[tracing::instrument(skip(self, request), fields(business_name = %request.business_name))]
    pub async fn create_customer(
        &self,
        request: &CustomerRequest,
    ) -> Result<CustomerResponse, ApiError> {
        let body = customer_body(request)?;
        if let Value::Object(fields) = &body {
            validate_customer_data(fields, false)?;
        }
        self.post_customer(&body).await
    }

    async fn post_customer(&self, body: &Value) -> Result<CustomerResponse, ApiError> {
        let response = self.http.post("customers", body).await?;
        decode(&response)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: &str) -> Result<CustomerResponse, ApiError> {
        let response = self.fetch_customer(customer_id).await?;
        decode(&response)
    }

    async fn fetch_customer(&self, customer_id: &str) -> Result<Value, ApiError> {
        let path = customer_path(customer_id)?;
        self.http.get(&path, None).await.map_err(|e| match e {
            ApiError::NotFound { details, .. } => ApiError::NotFound {
                resource: customer_id.to_string(),
                message: format!("Customer not found: {}", customer_id),
                details,
            },
            other => other,
        })
    }

    /// Partial update; only the given fields are sent.
    #[tracing::instrument(skip(self, fields))]
    pub async fn update_customer(
        &self,
        customer_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<CustomerResponse, ApiError> {
        let path = customer_path(customer_id)?;
        let fields = normalize_business_data(fields);
        if !fields.is_empty() {
            validate_customer_data(&fields, true)?;
        }

        let response = self.http.put(&path, &Value::Object(fields)).await?;
        decode(&response)
    }

    #[tracing::instrument(skip(self))]
    pub async fn search_customers(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<CustomerPage, ApiError> {
        let mut query = build_search_filters(&criteria.filters);

        let limit = criteria
            .limit
            .filter(|limit| *limit > 0)
            .map(|limit| limit.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE));
        let page = match (criteria.page, criteria.offset) {
            (Some(page), _) if page > 0 => Some(page),
            (_, Some(offset)) if offset > 0 => Some(offset / limit.unwrap_or(MIN_PAGE_SIZE) + 1),
            _ => None,
        };
        if let Some(page) = page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit".to_string(), limit.to_string()));
        }

        let response = self.http.get("customers", Some(&query)).await?;

        let (items, total): (&[Value], u64) = match &response {
            Value::Array(items) => (items.as_slice(), items.len() as u64),
            Value::Object(map) => match map.get("results").and_then(Value::as_array) {
                Some(items) => (
                    items.as_slice(),
                    map.get("count")
                        .and_then(Value::as_u64)
                        .unwrap_or(items.len() as u64),
                ),
                None => (&[][..], 0),
            },
            _ => (&[][..], 0),
        };
        let customers = items
            .iter()
            .map(decode::<CustomerResponse>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CustomerPage {
            customers,
            total,
            page: response
                .get("page")
                .and_then(Value::as_u64)
                .unwrap_or(u64::from(page.unwrap_or(1))),
            limit: response
                .get("limit")
                .and_then(Value::as_u64)
                .unwrap_or(u64::from(limit.unwrap_or(MIN_PAGE_SIZE))),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn request_credit_check(
        &self,
        customer_id: &str,
        request: &CreditCheckRequest,
    ) -> Result<CreditCheckResult, ApiError> {
        let path = format!("{}/credit-check", customer_path(customer_id)?);
        if !request.amount_requested.is_finite() || request.amount_requested <= 0.0 {
            return Err(ApiError::validation(
                "amount_requested must be greater than 0",
            ));
        }

        let body = json!({
            "amount_requested": request.amount_requested,
            "has_purchase_history": request.has_purchase_history,
        });
        let mut response = self.http.post(&path, &body).await?;
        info!(
            "Credit check response for {}: {}",
            customer_id,
            sanitize_response_data(&response)
        );

        if let Value::Object(map) = &mut response {
            if !map.get("customer_id").is_some_and(Value::is_string) {
                map.insert("customer_id".to_string(), json!(customer_id));
            }
        }
        decode(&response)
    }

    /// Credit state as recorded on the customer; there is no separate
    /// credit check resource to read back.
    #[tracing::instrument(skip(self))]
    pub async fn get_credit_check_status(
        &self,
        customer_id: &str,
    ) -> Result<CreditCheckResult, ApiError> {
        let customer = self.fetch_customer(customer_id).await?;
        let field = |name: &str| customer.get(name).cloned().unwrap_or(Value::Null);

        decode(&json!({
            "customer_id": customer_id,
            "status": field("credit_status"),
            "amount_approved": field("amount_approved"),
            "amount_available": field("amount_available"),
            "credit_limit": field("credit_limit"),
            "created_at": field("credit_check_requested_at"),
            "updated_at": field("updated_at"),
        }))
    }

    /// Checks customer data as `create_customer` would, without calling the API.
    pub fn validate_customer_data(&self, fields: &Map<String, Value>) -> Result<(), ApiError> {
        validate_customer_data(&normalize_business_data(fields), false)
    }

    /// Runs a tool by name. Failures are reported in the returned object,
    /// never as an error.
    pub async fn invoke_tool(&self, name: &str, arguments: &Value) -> Value {
        let tool = match name.parse::<Tool>() {
            Ok(tool) => tool,
            Err(message) => {
                error!("{}", message);
                return json!({
                    "success": false,
                    "error": message,
                    "message": "Unknown tool",
                });
            }
        };

        info!(
            "Invoking {} with arguments: {}",
            tool,
            sanitize_response_data(arguments)
        );

        let args = match arguments {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => {
                return tool.failure(&ApiError::validation(
                    "Tool arguments must be a JSON object",
                ));
            }
        };

        match self.dispatch(tool, args).await {
            Ok(result) => result,
            Err(err) => {
                error!("{} failed: {}", tool, err);
                tool.failure(&err)
            }
        }
    }

    async fn dispatch(&self, tool: Tool, mut args: Map<String, Value>) -> Result<Value, ApiError> {
        match tool {
            Tool::CreateCustomer => {
                let fields = normalize_business_data(&args);
                validate_customer_data(&fields, false)?;
                // Only fields known to the customer model are forwarded.
                let request: CustomerRequest = serde_json::from_value(Value::Object(fields))
                    .map_err(|e| ApiError::validation(format!("Invalid customer data: {}", e)))?;

                let customer = self.post_customer(&customer_body(&request)?).await?;
                Ok(json!({
                    "success": true,
                    "customer": customer,
                    "message": "Customer created successfully",
                }))
            }
            Tool::GetCustomer => {
                let customer_id = required_str(&args, "customer_id")?;
                let customer = self.get_customer(&customer_id).await?;
                Ok(json!({
                    "success": true,
                    "customer": customer,
                    "message": "Customer retrieved successfully",
                }))
            }
            Tool::UpdateCustomer => {
                let customer_id = required_str(&args, "customer_id")?;
                args.remove("customer_id");
                let customer = self.update_customer(&customer_id, &args).await?;
                Ok(json!({
                    "success": true,
                    "customer": customer,
                    "message": "Customer updated successfully",
                }))
            }
            Tool::SearchCustomers => {
                let criteria = SearchCriteria {
                    page: optional_u32(&args, "page")?,
                    offset: optional_u32(&args, "offset")?,
                    limit: optional_u32(&args, "limit")?,
                    filters: args,
                };
                let page = self.search_customers(&criteria).await?;
                Ok(json!({
                    "success": true,
                    "customers": page.customers,
                    "total": page.total,
                    "page": page.page,
                    "limit": page.limit,
                    "message": "Customers retrieved successfully",
                }))
            }
            Tool::RequestCreditCheck => {
                let customer_id = required_str(&args, "customer_id")?;
                let amount_requested = args
                    .get("amount_requested")
                    .and_then(Value::as_f64)
                    .filter(|amount| *amount != 0.0)
                    .ok_or_else(|| ApiError::validation("amount_requested is required"))?;
                let has_purchase_history = match args.get("has_purchase_history") {
                    None | Some(Value::Null) => false,
                    Some(Value::Bool(flag)) => *flag,
                    Some(_) => {
                        return Err(ApiError::validation(
                            "has_purchase_history must be a boolean",
                        ));
                    }
                };

                let result = self
                    .request_credit_check(
                        &customer_id,
                        &CreditCheckRequest {
                            amount_requested,
                            has_purchase_history,
                        },
                    )
                    .await?;
                Ok(json!({
                    "success": true,
                    "credit_check": result,
                    "message": "Credit check requested successfully",
                }))
            }
            Tool::GetCreditCheckStatus => {
                let customer_id = required_str(&args, "customer_id")?;
                let result = self.get_credit_check_status(&customer_id).await?;
                Ok(json!({
                    "success": true,
                    "credit_check": result,
                    "message": "Credit check status retrieved successfully",
                }))
            }
            Tool::ValidateCustomerData => match self.validate_customer_data(&args) {
                Ok(()) => Ok(json!({
                    "success": true,
                    "valid": true,
                    "message": "Customer data is valid",
                })),
                Err(err @ ApiError::Validation { .. }) => Ok(json!({
                    "success": true,
                    "valid": false,
                    "error": err.message(),
                    "message": "Customer data validation failed",
                })),
                Err(err) => Err(err),
            },
        }
    }

    /// Releases the HTTP client and its pooled connections.
    pub fn close(self) {
        self.http.close();
        info!("ResolvePay connector closed");
    }
}

#[async_trait]
impl ToolHandler for Connector {
    fn tools(&self) -> Vec<Value> {
        tool_definitions()
    }

    async fn call_tool(&self, name: &str, arguments: &Value) -> Value {
        self.invoke_tool(name, arguments).await
    }
}

fn customer_path(customer_id: &str) -> Result<String, ApiError> {
    let customer_id = customer_id.trim();
    if customer_id.is_empty() {
        return Err(ApiError::validation("customer_id is required"));
    }
    if customer_id.contains(['/', '?', '#']) {
        return Err(ApiError::validation(format!(
            "Invalid customer_id: {}",
            customer_id
        )));
    }
    Ok(format!("customers/{}", customer_id))
}

fn customer_body(request: &CustomerRequest) -> Result<Value, ApiError> {
    serde_json::to_value(request)
        .map_err(|e| ApiError::validation(format!("Invalid customer data: {}", e)))
}

/// Decodes a successful response body into a model.
fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, ApiError> {
    T::deserialize(value).map_err(|e| ApiError::Api {
        status: 200,
        message: format!("Unexpected response from ResolvePay: {}", e),
        body: value.clone(),
        details: Details::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreditCheckStatus;
    use mockito::Matcher;

    fn connector(url: &str) -> Connector {
        Connector::new(
            ConnectorConfig::new("merchant", "key")
                .with_base_url(url)
                .with_max_retries(0)
                .with_rate_limit(0),
        )
        .unwrap()
    }

    fn customer_json(id: &str) -> Value {
        json!({
            "id": id,
            "business_name": "Acme Corp",
            "business_address": "123 Main St",
            "business_city": "New York",
            "business_state": "NY",
            "business_zip": "10001",
            "business_country": "US",
            "business_ap_email": "ap@acme.com",
            "email": "contact@acme.com",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "amount_approved": 10000.0,
            "amount_available": 7500.0,
            "credit_status": "approved",
            "credit_limit": 10000.0,
            "credit_check_requested_at": "2024-01-01T12:00:00Z"
        })
    }

    fn new_customer_args() -> Value {
        json!({
            "business_name": " Acme Corp ",
            "business_address": "123 Main St",
            "business_city": "New York",
            "business_state": "ny",
            "business_zip": "10001",
            "business_country": "us",
            "business_ap_email": "AP@acme.com",
            "email": "contact@acme.com",
            "default_terms": "net30"
        })
    }

    #[test]
    fn test_new_rejects_missing_credentials() {
        let result = Connector::new(ConnectorConfig::new("", "key"));
        assert!(matches!(result, Err(ApiError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_create_customer_tool_sends_normalized_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/customers")
            .match_body(Matcher::PartialJson(json!({
                "business_name": "Acme Corp",
                "business_state": "NY",
                "business_country": "US",
                "business_ap_email": "ap@acme.com",
                "default_terms": "net30"
            })))
            .with_status(201)
            .with_body(customer_json("cus_1").to_string())
            .create_async()
            .await;

        let connector = connector(&server.url());
        let result = connector
            .invoke_tool("create_customer", &new_customer_args())
            .await;

        mock.assert_async().await;
        assert_eq!(result["success"], true);
        assert_eq!(result["customer"]["id"], "cus_1");
        assert_eq!(result["message"], "Customer created successfully");
    }

    #[tokio::test]
    async fn test_create_customer_tool_drops_unknown_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/customers")
            .match_body(Matcher::Json(json!({
                "business_name": "Acme Corp",
                "business_address": "123 Main St",
                "business_city": "New York",
                "business_state": "NY",
                "business_zip": "10001",
                "business_country": "US",
                "business_ap_email": "ap@acme.com",
                "email": "contact@acme.com",
                "default_terms": "net30"
            })))
            .with_status(201)
            .with_body(customer_json("cus_1").to_string())
            .create_async()
            .await;

        let mut args = new_customer_args();
        args["bogus_field"] = json!("x");
        let result = connector(&server.url())
            .invoke_tool("create_customer", &args)
            .await;

        mock.assert_async().await;
        assert_eq!(result["success"], true);
    }

    #[tokio::test]
    async fn test_create_customer_tool_validates_before_sending() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/customers")
            .expect(0)
            .create_async()
            .await;

        let connector = connector(&server.url());
        let result = connector
            .invoke_tool("create_customer", &json!({"business_name": "Acme"}))
            .await;

        mock.assert_async().await;
        assert_eq!(result["success"], false);
        assert_eq!(result["error_type"], "validation");
        assert!(
            result["error"]
                .as_str()
                .unwrap()
                .starts_with("Missing required fields: business_address")
        );
        assert!(result["customer"].is_null());
    }

    #[tokio::test]
    async fn test_create_customer_typed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/customers")
            .with_status(201)
            .with_body(customer_json("cus_2").to_string())
            .create_async()
            .await;

        let request: CustomerRequest = serde_json::from_value(json!({
            "business_name": "Acme Corp",
            "business_address": "123 Main St",
            "business_city": "New York",
            "business_state": "NY",
            "business_zip": "10001",
            "business_country": "US",
            "business_ap_email": "ap@acme.com",
            "email": "contact@acme.com"
        }))
        .unwrap();

        let customer = connector(&server.url())
            .create_customer(&request)
            .await
            .unwrap();
        assert_eq!(customer.id, "cus_2");
        assert_eq!(customer.amount_available, Some(7500.0));
    }

    #[tokio::test]
    async fn test_get_customer_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/customers/missing")
            .with_status(404)
            .create_async()
            .await;

        let connector = connector(&server.url());
        let err = connector.get_customer("missing").await.unwrap_err();
        match &err {
            ApiError::NotFound {
                resource, message, ..
            } => {
                assert_eq!(resource, "missing");
                assert_eq!(message, "Customer not found: missing");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let result = connector
            .invoke_tool("get_customer", &json!({"customer_id": "missing"}))
            .await;
        assert_eq!(result["success"], false);
        assert_eq!(result["error"], "Customer not found: missing");
        assert_eq!(result["message"], "Customer not found");
    }

    #[tokio::test]
    async fn test_get_customer_requires_id() {
        let connector = connector("http://127.0.0.1:1");
        let result = connector.invoke_tool("get_customer", &json!({})).await;
        assert_eq!(result["error"], "customer_id is required");

        let err = connector.get_customer("a/../b").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_update_customer_sends_only_changes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/customers/cus_1")
            .match_body(Matcher::Json(json!({"email": "new@acme.com"})))
            .with_status(200)
            .with_body(customer_json("cus_1").to_string())
            .create_async()
            .await;

        let connector = connector(&server.url());
        let result = connector
            .invoke_tool(
                "update_customer",
                &json!({"customer_id": "cus_1", "email": "New@Acme.com"}),
            )
            .await;

        mock.assert_async().await;
        assert_eq!(result["success"], true);
        assert_eq!(result["message"], "Customer updated successfully");
    }

    #[tokio::test]
    async fn test_update_customer_rejects_bad_phone() {
        let connector = connector("http://127.0.0.1:1");
        let mut fields = Map::new();
        fields.insert("business_ap_phone".into(), json!("(212) 555-0123"));

        let err = connector
            .update_customer("cus_1", &fields)
            .await
            .unwrap_err();
        assert!(err.message().starts_with("Invalid phone number format"));
    }

    #[tokio::test]
    async fn test_search_customers_builds_filters_and_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/customers")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("filter[email][eq]".into(), "contact@acme.com".into()),
                Matcher::UrlEncoded("page".into(), "3".into()),
                Matcher::UrlEncoded("limit".into(), "25".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "results": [customer_json("cus_1")],
                    "count": 51,
                    "page": 3,
                    "limit": 25
                })
                .to_string(),
            )
            .create_async()
            .await;

        let connector = connector(&server.url());
        let result = connector
            .invoke_tool(
                "search_customers",
                &json!({"email": "contact@acme.com", "offset": 50, "limit": 10}),
            )
            .await;

        mock.assert_async().await;
        assert_eq!(result["success"], true);
        assert_eq!(result["total"], 51);
        assert_eq!(result["page"], 3);
        assert_eq!(result["customers"][0]["id"], "cus_1");
    }

    #[tokio::test]
    async fn test_search_customers_accepts_bare_array() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/customers")
            .match_query(Matcher::UrlEncoded("limit".into(), "100".into()))
            .with_status(200)
            .with_body(json!([customer_json("a"), customer_json("b")]).to_string())
            .create_async()
            .await;

        let page = connector(&server.url())
            .search_customers(&SearchCriteria {
                limit: Some(500),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 100);
        assert_eq!(page.customers[1].id, "b");
    }

    #[tokio::test]
    async fn test_search_customers_zero_limit_is_unset() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/customers")
            .match_query(Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"results": [], "count": 0}"#)
            .create_async()
            .await;

        let page = connector(&server.url())
            .search_customers(&SearchCriteria {
                limit: Some(0),
                ..Default::default()
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.limit, u64::from(MIN_PAGE_SIZE));
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_search_tool_fails_on_truncated_body() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            use tokio::io::{AsyncReadExt, AsyncWriteExt};

            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 500\r\n\r\n{\"results\"")
                .await
                .unwrap();
        });

        let result = connector(&format!("http://{}", addr))
            .invoke_tool("search_customers", &json!({}))
            .await;

        assert_eq!(result["success"], false);
        assert_eq!(result["error_type"], "api");
        assert_eq!(result["customers"], json!([]));
    }

    #[tokio::test]
    async fn test_request_credit_check_fills_customer_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/customers/cus_1/credit-check")
            .match_body(Matcher::Json(json!({
                "amount_requested": 5000.0,
                "has_purchase_history": false
            })))
            .with_status(200)
            .with_body(r#"{"status": "in_progress"}"#)
            .create_async()
            .await;

        let connector = connector(&server.url());
        let result = connector
            .invoke_tool(
                "request_customer_credit_check",
                &json!({"customer_id": "cus_1", "amount_requested": 5000}),
            )
            .await;

        mock.assert_async().await;
        assert_eq!(result["success"], true);
        assert_eq!(result["credit_check"]["customer_id"], "cus_1");
        assert_eq!(result["credit_check"]["status"], "in_progress");
    }

    #[tokio::test]
    async fn test_request_credit_check_requires_amount() {
        let connector = connector("http://127.0.0.1:1");
        let result = connector
            .invoke_tool(
                "request_customer_credit_check",
                &json!({"customer_id": "cus_1", "amount_requested": 0}),
            )
            .await;
        assert_eq!(result["error"], "amount_requested is required");
        assert!(result["credit_check"].is_null());
    }

    #[tokio::test]
    async fn test_get_credit_check_status_projects_customer() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/customers/cus_1")
            .with_status(200)
            .with_body(customer_json("cus_1").to_string())
            .create_async()
            .await;

        let result = connector(&server.url())
            .get_credit_check_status("cus_1")
            .await
            .unwrap();

        assert_eq!(result.customer_id, "cus_1");
        assert_eq!(result.status, CreditCheckStatus::Approved);
        assert_eq!(result.credit_limit, Some(10000.0));
        assert_eq!(result.created_at.as_deref(), Some("2024-01-01T12:00:00Z"));
        assert_eq!(result.notes, None);
    }

    #[tokio::test]
    async fn test_validate_customer_data_tool() {
        let connector = connector("http://127.0.0.1:1");

        let result = connector
            .invoke_tool("validate_customer_data", &new_customer_args())
            .await;
        assert_eq!(result["valid"], true);

        let result = connector
            .invoke_tool("validate_customer_data", &json!({"email": "nope"}))
            .await;
        assert_eq!(result["success"], true);
        assert_eq!(result["valid"], false);
        assert!(
            result["error"]
                .as_str()
                .unwrap()
                .starts_with("Missing required fields")
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_arguments() {
        let connector = connector("http://127.0.0.1:1");

        let result = connector.invoke_tool("delete_customer", &json!({})).await;
        assert_eq!(result["success"], false);
        assert_eq!(result["error"], "Unknown tool: delete_customer");

        let result = connector.invoke_tool("get_customer", &json!([1, 2])).await;
        assert_eq!(result["error"], "Tool arguments must be a JSON object");
    }

    #[tokio::test]
    async fn test_api_failure_is_wrapped() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/customers/cus_1")
            .with_status(401)
            .create_async()
            .await;

        let result = connector(&server.url())
            .invoke_tool("get_credit_check_status", &json!({"customer_id": "cus_1"}))
            .await;

        assert_eq!(result["success"], false);
        assert_eq!(result["error_type"], "authentication");
        assert_eq!(
            result["error"],
            "Authentication failed. Check merchant_id and api_key."
        );
        assert_eq!(result["message"], "Failed to get credit check status");
    }

    #[test]
    fn test_close_consumes_connector() {
        let connector = connector("http://127.0.0.1:1");
        assert_eq!(connector.config().merchant_id, "merchant");
        assert!(connector.auth().is_valid());
        connector.close();
    }
}
