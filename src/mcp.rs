//! MCP stdio server: newline-delimited JSON-RPC 2.0 on stdin/stdout.
//!
//! Logging goes to stderr; stdout carries protocol messages only.

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "resolvepay-mcp";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;

/// Something that can list and run tools.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Catalog entries with `name`, `description` and `inputSchema`.
    fn tools(&self) -> Vec<Value>;

    /// Runs a tool. A result with `"success": false` is reported as a tool error.
    async fn call_tool(&self, name: &str, arguments: &Value) -> Value;
}

pub struct StdioServer<H: ToolHandler> {
    handler: H,
}

impl<H: ToolHandler> StdioServer<H> {
    /// Server dispatching tool calls to `handler`.
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// The wrapped tool handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Consumes the server, returning its handler.
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Serves stdin until it is closed.
    pub async fn run(&self) -> anyhow::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serves one message per line from `reader`, answering on `writer`.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        info!("MCP stdio server started");

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(line).await {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("MCP stdio server stopped");
        Ok(())
    }

    /// Response line for one request, or `None` for notifications.
    pub async fn handle_message(&self, line: &str) -> Option<String> {
        let request: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!("Discarding malformed message: {}", e);
                return Some(error_response(
                    Value::Null,
                    PARSE_ERROR,
                    &format!("Parse error: {}", e),
                ));
            }
        };

        let Some(method) = request.get("method").and_then(Value::as_str) else {
            let id = request.get("id").cloned().unwrap_or(Value::Null);
            return Some(error_response(id, INVALID_REQUEST, "Invalid request"));
        };

        // Notifications carry no id and get no response.
        let Some(id) = request.get("id").cloned() else {
            debug!("Notification {}", method);
            return None;
        };
        if method.starts_with("notifications/") {
            return None;
        }

        let params = request.get("params").cloned().unwrap_or_else(|| json!({}));
        debug!("Handling {} (id {})", method, id);

        let response = match method {
            "initialize" => success_response(id, initialize_result()),
            "ping" => success_response(id, json!({})),
            "tools/list" => success_response(id, json!({"tools": self.handler.tools()})),
            "tools/call" => self.handle_tools_call(id, &params).await,
            _ => error_response(
                id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {}", method),
            ),
        };
        Some(response)
    }

    async fn handle_tools_call(&self, id: Value, params: &Value) -> String {
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        let result = self.handler.call_tool(name, &arguments).await;
        let is_error = result.get("success").and_then(Value::as_bool) == Some(false);
        let text = serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string());

        success_response(
            id,
            json!({
                "content": [{"type": "text", "text": text}],
                "isError": is_error,
            }),
        )
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {"tools": {}},
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("RESOLVEPAY_MCP_VERSION"),
        },
    })
}

fn success_response(id: Value, result: Value) -> String {
    json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string()
}

fn error_response(id: Value, code: i32, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {"code": code, "message": message},
    })
    .to_string()
}
