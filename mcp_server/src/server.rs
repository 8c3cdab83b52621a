//! MCP server for GKE.
//!
//! Newline-delimited JSON-RPC 2.0 over stdio. Each request runs in its own
//! task; responses are funnelled through a channel to a single writer so
//! lines never interleave.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use rmcp::model::Implementation;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn, Instrument};

use cloud_interface::{CloudApi, CommandRunner};
use gke_config::Config;
use observability::{prompt_span, tool_span};

use crate::error::HandlerError;
use crate::prompts::{self, PromptDefinitions};
use crate::tools::{self, ToolContext, ToolDefinitions};

/// Protocol revisions this server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

/// MCP server exposing GKE tools and prompts.
///
/// Holds only read-only state: the resolved configuration and the shared
/// command runner and API client.
pub struct GkeMcpServer<R, A>
where
    R: CommandRunner + 'static,
    A: CloudApi + 'static,
{
    config: Arc<Config>,
    runner: Arc<R>,
    api: Arc<A>,
}

impl<R, A> Clone for GkeMcpServer<R, A>
where
    R: CommandRunner + 'static,
    A: CloudApi + 'static,
{
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            runner: Arc::clone(&self.runner),
            api: Arc::clone(&self.api),
        }
    }
}

impl<R, A> GkeMcpServer<R, A>
where
    R: CommandRunner + 'static,
    A: CloudApi + 'static,
{
    pub fn new(config: Config, runner: R, api: A) -> Self {
        Self::with_shared(Arc::new(config), Arc::new(runner), Arc::new(api))
    }

    /// Build from clients that are also used elsewhere.
    pub fn with_shared(config: Arc<Config>, runner: Arc<R>, api: Arc<A>) -> Self {
        Self {
            config,
            runner,
            api,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get server information.
    pub fn server_info() -> Implementation {
        Implementation {
            name: "gke-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some("GKE MCP Server".to_string()),
            website_url: None,
            icons: None,
        }
    }

    fn tool_context(&self) -> ToolContext<'_> {
        ToolContext {
            config: &self.config,
            runner: self.runner.as_ref(),
            api: self.api.as_ref(),
        }
    }
}

// ============================================================================
// JSON-RPC Types
// ============================================================================

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID; absent for notifications
    #[serde(default)]
    pub id: Option<Value>,
    /// Method name
    pub method: String,
    /// Parameters (optional)
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID (null for notifications)
    pub id: Option<Value>,
    /// Result (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error (on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    fn from_handler_error(id: Option<Value>, err: &HandlerError) -> Self {
        Self::error(id, err.json_rpc_code(), err.to_string())
    }
}

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// ============================================================================
// MCP content types
// ============================================================================

/// A text content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    /// Always "text"
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// `tools/call` result.
///
/// Tool failures are reported as JSON-RPC errors, so a result that reaches
/// the client always has `is_error` set to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<TextContent>,
    /// Always `false`; see the type docs.
    pub is_error: bool,
}

impl CallToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent::new(text)],
            is_error: false,
        }
    }
}

// ============================================================================
// MCP Protocol Implementation
// ============================================================================

impl<R, A> GkeMcpServer<R, A>
where
    R: CommandRunner + 'static,
    A: CloudApi + 'static,
{
    /// Handle an incoming JSON-RPC request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, "Handling MCP request");

        if request.jsonrpc != "2.0" {
            return JsonRpcResponse::error(
                request.id,
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {}", request.jsonrpc),
            );
        }

        match request.method.as_str() {
            // MCP Protocol Methods
            "initialize" => self.handle_initialize(request.id, request.params),
            "initialized" | "notifications/initialized" => {
                debug!("Client sent initialized notification");
                JsonRpcResponse::success(request.id, json!({}))
            }
            "ping" => JsonRpcResponse::success(request.id, json!({})),

            // Tool Methods
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,

            // Prompt Methods
            "prompts/list" => self.handle_prompts_list(request.id),
            "prompts/get" => self.handle_prompts_get(request.id, request.params),

            method if method.starts_with("notifications/") => {
                debug!(method, "Ignoring notification");
                JsonRpcResponse::success(request.id, json!({}))
            }

            // Unknown method
            _ => {
                warn!(method = %request.method, "Unknown method");
                JsonRpcResponse::error(
                    request.id,
                    METHOD_NOT_FOUND,
                    format!("Method not found: {}", request.method),
                )
            }
        }
    }

    /// Handle initialize request.
    fn handle_initialize(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        #[derive(Debug, Default, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct InitializeParams {
            #[serde(default)]
            protocol_version: Option<String>,
            #[serde(default)]
            client_info: Option<Value>,
        }

        let params: InitializeParams = match params {
            Value::Null => InitializeParams::default(),
            params => match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        INVALID_PARAMS,
                        format!("Invalid params: {}", e),
                    );
                }
            },
        };

        let protocol_version = negotiate_protocol_version(params.protocol_version.as_deref());
        let server_info = Self::server_info();
        let result = json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": {
                    "listChanged": false
                },
                "prompts": {
                    "listChanged": false
                }
            },
            "serverInfo": {
                "name": server_info.name,
                "title": server_info.title,
                "version": server_info.version
            }
        });

        info!(
            protocol_version,
            client = ?params.client_info,
            "MCP server initialized"
        );
        JsonRpcResponse::success(id, result)
    }

    /// Handle tools/list request.
    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let tool_defs = ToolDefinitions::all();
        JsonRpcResponse::success(id, json!({ "tools": tool_defs.tools }))
    }

    /// Handle tools/call request.
    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        #[derive(Debug, Deserialize)]
        struct ToolCallParams {
            name: String,
            #[serde(default)]
            arguments: Value,
        }

        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                );
            }
        };

        let span = tool_span!(params.name);
        let result = tools::call_tool(self.tool_context(), &params.name, params.arguments)
            .instrument(span)
            .await;

        match result {
            Ok(text) => match serde_json::to_value(CallToolResult::text(text)) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
            },
            Err(e) => {
                warn!(tool = %params.name, error = %e, "Tool call failed");
                JsonRpcResponse::from_handler_error(id, &e)
            }
        }
    }

    /// Handle prompts/list request.
    fn handle_prompts_list(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({ "prompts": PromptDefinitions::all() }))
    }

    /// Handle prompts/get request.
    fn handle_prompts_get(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        #[derive(Debug, Deserialize)]
        struct PromptGetParams {
            name: String,
            #[serde(default)]
            arguments: Option<HashMap<String, String>>,
        }

        let params: PromptGetParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                );
            }
        };

        let _span = prompt_span!(params.name).entered();
        let arguments = params.arguments.unwrap_or_default();
        match prompts::get_prompt(&params.name, &arguments) {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
            },
            Err(e) => {
                warn!(prompt = %params.name, error = %e, "Prompt request failed");
                JsonRpcResponse::from_handler_error(id, &e)
            }
        }
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Serve requests read from `input`, writing responses to `output`.
    ///
    /// Returns when `input` reaches EOF and every in-flight request has
    /// been answered.
    pub async fn serve<In, Out>(self, input: In, mut output: Out) -> io::Result<()>
    where
        In: AsyncRead + Unpin,
        Out: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                output.write_all(line.as_bytes()).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
            }
            Ok::<_, io::Error>(())
        });

        let mut reader = BufReader::new(input);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let request = match parse_line(&buf) {
                Some(Ok(request)) => request,
                Some(Err(response)) => {
                    send(&tx, &response);
                    continue;
                }
                None => continue,
            };

            let server = self.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let notification = request.is_notification();
                let response = server.handle_request(request).await;
                if !notification {
                    send(&tx, &response);
                }
            });
        }

        drop(tx);
        writer.await.map_err(io::Error::other)??;

        info!("MCP server shutdown");
        Ok(())
    }

    /// Run the MCP server over stdio.
    pub async fn serve_stdio(self) -> io::Result<()> {
        info!("MCP server listening on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }
}

/// Decode one input line. `None` for blank lines; `Err` carries the
/// response for a line that is not a valid request.
fn parse_line(raw: &[u8]) -> Option<Result<JsonRpcRequest, JsonRpcResponse>> {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line.trim(),
        Err(e) => {
            error!(error = %e, "Request line is not valid UTF-8");
            return Some(Err(JsonRpcResponse::error(
                None,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            )));
        }
    };
    if line.is_empty() {
        return None;
    }

    debug!(request = %line, "Received request");

    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "Failed to parse request");
            return Some(Err(JsonRpcResponse::error(
                None,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            )));
        }
    };

    let id = value.get("id").cloned().filter(|id| !id.is_null());
    Some(serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "Malformed request");
        JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid Request: {}", e))
    }))
}

/// Echo the client's version when supported, otherwise offer our newest.
fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|s| **s == v).copied())
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

fn send(tx: &mpsc::UnboundedSender<String>, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(json) => {
            debug!(response = %json, "Sending response");
            if tx.send(json).is_err() {
                warn!("Response writer closed; dropping response");
            }
        }
        Err(e) => error!(error = %e, "Failed to serialize response"),
    }
}
