//! JSON-RPC 2.0 framing and MCP method routing.
//!
//! Transport-independent: both the HTTP endpoint and the stdio loop feed raw
//! message bytes into [`handle_message`] and write back whatever response it
//! produces. Notifications produce no response.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::dispatcher::{DispatchError, ErrorKind, InvocationRequest};
use super::server::McpServer;

pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol revisions this server can speak, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC 2.0 request or notification. `id` is absent for notifications.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self::error_with_data(id, code, message, None)
    }

    pub fn error_with_data(
        id: Option<Value>,
        code: i32,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }
}

/// Handle one raw JSON-RPC message.
///
/// Returns `None` for notifications, which never get a response.
pub fn handle_message(server: &McpServer, raw: &[u8]) -> Option<JsonRpcResponse> {
    let value: Value = match serde_json::from_slice(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Parse error: {}", e);
            return Some(JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {e}")));
        }
    };

    let id = value.get("id").cloned();
    if id == Some(Value::Null) {
        return Some(JsonRpcResponse::error(
            None,
            INVALID_REQUEST,
            "Invalid Request: id must be a string or number",
        ));
    }

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            warn!("Invalid request: {}", e);
            return Some(JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid Request: {e}")));
        }
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return Some(JsonRpcResponse::error(
            request.id,
            INVALID_REQUEST,
            format!("Invalid Request: unsupported jsonrpc version {:?}", request.jsonrpc),
        ));
    }

    if request.id.is_none() {
        debug!(method = %request.method, "Notification received");
        return None;
    }

    Some(handle_request(server, request))
}

/// Route a request (a message with an `id`) to its method handler.
pub fn handle_request(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    let JsonRpcRequest { id, method, params, .. } = request;

    match method.as_str() {
        "initialize" => handle_initialize(server, id, params),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => handle_tools_list(server, id),
        "tools/call" => handle_tools_call(server, id, params),
        _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {method}")),
    }
}

/// Negotiate the protocol revision: echo the client's if supported, else offer ours.
fn negotiate_version(params: Option<&Value>) -> &'static str {
    let requested = params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str);

    requested
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().copied().find(|s| *s == v))
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

fn handle_initialize(server: &McpServer, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
    let info = server.info();
    JsonRpcResponse::success(
        id,
        json!({
            "protocolVersion": negotiate_version(params.as_ref()),
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": info.name,
                "version": info.version
            }
        }),
    )
}

fn handle_tools_list(server: &McpServer, id: Option<Value>) -> JsonRpcResponse {
    let tools: Vec<_> = server.registry().tools().iter().map(|t| t.descriptor()).collect();
    JsonRpcResponse::success(id, json!({ "tools": tools }))
}

fn handle_tools_call(server: &McpServer, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
    let Some(params) = params else {
        return JsonRpcResponse::error(id, INVALID_PARAMS, "Invalid params: missing tool call parameters");
    };
    let request: InvocationRequest = match serde_json::from_value(params) {
        Ok(request) => request,
        Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}")),
    };

    match server.dispatcher().dispatch(&request) {
        Ok(value) => JsonRpcResponse::success(
            id,
            json!({
                "content": [
                    {
                        "type": "text",
                        "text": serde_json::to_string(&value).unwrap_or_default()
                    }
                ],
                "structuredContent": { "result": value },
                "isError": false
            }),
        ),
        Err(DispatchError::Handler(message)) => {
            warn!(tool = %request.tool_name, "Tool execution failed: {}", message);
            JsonRpcResponse::success(
                id,
                json!({
                    "content": [
                        {
                            "type": "text",
                            "text": format!("Error: {message}")
                        }
                    ],
                    "isError": true
                }),
            )
        }
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::NotFound => {
                    warn!("Unknown tool requested: {}", request.tool_name);
                    METHOD_NOT_FOUND
                }
                _ => INVALID_PARAMS,
            };
            let mut data = json!({ "kind": err.kind().as_str() });
            if let DispatchError::Validation { fields, .. } = &err {
                data["fields"] = json!(fields);
            }
            JsonRpcResponse::error_with_data(id, code, err.to_string(), Some(data))
        }
    }
}
