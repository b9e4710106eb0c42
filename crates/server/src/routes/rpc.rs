//! JSON-RPC 2.0 endpoint (`POST /mcp`).
//!
//! Speaks the subset of MCP that agent clients need to discover and call
//! tools: `initialize`, `notifications/initialized`, `ping`, `tools/list`
//! and `tools/call`.

use crate::state::ServerState;
use crate::tools::{registry, ToolError};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const PROTOCOL_VERSION: &str = "2025-03-26";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const RESOURCE_NOT_FOUND: i64 = -32002;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<ToolError> for RpcError {
    fn from(err: ToolError) -> Self {
        let code = match err {
            ToolError::UnknownTool(_) => METHOD_NOT_FOUND,
            ToolError::InvalidArguments { .. } => INVALID_PARAMS,
            ToolError::NotFound(_) => RESOURCE_NOT_FOUND,
        };
        Self {
            code,
            message: err.to_string(),
            data: Some(json!({ "kind": err.kind() })),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Handle one JSON-RPC message.
///
/// Envelope errors (unparseable JSON, missing `method`) answer with HTTP 400;
/// method-level errors ride inside a 200 response. Notifications get
/// `202 Accepted` and no body.
pub async fn handle_rpc(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            let error = RpcError::new(PARSE_ERROR, format!("parse error: {err}"));
            return (StatusCode::BAD_REQUEST, Json(RpcResponse::error(Value::Null, error)))
                .into_response();
        }
    };

    let request: RpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(err) => {
            let error = RpcError::new(INVALID_REQUEST, format!("invalid request: {err}"));
            return (StatusCode::BAD_REQUEST, Json(RpcResponse::error(Value::Null, error)))
                .into_response();
        }
    };

    if request.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
        tracing::debug!(version = ?request.jsonrpc, "non-2.0 jsonrpc version tag");
    }

    let Some(id) = request.id else {
        tracing::debug!(method = %request.method, "notification received");
        return StatusCode::ACCEPTED.into_response();
    };

    let response = match dispatch(&state, &request.method, request.params) {
        Ok(result) => RpcResponse::result(id, result),
        Err(error) => RpcResponse::error(id, error),
    };
    Json(response).into_response()
}

fn dispatch(state: &ServerState, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
    match method {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": state.config.server_name,
                "version": env!("CARGO_PKG_VERSION"),
            }
        })),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": registry() })),
        "tools/call" => call_tool(state, params),
        other => Err(RpcError::new(
            METHOD_NOT_FOUND,
            format!("method not found: {other}"),
        )),
    }
}

fn call_tool(state: &ServerState, params: Option<Value>) -> Result<Value, RpcError> {
    let mut params = match params {
        Some(Value::Object(map)) => map,
        _ => return Err(RpcError::new(INVALID_PARAMS, "params must be an object")),
    };

    let name = match params.remove("name") {
        Some(Value::String(name)) => name,
        _ => return Err(RpcError::new(INVALID_PARAMS, "params.name must be a string")),
    };

    let arguments = match params.remove("arguments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(RpcError::new(
                INVALID_PARAMS,
                "params.arguments must be an object",
            ))
        }
    };

    let output = state.tools.call(&name, arguments)?;
    serde_json::to_value(output).map_err(|err| RpcError::new(INTERNAL_ERROR, err.to_string()))
}
