use crate::error::ServerResult;
use crate::state::ServerState;
use crate::tools::{registry, CallRequest, ToolDescriptor, ToolErrorBody, ToolOutput};
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

/// Response of `POST /mcp/tools/list`
#[derive(Debug, Serialize)]
pub struct ListToolsResponse {
    pub tools: Vec<ToolDescriptor>,
}

/// Response of `POST /mcp/tools/call`
///
/// Tool failures are part of the protocol: they are returned with status 200
/// so the calling agent can read them as data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CallToolResponse {
    Success { result: ToolOutput },
    Failure { error: ToolErrorBody },
}

/// List the tool registry. The request body is ignored.
pub async fn list_tools() -> Json<ListToolsResponse> {
    Json(ListToolsResponse { tools: registry() })
}

/// Invoke a tool.
///
/// The envelope is parsed from raw bytes so that every shape error maps to
/// `400 BAD_REQUEST` rather than an extractor-specific rejection.
pub async fn call_tool(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> ServerResult<Json<CallToolResponse>> {
    let request = CallRequest::from_slice(&body)?;
    let arguments = request.arguments.unwrap_or_default();

    let response = match state.tools.call(&request.name, arguments) {
        Ok(result) => CallToolResponse::Success { result },
        Err(err) => CallToolResponse::Failure { error: err.body() },
    };
    Ok(Json(response))
}
