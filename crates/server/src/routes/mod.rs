//! API route handlers
//!
//! Routes are organized by functionality:
//!
//! - `health`: Liveness probe and Prometheus metrics
//! - `tools`: REST-style `tools/list` and `tools/call`
//! - `rpc`: JSON-RPC 2.0 endpoint for MCP clients

pub mod health;
pub mod rpc;
pub mod tools;

use crate::error::ServerError;
use crate::state::ServerState;
use crate::tools::registry;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// Server information
///
/// Returns the server name, version, tool names and corpus size. This is the
/// root endpoint (GET /).
///
/// # Response
///
/// ```json
/// {
///   "name": "Local Knowledge Base",
///   "version": "0.1.0",
///   "tools": ["search", "fetch"],
///   "documents": 5,
///   "mcp_endpoint": "/mcp"
/// }
/// ```
pub async fn api_info(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let tools: Vec<&str> = registry().iter().map(|tool| tool.name).collect();

    Json(json!({
        "name": state.config.server_name,
        "description": "MCP tool gateway for knowledge-base search and retrieval",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "MCP",
        "transport": "streamable-http",
        "tools": tools,
        "documents": state.document_count(),
        "mcp_endpoint": "/mcp",
        "endpoints": [
            "/health",
            "/mcp",
            "/mcp/tools/list",
            "/mcp/tools/call",
            "/metrics"
        ]
    }))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
