use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use crate::tools::registry;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

/// Liveness payload
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub server: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub tools_available: usize,
    pub documents: usize,
}

/// Health check endpoint (liveness)
///
/// Unauthenticated and never charged against a rate-limit bucket.
pub async fn health_check(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        server: state.config.server_name.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: state.uptime_seconds(),
        tools_available: registry().len(),
        documents: state.document_count(),
    })
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let handle = state.metrics.as_ref().ok_or(ServerError::NotFound)?;
    Ok((
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
