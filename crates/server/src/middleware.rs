use crate::error::ServerError;
use crate::state::ServerState;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;
use std::sync::Arc;

/// Rate-limit identity used when neither a peer address nor a trusted
/// forwarding header is available.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

const REQUEST_ID_HEADER: &str = "x-request-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Per-request correlation id, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Authentication then rate limiting for protected routes.
///
/// Both checks live in one middleware so their order is fixed: a request
/// that fails authentication returns before any bucket is looked up, and
/// therefore never spends a token.
pub async fn guard(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let credential = request.headers().get(AUTHORIZATION).map(HeaderValue::as_bytes);
    if let Err(err) = state.auth.authorize(credential) {
        tracing::warn!(uri = %request.uri(), reason = %err, "rejected unauthenticated request");
        metrics::counter!("kb_gateway_requests_total", "outcome" => "unauthenticated").increment(1);
        return Err(err);
    }

    let client = client_identity(&request, state.config.trust_forwarded_for);
    let admission = state.rate_limiter.check(&client);
    if let Some(retry_after_secs) = admission.retry_after_secs() {
        tracing::warn!(client = %client, retry_after_secs, "rate limit exceeded");
        metrics::counter!("kb_gateway_requests_total", "outcome" => "rate_limited").increment(1);
        return Err(ServerError::RateLimitExceeded { retry_after_secs });
    }

    metrics::counter!("kb_gateway_requests_total", "outcome" => "admitted").increment(1);
    Ok(next.run(request).await)
}

/// Identity a request is rate limited under.
///
/// The first `X-Forwarded-For` hop is used only when the deployment says the
/// proxy in front of us can be trusted; otherwise the socket peer address.
pub fn client_identity(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get(FORWARDED_FOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty());
        if let Some(hop) = forwarded {
            return hop.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
}

/// Request ID injection middleware
pub async fn request_id(mut request: Request, next: Next) -> Response {
    // Generate or extract request ID
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Logging middleware
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = %request_id,
        "Request started"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}
