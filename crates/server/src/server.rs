//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Middleware stack (auth, rate limiting, logging, compression, CORS)
//! - Background eviction of idle rate-limit buckets
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{guard, log_requests, request_id};
use crate::routes::{api_info, health, not_found, rpc, tools};
use crate::state::ServerState;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Routes are divided into:
/// - Public routes: /health (no auth, no rate limit)
/// - Protected routes: /, /metrics, /mcp and /mcp/tools/* (bearer key, then
///   per-client token bucket)
///
/// Middleware stack (outermost first):
/// 1. Tracing
/// 2. Request ID tracking
/// 3. Request logging
/// 4. CORS
/// 5. Compression
/// 6. Timeout handling
/// 7. Body size limit
/// 8. Auth + rate limit (protected routes only)
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = cors_layer(&state.config);

    // Public routes (no auth required)
    let public_routes = Router::new().route("/health", get(health::health_check));

    // Protected routes (require API key, count against the client's bucket)
    let protected_routes = Router::new()
        .route("/", get(api_info))
        .route("/metrics", get(health::metrics))
        .route("/mcp", post(rpc::handle_rpc))
        .route("/mcp/tools/list", post(tools::list_tools))
        .route("/mcp/tools/call", post(tools::call_tool))
        .layer(from_fn_with_state(state.clone(), guard));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

fn init_tracing(config: &ServerConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true);

    if config.log_json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

/// Start the gateway
///
/// Initializes logging and metrics, loads the corpus, and serves until
/// SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    init_tracing(&config);

    let addr: SocketAddr = config.socket_addr()?;

    let mut state = ServerState::new(config.clone())?;
    if config.metrics_enabled {
        let handle = PrometheusBuilder::new().install_recorder()?;
        state = state.with_metrics(handle);
    }
    let state = Arc::new(state);

    spawn_bucket_sweeper(&state);

    let app = build_router(state.clone());

    tracing::info!(
        addr = %addr,
        server_name = %config.server_name,
        documents = state.document_count(),
        "Starting knowledge-base gateway"
    );
    tracing::info!(
        capacity = config.rate_limit.capacity,
        refill_per_sec = config.rate_limit.refill_per_sec,
        idle_ttl_secs = config.rate_limit.idle_ttl_secs,
        "Rate limit configured"
    );
    tracing::info!(
        timeout_secs = config.timeout_secs,
        max_body_size_kb = config.max_body_size_kb,
        cors_origins = ?config.cors_origins,
        metrics = config.metrics_enabled,
        "HTTP stack configured"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Periodically drop rate-limit buckets whose clients went quiet.
fn spawn_bucket_sweeper(state: &Arc<ServerState>) {
    let limiter = Arc::clone(&state.rate_limiter);
    let period = limiter.config().sweep_interval();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = limiter.sweep(Instant::now());
            if removed > 0 {
                tracing::info!(removed, buckets = limiter.len(), "Swept idle rate-limit buckets");
            }
        }
    });
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
