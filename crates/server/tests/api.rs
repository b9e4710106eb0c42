//! End-to-end tests for the HTTP surface.
//!
//! Requests are driven through the full router with `oneshot`, so auth,
//! rate limiting, body parsing and tool dispatch run exactly as in
//! production. No `ConnectInfo` is attached, so every request is rate
//! limited under the anonymous identity.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use corpus::DocumentStore;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::middleware::ANONYMOUS_CLIENT;
use server::{build_router, RateLimitConfig, ServerConfig, ServerState};
use tower::ServiceExt;

const API_KEY: &str = "test-api-key";

fn config_with(rate_limit: RateLimitConfig) -> ServerConfig {
    ServerConfig {
        api_key: API_KEY.to_string(),
        rate_limit,
        ..ServerConfig::default()
    }
}

fn test_state(config: ServerConfig) -> Arc<ServerState> {
    Arc::new(ServerState::with_store(config, DocumentStore::sample()).expect("valid test state"))
}

fn app() -> (Router, Arc<ServerState>) {
    let state = test_state(config_with(RateLimitConfig::default()));
    (build_router(state.clone()), state)
}

fn post(uri: &str, auth: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(body.into()).unwrap()
}

fn authed(uri: &str, body: Value) -> Request<Body> {
    post(uri, Some(&format!("Bearer {API_KEY}")), body.to_string())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn health_needs_no_credentials() {
    let (app, state) = app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tools_available"], 2);
    assert_eq!(body["documents"], 5);
    assert!(state.rate_limiter.is_empty());
}

#[tokio::test]
async fn missing_or_wrong_credentials_are_rejected() {
    let (app, _) = app();
    let cases = [
        post("/mcp/tools/list", None, "{}"),
        post("/mcp/tools/list", Some("Bearer nope"), "{}"),
        post("/mcp/tools/call", Some(API_KEY), "{}"),
        post("/mcp/tools/call", Some("Bearer nope"), "not even json"),
        post("/mcp", None, r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#),
    ];

    for request in cases {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTH_FAILED");
    }
}

#[tokio::test]
async fn unauthenticated_requests_do_not_spend_tokens() {
    let (app, state) = app();

    send(&app, authed("/mcp/tools/list", json!({}))).await;
    let before = state.rate_limiter.peek_tokens(ANONYMOUS_CLIENT).unwrap();

    for _ in 0..5 {
        let (status, _) = send(&app, post("/mcp/tools/list", Some("Bearer bad"), "{}")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let after = state.rate_limiter.peek_tokens(ANONYMOUS_CLIENT).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn exhausted_bucket_returns_429_with_retry_after() {
    let config = config_with(
        RateLimitConfig::default()
            .with_capacity(2)
            .with_refill_per_sec(0.01),
    );
    let app = build_router(test_state(config));

    for _ in 0..2 {
        let (status, _) = send(&app, authed("/mcp/tools/list", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(authed("/mcp/tools/list", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1);
}

#[tokio::test]
async fn tiny_refill_rate_still_answers_429() {
    let config = config_with(
        RateLimitConfig::default()
            .with_capacity(1)
            .with_refill_per_sec(1e-20),
    );
    let app = build_router(test_state(config));

    let (status, _) = send(&app, authed("/mcp/tools/list", json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, authed("/mcp/tools/list", json!({}))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
}

#[tokio::test]
async fn tools_list_ignores_body() {
    let (app, _) = app();
    let (status, body) = send(&app, authed("/mcp/tools/list", json!({"junk": [1, 2]}))).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["search", "fetch"]);
}

#[tokio::test]
async fn malformed_envelope_is_bad_request() {
    let (app, _) = app();
    let key = format!("Bearer {API_KEY}");
    for body in ["", "{", r#"{"arguments":{}}"#, r#"{"name":"search","arguments":[]}"#] {
        let (status, value) = send(&app, post("/mcp/tools/call", Some(&key), body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(value["error"]["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn search_ranks_matching_document_first() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        authed(
            "/mcp/tools/call",
            json!({"name": "search", "arguments": {"query": "python"}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["result"]["results"].as_array().unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0]["id"], "doc1");
    assert_eq!(results[0]["score"], 4);
    assert!(results[0]["text"].as_str().unwrap().len() <= 206);
}

#[tokio::test]
async fn blank_search_returns_empty_results() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        authed("/mcp/tools/call", json!({"name": "search", "arguments": {"query": "   "}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"result": {"results": []}}));
}

#[tokio::test]
async fn fetch_returns_stored_document() {
    let (app, state) = app();
    let (status, body) = send(
        &app,
        authed("/mcp/tools/call", json!({"name": "fetch", "arguments": {"id": "doc1"}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let stored = state.tools.engine().store().get("doc1").unwrap();
    assert_eq!(body["result"], serde_json::to_value(stored).unwrap());
}

#[tokio::test]
async fn tool_failures_are_reported_as_data() {
    let (app, _) = app();
    let cases = [
        (json!({"name": "delete", "arguments": {}}), "unknown_tool"),
        (json!({"name": "fetch", "arguments": {"id": "doc404"}}), "not_found"),
        (json!({"name": "fetch", "arguments": {}}), "invalid_arguments"),
        (json!({"name": "search"}), "invalid_arguments"),
    ];

    for (envelope, kind) in cases {
        let (status, body) = send(&app, authed("/mcp/tools/call", envelope.clone())).await;
        assert_eq!(status, StatusCode::OK, "{envelope}");
        assert_eq!(body["error"]["kind"], kind, "{envelope}");
        assert!(body.get("result").is_none());
    }
}

#[tokio::test]
async fn json_rpc_initialize_and_list() {
    let (app, _) = app();

    let (status, body) = send(
        &app,
        authed("/mcp", json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(body["result"]["serverInfo"]["name"], "Local Knowledge Base");

    let (status, body) = send(
        &app,
        authed("/mcp", json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, Value::Null);

    let (_, body) = send(
        &app,
        authed("/mcp", json!({"jsonrpc": "2.0", "id": "two", "method": "tools/list"})),
    )
    .await;
    assert_eq!(body["id"], "two");
    assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn json_rpc_tool_calls() {
    let (app, _) = app();

    let (status, body) = send(
        &app,
        authed(
            "/mcp",
            json!({
                "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": {"name": "search", "arguments": {"query": "database design"}}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["results"][0]["id"], "doc3");

    let (_, body) = send(
        &app,
        authed(
            "/mcp",
            json!({
                "jsonrpc": "2.0", "id": 4, "method": "tools/call",
                "params": {"name": "fetch", "arguments": {"id": "missing"}}
            }),
        ),
    )
    .await;
    assert_eq!(body["error"]["code"], -32002);
    assert_eq!(body["error"]["data"]["kind"], "not_found");

    let (_, body) = send(
        &app,
        authed("/mcp", json!({"jsonrpc": "2.0", "id": 5, "method": "resources/list"})),
    )
    .await;
    assert_eq!(body["error"]["code"], -32601);
}

#[tokio::test]
async fn json_rpc_parse_error_is_bad_request() {
    let (app, _) = app();
    let key = format!("Bearer {API_KEY}");
    let (status, body) = send(&app, post("/mcp", Some(&key), "{oops")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (app, _) = app();
    let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn response_carries_request_id() {
    let (app, _) = app();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}
