//! Knowledge-base gateway - authenticated MCP tool server
//!
//! This crate exposes two tools, `search` and `fetch`, over a small document
//! corpus to remote agent clients. Every protected request passes through:
//!
//! - **Authentication**: `Authorization: Bearer <key>`, compared in constant time
//! - **Rate limiting**: one token bucket per client, refilled continuously
//! - **Tool routing**: typed argument validation, then dispatch to the corpus
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints (No Authentication)
//!
//! - `GET /health` - Liveness probe
//!
//! ## Protected Endpoints (API Key Required)
//!
//! - `GET /` - Server information
//! - `GET /metrics` - Prometheus metrics
//! - `POST /mcp` - JSON-RPC 2.0 (`initialize`, `tools/list`, `tools/call`)
//! - `POST /mcp/tools/list` - Tool registry
//! - `POST /mcp/tools/call` - Invoke `search` or `fetch`

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod state;
pub mod tools;

pub use auth::AuthGuard;
pub use config::{RateLimitConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use rate_limit::{Admission, RateLimiter};
pub use server::{build_router, start_server};
pub use state::ServerState;
pub use tools::{ToolCall, ToolError, ToolOutput, ToolRouter};
