use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ServerError, ServerResult};

/// Environment variable prefix, e.g. `KB_GATEWAY_API_KEY`,
/// `KB_GATEWAY_RATE_LIMIT__CAPACITY`.
pub const ENV_PREFIX: &str = "KB_GATEWAY";

/// Server configuration
///
/// Built once at startup and handed to each component constructor; nothing
/// downstream reads the process environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared bearer secret expected as `Authorization: Bearer <api_key>`
    #[serde(default)]
    pub api_key: String,

    /// Display name reported by `/`, `/health` and `initialize`
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Allowed CORS origins; `*` allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in KB
    #[serde(default = "default_max_body_size_kb")]
    pub max_body_size_kb: usize,

    /// Log filter directive (e.g. `info`, `server=debug`)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable text
    #[serde(default = "default_true")]
    pub log_json: bool,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Identify clients by the first `X-Forwarded-For` hop.
    ///
    /// Must be enabled when the gateway runs behind a reverse proxy: with the
    /// default `false` every request is keyed by the proxy's address, so all
    /// clients share one token bucket. Leave it off when clients connect
    /// directly, since the header is then client-controlled.
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// YAML/JSON corpus file; the built-in sample corpus when unset
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,

    /// Maximum number of search results returned per call
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Score added per query term found in a metadata value; 0 ranks on
    /// title and text only
    #[serde(default = "default_metadata_weight")]
    pub metadata_weight: u32,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Token-bucket settings applied to every client.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct RateLimitConfig {
    /// Burst capacity in requests
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Steady-state refill in tokens per second
    #[serde(default = "default_refill_per_sec")]
    pub refill_per_sec: f64,

    /// Buckets untouched for this long are evicted
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,

    /// How often the eviction sweep runs
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Bucket count that forces an eviction sweep before admitting a new client
    #[serde(default = "default_max_buckets")]
    pub max_buckets: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refill_per_sec: default_refill_per_sec(),
            idle_ttl_secs: default_idle_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_buckets: default_max_buckets(),
        }
    }
}

impl RateLimitConfig {
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_refill_per_sec(mut self, rate: f64) -> Self {
        self.refill_per_sec = rate;
        self
    }

    pub fn with_max_buckets(mut self, max_buckets: usize) -> Self {
        self.max_buckets = max_buckets;
        self
    }

    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            api_key: String::new(),
            server_name: default_server_name(),
            cors_origins: default_cors_origins(),
            timeout_secs: default_timeout_secs(),
            max_body_size_kb: default_max_body_size_kb(),
            log_level: default_log_level(),
            log_json: default_true(),
            metrics_enabled: default_true(),
            trust_forwarded_for: false,
            corpus_path: None,
            max_results: default_max_results(),
            metadata_weight: default_metadata_weight(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `server.*` file, then environment
    /// variables prefixed with `KB_GATEWAY_`.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors_origins")
                    .try_parsing(true),
            );

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the gateway cannot run with.
    pub fn validate(&self) -> ServerResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(ServerError::Config(format!(
                "an API key is required; set {ENV_PREFIX}_API_KEY"
            )));
        }
        if self.rate_limit.capacity == 0 {
            return Err(ServerError::Config(
                "rate_limit.capacity must be >= 1".to_string(),
            ));
        }
        if !(self.rate_limit.refill_per_sec > 0.0 && self.rate_limit.refill_per_sec.is_finite()) {
            return Err(ServerError::Config(
                "rate_limit.refill_per_sec must be a positive number".to_string(),
            ));
        }
        if self.max_results == 0 {
            return Err(ServerError::Config("max_results must be >= 1".to_string()));
        }
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_kb * 1024
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|origin| origin.trim() == "*")
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_server_name() -> String {
    "Local Knowledge Base".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_kb() -> usize {
    256
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_results() -> usize {
    corpus::DEFAULT_MAX_RESULTS
}

fn default_metadata_weight() -> u32 {
    corpus::DEFAULT_METADATA_WEIGHT
}

fn default_capacity() -> u32 {
    20
}

fn default_refill_per_sec() -> f64 {
    10.0
}

fn default_idle_ttl_secs() -> u64 {
    600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_max_buckets() -> usize {
    10_000
}
