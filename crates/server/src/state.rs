use crate::auth::AuthGuard;
use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::rate_limit::RateLimiter;
use crate::tools::ToolRouter;
use corpus::{DocumentStore, SearchEngine};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
///
/// Everything except the rate limiter is immutable after construction.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Bearer credential check
    pub auth: AuthGuard,

    /// Per-client token buckets
    pub rate_limiter: Arc<RateLimiter>,

    /// Tool dispatch over the shared corpus
    pub tools: Arc<ToolRouter>,

    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,

    pub started_at: Instant,
}

impl ServerState {
    /// Create new server state, loading the corpus named by the config
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = kb_gateway::load_store(config.corpus_path.as_deref())?;
        Self::with_store(config, store)
    }

    /// Create server state over an already-built corpus
    pub fn with_store(config: ServerConfig, store: DocumentStore) -> ServerResult<Self> {
        config.validate()?;

        let engine = SearchEngine::new(Arc::new(store))
            .with_max_results(config.max_results)
            .with_metadata_weight(config.metadata_weight);

        Ok(Self {
            auth: AuthGuard::new(&config.api_key),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            tools: Arc::new(ToolRouter::new(engine)),
            metrics: None,
            started_at: Instant::now(),
            config: Arc::new(config),
        })
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn document_count(&self) -> usize {
        self.tools.engine().store().len()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
