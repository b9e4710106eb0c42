//! Per-client admission control.
//!
//! Token bucket algorithm: every client owns a bucket that refills
//! continuously at `refill_per_sec` up to `capacity`; a request spends one
//! token or is rejected.

use crate::config::RateLimitConfig;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    Admit,
    /// Bucket exhausted; one token becomes available after `retry_after`.
    Reject { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admit)
    }

    /// Whole seconds for a `Retry-After` header, never less than one.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Admission::Admit => None,
            Admission::Reject { retry_after } => {
                Some((retry_after.as_secs_f64().ceil() as u64).max(1))
            }
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

/// Token bucket for a single client.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// New buckets start full.
    pub fn new(config: &RateLimitConfig, now: Instant) -> Self {
        let capacity = f64::from(config.capacity);
        Self {
            capacity,
            refill_per_sec: config.refill_per_sec,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: now,
                last_seen: now,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refill for the time elapsed since the last refill, then try to spend
    /// one token.
    pub fn try_acquire_at(&self, now: Instant) -> Admission {
        let mut state = self.lock();

        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = state.last_refill.max(now);
        state.last_seen = state.last_seen.max(now);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Admission::Admit
        } else {
            let missing = 1.0 - state.tokens;
            // tiny refill rates overflow Duration
            let retry_after = Duration::try_from_secs_f64(missing / self.refill_per_sec)
                .unwrap_or(Duration::MAX);
            Admission::Reject { retry_after }
        }
    }

    /// Tokens as of the last refill, without charging or refilling.
    pub fn tokens(&self) -> f64 {
        self.lock().tokens
    }

    fn last_seen(&self) -> Instant {
        self.lock().last_seen
    }
}

/// Counters for the limiter as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStats {
    pub buckets: usize,
    pub admitted: u64,
    pub rejected: u64,
    pub evicted: u64,
}

/// Client key → bucket map shared by all requests.
///
/// Lookups go through the sharded `DashMap`, so clients in different shards
/// never contend; the counters of one bucket are guarded by that bucket's own
/// mutex, which is taken without holding any shard lock.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: DashMap<String, Arc<TokenBucket>>,
    admitted: AtomicU64,
    rejected: AtomicU64,
    evicted: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
            admitted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn check(&self, client: &str) -> Admission {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &str, now: Instant) -> Admission {
        let bucket = self.bucket(client, now);
        let admission = bucket.try_acquire_at(now);

        match admission {
            Admission::Admit => self.admitted.fetch_add(1, Ordering::Relaxed),
            Admission::Reject { .. } => {
                tracing::debug!(client, "rate limit bucket exhausted");
                self.rejected.fetch_add(1, Ordering::Relaxed)
            }
        };
        admission
    }

    /// Current token count of `client`'s bucket, if one exists.
    pub fn peek_tokens(&self, client: &str) -> Option<f64> {
        self.buckets.get(client).map(|bucket| bucket.tokens())
    }

    /// Drop buckets idle for longer than the configured TTL.
    pub fn sweep(&self, now: Instant) -> usize {
        let ttl = self.config.idle_ttl();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_seen()) < ttl);
        let removed = before.saturating_sub(self.buckets.len());
        if removed > 0 {
            self.evicted.fetch_add(removed as u64, Ordering::Relaxed);
            tracing::debug!(removed, remaining = self.buckets.len(), "evicted idle rate-limit buckets");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn stats(&self) -> RateLimitStats {
        RateLimitStats {
            buckets: self.buckets.len(),
            admitted: self.admitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }

    /// Existing bucket, or a new full one. The read-path lookup is repeated
    /// under the entry lock so concurrent first requests share one bucket.
    fn bucket(&self, client: &str, now: Instant) -> Arc<TokenBucket> {
        if let Some(bucket) = self.buckets.get(client) {
            return Arc::clone(bucket.value());
        }

        if self.buckets.len() >= self.config.max_buckets {
            self.sweep(now);
            if self.buckets.len() >= self.config.max_buckets {
                self.evict_least_recent();
            }
        }

        self.buckets
            .entry(client.to_string())
            .or_insert_with(|| Arc::new(TokenBucket::new(&self.config, now)))
            .clone()
    }

    fn evict_least_recent(&self) {
        let oldest = self
            .buckets
            .iter()
            .min_by_key(|entry| entry.value().last_seen())
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            if self.buckets.remove(&key).is_some() {
                self.evicted.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    max_buckets = self.config.max_buckets,
                    "rate-limit bucket cap reached, evicted least recently seen client"
                );
            }
        }
    }
}
