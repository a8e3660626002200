//! Per-client admission control.
//!
//! Every client identity owns one token bucket. Buckets are created full on
//! first sight and refilled lazily on each check. The registry lives behind a
//! single mutex, so lookup-or-create and refill-then-consume happen as one
//! atomic step for every caller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::config::RateLimitConfig;
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::security::headers::client_identity;

/// A token bucket. Token count stays within `[0, capacity]`.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
        }
    }

    fn refill(&mut self, capacity: f64, refill_rate: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        if now > self.last_refill {
            self.last_refill = now;
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64, now: Instant) -> bool {
        self.refill(capacity, refill_rate, now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Parameters an [`AdmissionController`] cannot run with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateLimitError {
    #[error("refill_rate must be a positive finite number, got {0}")]
    RefillRate(f64),

    #[error("burst_capacity must be at least 1")]
    BurstCapacity,
}

/// Registry of token buckets keyed by client identity.
pub struct AdmissionController {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    refill_rate: f64,
    burst_capacity: f64,
    idle_ttl: Duration,
}

impl AdmissionController {
    /// Create a controller. `refill_rate` is in tokens per second.
    pub fn new(
        refill_rate: f64,
        burst_capacity: u32,
        idle_ttl: Duration,
    ) -> Result<Self, RateLimitError> {
        if !refill_rate.is_finite() || refill_rate <= 0.0 {
            return Err(RateLimitError::RefillRate(refill_rate));
        }
        if burst_capacity == 0 {
            return Err(RateLimitError::BurstCapacity);
        }

        Ok(Self {
            buckets: Mutex::new(HashMap::new()),
            refill_rate,
            burst_capacity: burst_capacity as f64,
            idle_ttl,
        })
    }

    pub fn from_config(config: &RateLimitConfig) -> Result<Self, RateLimitError> {
        Self::new(
            config.refill_rate,
            config.burst_capacity,
            Duration::from_secs(config.idle_ttl_secs),
        )
    }

    /// Decide whether a request from `client` may proceed.
    ///
    /// Never blocks on anything but the registry lock and never fails. Any
    /// string is a valid identity.
    pub fn admit(&self, client: &str) -> bool {
        let mut buckets = self.lock();
        self.admit_locked(&mut buckets, client, Instant::now())
    }

    fn admit_locked(
        &self,
        buckets: &mut HashMap<String, TokenBucket>,
        client: &str,
        now: Instant,
    ) -> bool {
        // Avoid allocating a key on the hot path for known clients.
        if let Some(bucket) = buckets.get_mut(client) {
            return bucket.try_acquire(self.burst_capacity, self.refill_rate, now);
        }

        let mut bucket = TokenBucket::full(self.burst_capacity, now);
        let admitted = bucket.try_acquire(self.burst_capacity, self.refill_rate, now);
        buckets.insert(client.to_owned(), bucket);
        metrics::record_tracked_clients(buckets.len());
        admitted
    }

    /// Drop buckets that have been idle longer than the configured TTL.
    ///
    /// Returns the number of evicted buckets.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let mut buckets = self.lock();
        let before = buckets.len();
        let ttl = self.idle_ttl;
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) <= ttl);
        let evicted = before - buckets.len();
        metrics::record_tracked_clients(buckets.len());
        evicted
    }

    /// Number of client identities currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    /// Tokens currently held by `client`, refilled to now. `None` if unseen.
    pub fn available_tokens(&self, client: &str) -> Option<f64> {
        let mut buckets = self.lock();
        let now = Instant::now();
        buckets.get_mut(client).map(|bucket| {
            bucket.refill(self.burst_capacity, self.refill_rate, now);
            bucket.tokens
        })
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    pub fn burst_capacity(&self) -> u32 {
        self.burst_capacity as u32
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TokenBucket>> {
        // Every mutation completes before any panic point, so a poisoned map
        // is still consistent.
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// State for the admission middleware. No controller means admission is off.
#[derive(Clone)]
pub struct RateLimitState {
    pub controller: Option<Arc<AdmissionController>>,
    pub trusted_proxies: Arc<[IpAddr]>,
}

/// Middleware rejecting requests from clients whose bucket is exhausted.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(controller) = &state.controller else {
        return next.run(request).await;
    };

    let client = client_identity(addr.ip(), request.headers(), &state.trusted_proxies);

    if controller.admit(&client) {
        next.run(request).await
    } else {
        tracing::warn!(
            client = %client,
            request_id = request_id(request.headers()).unwrap_or("unknown"),
            path = %request.uri().path(),
            "Rate limit exceeded"
        );
        metrics::record_rate_limited();
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({ "error": "Too many requests" })),
        )
            .into_response()
    }
}

/// Periodically evict idle buckets until shutdown is signalled.
pub async fn run_sweeper(
    controller: Arc<AdmissionController>,
    interval: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    if interval.is_zero() {
        tracing::error!("Rate limit sweep interval is zero, idle buckets will not be evicted");
        return;
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = controller.sweep();
                if evicted > 0 {
                    tracing::debug!(
                        evicted,
                        remaining = controller.tracked_clients(),
                        "Evicted idle rate limit buckets"
                    );
                }
            }
            _ = shutdown.recv() => {
                tracing::debug!("Rate limit sweeper stopping");
                break;
            }
        }
    }
}
