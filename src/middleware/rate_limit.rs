//! Per-client-IP token buckets for the search route.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use dashmap::DashMap;
use tokio::task::JoinHandle;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

/// One token bucket per client IP, refilled continuously at the configured
/// per-minute rate. Buckets idle past the cleanup window are dropped by a
/// background sweep.
pub struct IpRateLimiter {
    buckets: DashMap<String, Bucket>,
    per_minute: u32,
}

impl IpRateLimiter {
    pub fn new(per_minute: u32) -> Arc<Self> {
        Arc::new(Self {
            buckets: DashMap::new(),
            per_minute,
        })
    }

    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let capacity = f64::from(self.per_minute);

        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket {
                tokens: capacity,
                last_refill: now,
                last_seen: now,
            });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * capacity / 60.0).min(capacity);
        bucket.last_refill = now;
        bucket.last_seen = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Periodically drops buckets that have been idle longer than `idle`.
    pub fn spawn_cleanup(self: &Arc<Self>, every: Duration, idle: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let now = Instant::now();
                limiter
                    .buckets
                    .retain(|_, bucket| now.duration_since(bucket.last_seen) < idle);
            }
        })
    }
}

/// Client IP resolution order: first `X-Forwarded-For` entry, then
/// `X-Real-IP`, then the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware for the search route: 429 with `Retry-After: 60` once the
/// client's bucket is exhausted.
pub async fn limit_search(
    Extension(limiter): Extension<Arc<IpRateLimiter>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(request.headers(), Some(peer));

    if limiter.allow(&ip) {
        return next.run(request).await;
    }

    tracing::warn!("Rate limit exceeded for {}", ip);

    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({ "error": "rate limit exceeded" })),
    )
        .into_response();
    response
        .headers_mut()
        .insert("retry-after", HeaderValue::from_static("60"));
    response
}
