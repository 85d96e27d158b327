//! Per-identity sliding-window rate limiting and the combined admission
//! middleware for gated endpoints.
//!
//! Two scopes per identity: one global bucket shared by every endpoint class
//! and one bucket per class. Both are checked, and consumed together, under a
//! single exclusive lock spanning the prune-check-record sequence. That
//! serializes rate decisions across all identities; fine at this service's
//! traffic levels, monitor before scaling out.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tokio::sync::Mutex;

use crate::audit::GateEvent;
use crate::identity::{client_identity, hash_identifier};
use crate::state::AppState;

/// Trailing window over which requests are counted.
pub const WINDOW_SECONDS: f64 = 3600.0;

/// Endpoint classes subject to the concurrency admission gate.
pub const HEAVY_ENDPOINTS: [&str; 2] = ["predict", "skill_gap"];

/// Outcome of one check-and-consume pass. Computed fresh per request.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// `"global"` or `"route"`.
    pub scope: &'static str,
    pub limit: usize,
    pub remaining: usize,
    pub retry_after_seconds: u64,
    pub reset_at_seconds: i64,
}

/// Sliding-window limiter over per-(identity, scope) timestamp buckets.
///
/// Buckets are created lazily and never evicted; identities that stop
/// sending traffic leave empty buckets behind.
#[derive(Clone, Default)]
pub struct SlidingWindowRateLimiter {
    buckets: Arc<Mutex<HashMap<String, VecDeque<f64>>>>,
}

impl SlidingWindowRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn check_and_consume(
        &self,
        identity: &str,
        endpoint_class: &str,
        endpoint_limit: usize,
        global_limit: usize,
    ) -> RateLimitDecision {
        self.check_and_consume_at(unix_now(), identity, endpoint_class, endpoint_limit, global_limit)
            .await
    }

    /// Clock-injected variant used by `check_and_consume` and the tests.
    pub async fn check_and_consume_at(
        &self,
        now: f64,
        identity: &str,
        endpoint_class: &str,
        endpoint_limit: usize,
        global_limit: usize,
    ) -> RateLimitDecision {
        let global_key = format!("{identity}:global");
        let endpoint_key = format!("{identity}:{endpoint_class}");

        let mut buckets = self.buckets.lock().await;

        prune(buckets.entry(global_key.clone()).or_default(), now);
        prune(buckets.entry(endpoint_key.clone()).or_default(), now);

        let global_len = buckets[&global_key].len();
        if global_len >= global_limit {
            let oldest = buckets[&global_key].front().copied().unwrap_or(now);
            return rejection(now, oldest, "global", global_limit);
        }

        let endpoint_len = buckets[&endpoint_key].len();
        if endpoint_len >= endpoint_limit {
            let oldest = buckets[&endpoint_key].front().copied().unwrap_or(now);
            return rejection(now, oldest, "route", endpoint_limit);
        }

        // Admitted: record in both scopes atomically, under the same lock.
        if let Some(bucket) = buckets.get_mut(&global_key) {
            bucket.push_back(now);
        }
        let endpoint_bucket = buckets.entry(endpoint_key).or_default();
        endpoint_bucket.push_back(now);

        let remaining = endpoint_limit.saturating_sub(endpoint_bucket.len());
        let reset_at = endpoint_bucket
            .front()
            .map(|oldest| (oldest + WINDOW_SECONDS) as i64)
            .unwrap_or((now + WINDOW_SECONDS) as i64);

        RateLimitDecision {
            allowed: true,
            scope: "route",
            limit: endpoint_limit,
            remaining,
            retry_after_seconds: 0,
            reset_at_seconds: reset_at,
        }
    }

    /// Retained timestamp count for one (identity, scope) pair.
    #[cfg(test)]
    pub async fn bucket_len(&self, identity: &str, scope: &str) -> usize {
        let buckets = self.buckets.lock().await;
        buckets
            .get(&format!("{identity}:{scope}"))
            .map(|b| b.len())
            .unwrap_or(0)
    }
}

fn prune(bucket: &mut VecDeque<f64>, now: f64) {
    let boundary = now - WINDOW_SECONDS;
    while bucket.front().is_some_and(|ts| *ts <= boundary) {
        bucket.pop_front();
    }
}

fn rejection(now: f64, oldest: f64, scope: &'static str, limit: usize) -> RateLimitDecision {
    let retry_after = ((oldest + WINDOW_SECONDS - now).ceil() as i64).max(1) as u64;
    RateLimitDecision {
        allowed: false,
        scope,
        limit,
        remaining: 0,
        retry_after_seconds: retry_after,
        reset_at_seconds: now as i64 + retry_after as i64,
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Maps method + path to its rate-limit endpoint class.
pub fn classify_endpoint(method: &str, path: &str) -> &'static str {
    match (method, path) {
        ("POST", "/api/v1/salary/predict") => "predict",
        ("POST", "/api/v1/skill-gap/analyze") => "skill_gap",
        ("GET", "/api/v1/salary/metadata") => "metadata",
        _ => "lookup",
    }
}

/// Builds the 429 body with the retry and quota headers.
fn rate_limited_response(
    retry_after_seconds: u64,
    limit: usize,
    remaining: usize,
    reset_at_seconds: i64,
) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({
            "error": "rate_limited",
            "message": "Too many requests",
            "retry_after_seconds": retry_after_seconds,
        })),
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert("retry-after", HeaderValue::from(retry_after_seconds));
    headers.insert("x-ratelimit-limit", HeaderValue::from(limit as u64));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining as u64));
    headers.insert("x-ratelimit-reset", HeaderValue::from(reset_at_seconds));
    response
}

/// Rate-limit + concurrency admission middleware for `/api/v1` paths.
///
/// Runs inside the auth gate. Order per request: heavy-inference kill
/// switch, sliding-window check, then (heavy classes only) the permit pool
/// around the downstream handler. Every decision is audit-logged.
pub async fn gate_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if !path.starts_with("/api/v1") || path == "/api/v1/health" {
        return next.run(request).await;
    }

    let started = Instant::now();
    let method = request.method().as_str().to_string();
    let endpoint_class = classify_endpoint(&method, &path);
    let identity = client_identity(&request);
    let ip_hash = hash_identifier(&identity);
    let is_heavy = HEAVY_ENDPOINTS.contains(&endpoint_class);

    if state.config.ml_disable_heavy_inference && is_heavy {
        let response = (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "temporarily_disabled",
                "message": "Heavy ML inference is temporarily disabled",
            })),
        )
            .into_response();
        GateEvent::new(
            "ml_service_rate_limit",
            &path,
            &method,
            Some(endpoint_class),
            &ip_hash,
            response.status().as_u16(),
            true,
            "heavy_inference_disabled",
            started,
        )
        .emit();
        return response;
    }

    let endpoint_limit = state.config.endpoint_limit_for(endpoint_class);
    let decision = if state.config.ml_rate_limit_enabled {
        let decision = state
            .limiter
            .check_and_consume(
                &identity,
                endpoint_class,
                endpoint_limit,
                state.config.ml_limit_global_per_hour,
            )
            .await;
        if !decision.allowed {
            let response = rate_limited_response(
                decision.retry_after_seconds,
                decision.limit,
                decision.remaining,
                decision.reset_at_seconds,
            );
            let reason = if decision.scope == "global" {
                "rate_limited_global"
            } else {
                "rate_limited_route"
            };
            GateEvent::new(
                "ml_service_rate_limit",
                &path,
                &method,
                Some(endpoint_class),
                &ip_hash,
                response.status().as_u16(),
                true,
                reason,
                started,
            )
            .emit();
            return response;
        }
        decision
    } else {
        RateLimitDecision {
            allowed: true,
            scope: "route",
            limit: endpoint_limit,
            remaining: endpoint_limit,
            retry_after_seconds: 0,
            reset_at_seconds: unix_now() as i64 + WINDOW_SECONDS as i64,
        }
    };

    let mut response = if is_heavy {
        match state.infer_gate.try_acquire() {
            Some(_permit) => {
                // Permit held across the whole downstream call; the guard's
                // Drop releases it on success, error, and cancellation alike.
                next.run(request).await
            }
            None => {
                let response = rate_limited_response(
                    5,
                    state.infer_gate.max_permits(),
                    0,
                    unix_now() as i64 + 5,
                );
                GateEvent::new(
                    "ml_service_rate_limit",
                    &path,
                    &method,
                    Some(endpoint_class),
                    &ip_hash,
                    response.status().as_u16(),
                    true,
                    "concurrency_saturated",
                    started,
                )
                .emit();
                return response;
            }
        }
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit as u64));
    headers.insert(
        "x-ratelimit-remaining",
        HeaderValue::from(decision.remaining as u64),
    );
    headers.insert(
        "x-ratelimit-reset",
        HeaderValue::from(decision.reset_at_seconds),
    );

    let status = response.status().as_u16();
    GateEvent::new(
        "ml_service_rate_limit",
        &path,
        &method,
        Some(endpoint_class),
        &ip_hash,
        status,
        status == 429,
        "ok",
        started,
    )
    .emit();
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: f64 = 1_700_000_000.0;

    #[tokio::test]
    async fn test_admits_until_endpoint_limit() {
        let limiter = SlidingWindowRateLimiter::new();
        for i in 0..40 {
            let d = limiter
                .check_and_consume_at(T0 + i as f64, "1.2.3.4", "predict", 40, 300)
                .await;
            assert!(d.allowed, "request {i} should be admitted");
        }
        let d = limiter
            .check_and_consume_at(T0 + 40.0, "1.2.3.4", "predict", 40, 300)
            .await;
        assert!(!d.allowed);
        assert_eq!(d.scope, "route");
        assert_eq!(d.remaining, 0);
        assert!(d.retry_after_seconds >= 1);
    }

    #[tokio::test]
    async fn test_global_limit_rejects_across_classes() {
        let limiter = SlidingWindowRateLimiter::new();
        for i in 0..6 {
            let class = if i % 2 == 0 { "lookup" } else { "metadata" };
            let d = limiter
                .check_and_consume_at(T0 + i as f64, "ip", class, 100, 6)
                .await;
            assert!(d.allowed);
        }
        let d = limiter
            .check_and_consume_at(T0 + 10.0, "ip", "lookup", 100, 6)
            .await;
        assert!(!d.allowed);
        assert_eq!(d.scope, "global");
        assert_eq!(d.limit, 6);
    }

    #[tokio::test]
    async fn test_rejected_request_not_recorded() {
        let limiter = SlidingWindowRateLimiter::new();
        for i in 0..3 {
            limiter
                .check_and_consume_at(T0 + i as f64, "ip", "predict", 3, 300)
                .await;
        }
        for _ in 0..5 {
            let d = limiter
                .check_and_consume_at(T0 + 10.0, "ip", "predict", 3, 300)
                .await;
            assert!(!d.allowed);
        }
        assert_eq!(limiter.bucket_len("ip", "predict").await, 3);
        assert_eq!(limiter.bucket_len("ip", "global").await, 3);
    }

    #[tokio::test]
    async fn test_window_pruning_readmits() {
        let limiter = SlidingWindowRateLimiter::new();
        let d = limiter
            .check_and_consume_at(T0, "ip", "predict", 1, 300)
            .await;
        assert!(d.allowed);
        let d = limiter
            .check_and_consume_at(T0 + 100.0, "ip", "predict", 1, 300)
            .await;
        assert!(!d.allowed);

        // Just past the window boundary the old timestamp is pruned.
        let d = limiter
            .check_and_consume_at(T0 + WINDOW_SECONDS + 0.5, "ip", "predict", 1, 300)
            .await;
        assert!(d.allowed);
        assert_eq!(limiter.bucket_len("ip", "predict").await, 1);
    }

    #[tokio::test]
    async fn test_retry_after_tracks_oldest_timestamp() {
        let limiter = SlidingWindowRateLimiter::new();
        limiter
            .check_and_consume_at(T0, "ip", "predict", 1, 300)
            .await;
        let d = limiter
            .check_and_consume_at(T0 + 600.0, "ip", "predict", 1, 300)
            .await;
        assert!(!d.allowed);
        assert_eq!(d.retry_after_seconds, 3000);
        assert_eq!(d.reset_at_seconds, (T0 + 600.0) as i64 + 3000);
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let limiter = SlidingWindowRateLimiter::new();
        limiter
            .check_and_consume_at(T0, "alice", "predict", 1, 300)
            .await;
        let d = limiter
            .check_and_consume_at(T0 + 1.0, "bob", "predict", 1, 300)
            .await;
        assert!(d.allowed);
    }

    #[tokio::test]
    async fn test_remaining_counts_down() {
        let limiter = SlidingWindowRateLimiter::new();
        let d = limiter
            .check_and_consume_at(T0, "ip", "metadata", 3, 300)
            .await;
        assert_eq!(d.remaining, 2);
        let d = limiter
            .check_and_consume_at(T0 + 1.0, "ip", "metadata", 3, 300)
            .await;
        assert_eq!(d.remaining, 1);
        let d = limiter
            .check_and_consume_at(T0 + 2.0, "ip", "metadata", 3, 300)
            .await;
        assert_eq!(d.remaining, 0);
        assert!(d.allowed);
    }

    #[test]
    fn test_classify_endpoint_table() {
        assert_eq!(classify_endpoint("POST", "/api/v1/salary/predict"), "predict");
        assert_eq!(
            classify_endpoint("POST", "/api/v1/skill-gap/analyze"),
            "skill_gap"
        );
        assert_eq!(classify_endpoint("GET", "/api/v1/salary/metadata"), "metadata");
        assert_eq!(classify_endpoint("GET", "/api/v1/clusters"), "lookup");
        assert_eq!(
            classify_endpoint("GET", "/api/v1/clusters/adjacent/data-scientist"),
            "lookup"
        );
        assert_eq!(classify_endpoint("GET", "/api/v1/skill-gap/roles"), "lookup");
        // Method matters: a GET against the predict path is not the predict class.
        assert_eq!(classify_endpoint("GET", "/api/v1/salary/predict"), "lookup");
    }

    #[test]
    fn test_rate_limited_response_headers() {
        let response = rate_limited_response(7, 40, 0, 1_700_000_100);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "7");
        assert_eq!(response.headers()["x-ratelimit-limit"], "40");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
        assert_eq!(response.headers()["x-ratelimit-reset"], "1700000100");
    }
}
