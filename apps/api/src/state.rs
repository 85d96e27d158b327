use std::sync::Arc;

use crate::admission::concurrency::InferenceGate;
use crate::admission::rate_limit::SlidingWindowRateLimiter;
use crate::artifacts::ArtifactRegistry;
use crate::config::Config;

/// Shared application state injected into handlers and middleware via Axum
/// extractors. The artifact registry is read-only after startup; the limiter
/// and the permit pool carry their own synchronization.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub artifacts: Arc<ArtifactRegistry>,
    pub limiter: SlidingWindowRateLimiter,
    pub infer_gate: InferenceGate,
}

impl AppState {
    pub fn new(config: Config, artifacts: ArtifactRegistry) -> Self {
        let infer_gate = InferenceGate::new(config.ml_max_concurrent_infer);
        AppState {
            config,
            artifacts: Arc::new(artifacts),
            limiter: SlidingWindowRateLimiter::new(),
            infer_gate,
        }
    }
}
