use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/v1/health
/// Exempt from auth and rate limiting; reports which artifacts loaded.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "models_loaded": state.artifacts.loaded_names(),
        "model_dir": state.artifacts.resolved_dir.display().to_string(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
