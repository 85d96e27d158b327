pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::admission::{auth, rate_limit};
use crate::clusters::handlers as cluster_handlers;
use crate::salary::handlers as salary_handlers;
use crate::skill_gap::handlers as skill_gap_handlers;
use crate::state::AppState;

/// Assembles the API router. Middleware order (outermost first): auth gate,
/// then rate-limit/concurrency admission, then the domain handlers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health::health_handler))
        .route(
            "/api/v1/salary/predict",
            post(salary_handlers::handle_salary_predict),
        )
        .route(
            "/api/v1/salary/metadata",
            get(salary_handlers::handle_salary_metadata),
        )
        .route(
            "/api/v1/skill-gap/analyze",
            post(skill_gap_handlers::handle_skill_gap_analyze),
        )
        .route(
            "/api/v1/skill-gap/roles",
            get(skill_gap_handlers::handle_skill_gap_roles),
        )
        .route("/api/v1/clusters", get(cluster_handlers::handle_clusters))
        .route(
            "/api/v1/clusters/adjacent/:slug",
            get(cluster_handlers::handle_adjacent_roles),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::gate_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .with_state(state)
}
