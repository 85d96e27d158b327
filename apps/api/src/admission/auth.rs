//! Shared-secret auth gate for `/api/v1` paths.
//!
//! A deployment with no configured credential answers 503 rather than letting
//! an unconfigured service masquerade as authorized.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::audit::GateEvent;
use crate::errors::AppError;
use crate::identity::{client_identity, hash_identifier};
use crate::state::AppState;

pub const SERVICE_KEY_HEADER: &str = "x-ml-service-key";

/// Pure decision core, kept separate from the middleware for testability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Pass,
    /// No credential configured on the server side.
    Unconfigured,
    /// Missing or mismatched request credential.
    Rejected,
}

pub fn authorize(configured_key: Option<&str>, provided_key: Option<&str>) -> AuthDecision {
    let Some(expected) = configured_key.filter(|k| !k.is_empty()) else {
        return AuthDecision::Unconfigured;
    };
    match provided_key.map(str::trim) {
        Some(provided) if provided == expected => AuthDecision::Pass,
        _ => AuthDecision::Rejected,
    }
}

/// Auth middleware. Bypasses non-API paths and the health endpoint entirely;
/// every other decision, pass-throughs included, is audit-logged.
pub async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if !path.starts_with("/api/v1") || path == "/api/v1/health" {
        return next.run(request).await;
    }

    if !state.config.ml_service_auth_required {
        return next.run(request).await;
    }

    let started = Instant::now();
    let method = request.method().as_str().to_string();
    let ip_hash = hash_identifier(&client_identity(&request));

    let provided = request
        .headers()
        .get(SERVICE_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match authorize(state.config.ml_service_key.as_deref(), provided) {
        AuthDecision::Unconfigured => {
            let response =
                AppError::Unavailable("ML service is not configured".to_string()).into_response();
            GateEvent::new(
                "ml_service_auth",
                &path,
                &method,
                None,
                &ip_hash,
                response.status().as_u16(),
                true,
                "missing_ml_service_key",
                started,
            )
            .emit();
            response
        }
        AuthDecision::Rejected => {
            let response = AppError::Unauthorized.into_response();
            GateEvent::new(
                "ml_service_auth",
                &path,
                &method,
                None,
                &ip_hash,
                response.status().as_u16(),
                true,
                "invalid_ml_service_key",
                started,
            )
            .emit();
            response
        }
        AuthDecision::Pass => {
            let response = next.run(request).await;
            GateEvent::new(
                "ml_service_auth",
                &path,
                &method,
                None,
                &ip_hash,
                response.status().as_u16(),
                false,
                "ok",
                started,
            )
            .emit();
            response
        }
    }
}
