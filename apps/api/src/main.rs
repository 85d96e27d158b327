mod admission;
mod artifacts;
mod audit;
mod clusters;
mod config;
mod errors;
mod identity;
mod routes;
mod salary;
mod skill_gap;
mod slug;
mod state;

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::artifacts::ArtifactRegistry;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Keep the audit stream visible whatever the app-level filter is.
            EnvFilter::new(format!(
                "{}={},gate_audit=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting labor-api v{}", env!("CARGO_PKG_VERSION"));

    // Load model artifacts once; the registry is read-only from here on.
    let registry = ArtifactRegistry::load(&config.model_dir)?;
    if config.ml_service_key.is_none() {
        info!("No ML_SERVICE_KEY configured; authenticated paths will answer 503");
    }

    let cors = build_cors_layer(&config.allowed_origins);
    let port = config.port;
    let state = AppState::new(config, registry);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    // connect_info provides the peer address the identity resolver falls
    // back to when no proxy headers are present.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// CORS restricted to the configured origins and the two methods the API
/// serves. A literal `*` opts into the permissive layer for local work.
fn build_cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
