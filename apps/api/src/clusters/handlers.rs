use axum::{
    extract::{Path, State},
    Json,
};

use crate::clusters::adjacency::{
    get_adjacent_roles, get_clusters, AdjacentRolesResponse, ClustersResponse,
};
use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/v1/clusters
pub async fn handle_clusters(
    State(state): State<AppState>,
) -> Result<Json<ClustersResponse>, AppError> {
    let registry = &state.artifacts;
    let (Some(labels), Some(projection), Some(role_index)) = (
        registry.cluster_labels.as_deref(),
        registry.cluster_tsne.as_deref(),
        registry.cluster_role_index.as_deref(),
    ) else {
        return Err(AppError::Unavailable(
            "Cluster models not loaded".to_string(),
        ));
    };

    Ok(Json(get_clusters(labels, projection, role_index)))
}

/// GET /api/v1/clusters/adjacent/:slug
pub async fn handle_adjacent_roles(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<AdjacentRolesResponse>, AppError> {
    let registry = &state.artifacts;
    let (Some(labels), Some(role_index), Some(feature_matrix)) = (
        registry.cluster_labels.as_deref(),
        registry.cluster_role_index.as_deref(),
        registry.cluster_feature_matrix.as_deref(),
    ) else {
        return Err(AppError::Unavailable(
            "Cluster models not loaded".to_string(),
        ));
    };

    get_adjacent_roles(&slug, labels, role_index, feature_matrix)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Role '{slug}' not found")))
}
