use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::skill_gap::analyzer::{
    analyze_skill_gap, available_roles, SkillGapRequest, SkillGapResponse,
};
use crate::state::AppState;

/// POST /api/v1/skill-gap/analyze
pub async fn handle_skill_gap_analyze(
    State(state): State<AppState>,
    Json(req): Json<SkillGapRequest>,
) -> Result<Json<SkillGapResponse>, AppError> {
    let registry = &state.artifacts;
    let (Some(terms), Some(matrix), Some(role_index)) = (
        registry.tfidf_terms.as_deref(),
        registry.tfidf_matrix.as_deref(),
        registry.tfidf_role_index.as_deref(),
    ) else {
        return Err(AppError::Unavailable(
            "Term-importance models not loaded".to_string(),
        ));
    };

    Ok(Json(analyze_skill_gap(&req, terms, matrix, role_index)))
}

/// GET /api/v1/skill-gap/roles
pub async fn handle_skill_gap_roles(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    let role_index = state.artifacts.tfidf_role_index.as_deref().ok_or_else(|| {
        AppError::Unavailable("Term-importance models not loaded".to_string())
    })?;
    Ok(Json(available_roles(role_index)))
}
