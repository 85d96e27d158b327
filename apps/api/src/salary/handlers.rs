use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::salary::pipeline::{predict_salary, SalaryArtifacts};
use crate::salary::tiers::default_tier_labels;
use crate::salary::types::{
    SalaryMetadataResponse, SalaryPredictionRequest, SalaryPredictionResponse,
};
use crate::state::AppState;

/// POST /api/v1/salary/predict
pub async fn handle_salary_predict(
    State(state): State<AppState>,
    Json(req): Json<SalaryPredictionRequest>,
) -> Result<Json<SalaryPredictionResponse>, AppError> {
    let artifacts = SalaryArtifacts::from_registry(&state.artifacts)
        .ok_or_else(|| AppError::Unavailable("Salary models not loaded".to_string()))?;
    Ok(Json(predict_salary(&req, &artifacts)))
}

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    15
}

/// GET /api/v1/salary/metadata
///
/// Autocomplete data for clients: known skills, title prefix search, and the
/// display labels for company scale tiers.
pub async fn handle_salary_metadata(
    State(state): State<AppState>,
    Query(params): Query<MetadataQuery>,
) -> Result<Json<SalaryMetadataResponse>, AppError> {
    if params.q.as_deref().is_some_and(|q| q.len() > 120) {
        return Err(AppError::Validation(
            "q must be at most 120 characters".to_string(),
        ));
    }
    if !(1..=100).contains(&params.limit) {
        return Err(AppError::Validation(
            "limit must be between 1 and 100".to_string(),
        ));
    }

    let skills = state
        .artifacts
        .salary_skill_vocab
        .as_ref()
        .map(|v| v.skills.clone())
        .unwrap_or_default();

    let mut titles = state
        .artifacts
        .salary_titles
        .clone()
        .unwrap_or_default();
    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let q_lower = q.to_lowercase();
        titles.retain(|t| t.title.starts_with(&q_lower));
    }
    titles.truncate(params.limit);

    let company_scale_tiers = state
        .artifacts
        .salary_company_scale_meta
        .as_ref()
        .filter(|m| !m.tiers.is_empty())
        .map(|m| m.tiers.clone())
        .unwrap_or_else(default_tier_labels);

    Ok(Json(SalaryMetadataResponse {
        skills,
        titles,
        company_scale_tiers,
    }))
}
