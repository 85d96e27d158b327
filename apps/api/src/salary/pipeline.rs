//! The salary prediction post-processing pipeline: feature reconstruction,
//! tier resolution, quantile inference, premium blending, bound clamping,
//! confidence, and explanatory factors.

use crate::artifacts::model::{Encoders, ScoreModel};
use crate::artifacts::{ArtifactRegistry, CompanyScaleMeta, PremiumTable, SkillVocab};
use crate::salary::features::{build_features, encode_categoricals, reindex, resolve_known_skills};
use crate::salary::premiums::apply_premiums;
use crate::salary::tiers::resolve_company_scale_tier;
use crate::salary::types::{SalaryFactor, SalaryPredictionRequest, SalaryPredictionResponse};

pub const SALARY_FLOOR: f64 = 20_000.0;
pub const SALARY_CEILING: f64 = 500_000.0;

/// The artifact set the pipeline requires, borrowed from the registry.
/// Construction fails when any required artifact is absent; the optional
/// ones degrade individual steps instead.
pub struct SalaryArtifacts<'a> {
    pub median: &'a dyn ScoreModel,
    pub p10: &'a dyn ScoreModel,
    pub p90: &'a dyn ScoreModel,
    pub encoders: &'a Encoders,
    pub feature_columns: &'a [String],
    pub skill_vocab: Option<&'a SkillVocab>,
    pub scale_meta: Option<&'a CompanyScaleMeta>,
    pub premiums: Option<&'a PremiumTable>,
}

impl<'a> SalaryArtifacts<'a> {
    pub fn from_registry(registry: &'a ArtifactRegistry) -> Option<Self> {
        Some(SalaryArtifacts {
            median: registry.salary_median.as_deref()?,
            p10: registry.salary_p10.as_deref()?,
            p90: registry.salary_p90.as_deref()?,
            encoders: registry.salary_encoders.as_ref()?,
            feature_columns: registry.salary_feature_columns.as_deref()?,
            skill_vocab: registry.salary_skill_vocab.as_ref(),
            scale_meta: registry.salary_company_scale_meta.as_ref(),
            premiums: registry.salary_premiums.as_ref(),
        })
    }
}

pub fn predict_salary(
    req: &SalaryPredictionRequest,
    artifacts: &SalaryArtifacts,
) -> SalaryPredictionResponse {
    let (company_tier, company_posting_count) =
        resolve_company_scale_tier(req, artifacts.scale_meta);
    let known_skills = resolve_known_skills(&req.skills, artifacts.skill_vocab);

    let mut features = build_features(
        req,
        &known_skills,
        &company_tier,
        company_posting_count,
        artifacts.skill_vocab,
        &artifacts.encoders.top_industries,
    );
    encode_categoricals(&mut features, artifacts.encoders);
    let row = reindex(&features, artifacts.feature_columns);

    let pred_median = artifacts.median.predict(&row);
    let pred_p10 = artifacts.p10.predict(&row);
    let pred_p90 = artifacts.p90.predict(&row);

    let blended = apply_premiums(
        &req.title,
        &known_skills,
        &company_tier,
        pred_median,
        pred_p10,
        pred_p90,
        artifacts.premiums,
    );

    // Final clamps guarantee P10 <= median <= P90 inside the global band.
    let median = blended.median.clamp(SALARY_FLOOR, SALARY_CEILING);
    let p10 = blended.p10.clamp(SALARY_FLOOR, median);
    let p90 = blended.p90.clamp(median, SALARY_CEILING);

    let range = p90 - p10;
    let confidence = (1.0 - (range / median.max(1.0)) * 0.5).clamp(0.1, 1.0);

    SalaryPredictionResponse {
        predicted_salary: median.round() as i64,
        lower_bound: p10.round() as i64,
        upper_bound: p90.round() as i64,
        confidence: round3(confidence),
        factors: top_factors(artifacts.median, 5),
        adjustments: blended.adjustments,
    }
}

/// Top-k features of the median predictor by gain importance, normalized to
/// sum to 1 across all features (all zero when the model reports no gain).
fn top_factors(model: &dyn ScoreModel, k: usize) -> Vec<SalaryFactor> {
    let names = model.feature_names();
    let importances = model.gain_importances();

    let total: f64 = importances.iter().sum();
    let denom = if total > 0.0 { total } else { 1.0 };

    let mut indexed: Vec<(usize, f64)> = importances.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    indexed
        .into_iter()
        .take(k)
        .filter_map(|(i, importance)| {
            names.get(i).map(|name| SalaryFactor {
                feature: name.clone(),
                importance: round4(importance / denom),
            })
        })
        .collect()
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
