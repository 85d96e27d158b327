//! Feature reconstruction for the salary predictors.
//!
//! The trained models expect a fixed column sequence; the reindex step at the
//! end of this module is load-bearing and must match `salary_feature_columns`
//! exactly, zero-filling anything the request did not produce.

use std::collections::BTreeMap;

use crate::artifacts::model::{Encoders, FeatureValue};
use crate::artifacts::SkillVocab;
use crate::salary::types::SalaryPredictionRequest;

/// Categorical columns target-encoded when the encoder artifact does not
/// carry its own fitted column list.
const STANDARD_CATEGORICAL_COLS: [&str; 6] = [
    "title",
    "city",
    "state",
    "country",
    "work_type",
    "company_scale_tier_proxy",
];

/// Splits a free-text location into (city, state) on the first comma,
/// lower-cased.
pub fn parse_city_state(location: &str) -> (String, String) {
    let mut parts = location.splitn(2, ',');
    let city = parts.next().unwrap_or("").trim().to_lowercase();
    let state = parts.next().unwrap_or("").trim().to_lowercase();
    (city, state)
}

/// Filters claimed skills against the vocabulary, upper-cased. Unknown skills
/// are dropped silently; without the artifact everything passes upper-cased.
pub fn resolve_known_skills(skills: &[String], vocab: Option<&SkillVocab>) -> Vec<String> {
    match vocab {
        Some(vocab) => {
            let valid: std::collections::HashSet<String> =
                vocab.skill_abrs.iter().map(|s| s.to_uppercase()).collect();
            skills
                .iter()
                .map(|s| s.to_uppercase())
                .filter(|s| valid.contains(s))
                .collect()
        }
        None => skills.iter().map(|s| s.to_uppercase()).collect(),
    }
}

/// Builds the named feature map from the request and resolved tier signals.
pub fn build_features(
    req: &SalaryPredictionRequest,
    known_skills: &[String],
    company_tier: &str,
    company_posting_count: f64,
    vocab: Option<&SkillVocab>,
    top_industries: &[String],
) -> BTreeMap<String, FeatureValue> {
    let (city, state) = parse_city_state(&req.location);
    let exp_ord = super::tiers::experience_ordinal(&req.experience_level);

    let mut features = BTreeMap::new();
    features.insert("title".into(), FeatureValue::Text(req.title.to_lowercase()));
    features.insert("city".into(), FeatureValue::Text(city));
    features.insert("state".into(), FeatureValue::Text(state));
    features.insert(
        "country".into(),
        FeatureValue::Text(req.country.to_lowercase()),
    );
    features.insert(
        "experience_ordinal".into(),
        FeatureValue::Number(exp_ord as f64),
    );
    features.insert(
        "work_type".into(),
        FeatureValue::Text(req.work_type.to_lowercase()),
    );
    features.insert(
        "remote_allowed".into(),
        FeatureValue::Number(match req.remote_allowed {
            Some(true) => 1.0,
            Some(false) => 0.0,
            None => -1.0,
        }),
    );
    features.insert(
        "has_employee_count".into(),
        FeatureValue::Number(if req.employee_count.is_some() { 1.0 } else { 0.0 }),
    );
    features.insert(
        "log_employee_count".into(),
        FeatureValue::Number(match req.employee_count {
            Some(count) if count > 0 => (count as f64).ln_1p(),
            _ => 0.0,
        }),
    );
    features.insert(
        "has_company_posting_count".into(),
        FeatureValue::Number(if company_posting_count > 0.0 { 1.0 } else { 0.0 }),
    );
    features.insert(
        "company_posting_count".into(),
        FeatureValue::Number(company_posting_count),
    );
    features.insert(
        "log_company_posting_count".into(),
        FeatureValue::Number(if company_posting_count > 0.0 {
            company_posting_count.ln_1p()
        } else {
            0.0
        }),
    );
    features.insert(
        "company_scale_tier_proxy".into(),
        FeatureValue::Text(company_tier.to_string()),
    );

    // One binary indicator per vocabulary skill.
    let selected: std::collections::HashSet<&str> =
        known_skills.iter().map(String::as_str).collect();
    if let Some(vocab) = vocab {
        for abr in &vocab.skill_abrs {
            let abr = abr.to_uppercase();
            let value = if selected.contains(abr.as_str()) { 1.0 } else { 0.0 };
            features.insert(format!("skill_{abr}"), FeatureValue::Number(value));
        }
    }

    // One binary indicator per trained top industry; the rest are ignored.
    let requested: std::collections::HashSet<&str> =
        req.industries.iter().map(String::as_str).collect();
    for industry in top_industries {
        let value = if requested.contains(industry.as_str()) { 1.0 } else { 0.0 };
        features.insert(format!("ind_{industry}"), FeatureValue::Number(value));
    }

    features
}

/// Target-encodes categorical columns in place. Without an encoder the text
/// values pass through raw (degraded mode: the models score them as zero).
pub fn encode_categoricals(features: &mut BTreeMap<String, FeatureValue>, encoders: &Encoders) {
    let Some(encoder) = &encoders.target_encoder else {
        return;
    };

    let cols: Vec<String> = if !encoder.cols.is_empty() {
        encoder.cols.clone()
    } else {
        STANDARD_CATEGORICAL_COLS
            .iter()
            .map(|c| c.to_string())
            .collect()
    };

    for col in cols {
        if let Some(FeatureValue::Text(text)) = features.get(&col) {
            let encoded = encoder.encode(&col, text);
            features.insert(col, FeatureValue::Number(encoded));
        }
    }
}

/// Reindexes the feature map to the trained column order, zero-filling
/// columns the request did not produce.
pub fn reindex(
    features: &BTreeMap<String, FeatureValue>,
    feature_columns: &[String],
) -> Vec<FeatureValue> {
    feature_columns
        .iter()
        .map(|col| {
            features
                .get(col)
                .cloned()
                .unwrap_or(FeatureValue::Number(0.0))
        })
        .collect()
}
