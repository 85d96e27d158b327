use serde::{Deserialize, Serialize};

use crate::artifacts::{ScaleTierLabel, SkillVocabEntry, TitleEntry};

#[derive(Debug, Clone, Deserialize)]
pub struct SalaryPredictionRequest {
    /// Job title, canonical or variant.
    pub title: String,
    /// Free-text location, e.g. "San Francisco, CA".
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_country")]
    pub country: String,
    /// Entry, Associate, Mid-Senior, Director, Executive.
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub work_type: String,
    #[serde(default)]
    pub remote_allowed: Option<bool>,
    /// Skill abbreviations; unknown ones are dropped against the vocabulary.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Industry identifiers; only the trained top-N contribute features.
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub employee_count: Option<i64>,
    /// Explicit scale tier (micro, small, mid, large, enterprise).
    #[serde(default)]
    pub company_scale_tier: Option<String>,
}

fn default_country() -> String {
    "us".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct SalaryFactor {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SalaryAdjustment {
    pub source: String,
    pub delta: i64,
}

#[derive(Debug, Serialize)]
pub struct SalaryPredictionResponse {
    pub predicted_salary: i64,
    pub lower_bound: i64,
    pub upper_bound: i64,
    /// Model confidence in [0.1, 1.0].
    pub confidence: f64,
    pub factors: Vec<SalaryFactor>,
    pub adjustments: Vec<SalaryAdjustment>,
}

#[derive(Debug, Serialize)]
pub struct SalaryMetadataResponse {
    pub skills: Vec<SkillVocabEntry>,
    pub titles: Vec<TitleEntry>,
    pub company_scale_tiers: Vec<ScaleTierLabel>,
}
