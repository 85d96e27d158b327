//! Opaque model interfaces.
//!
//! The quantile predictors are pre-trained artifacts produced offline; the
//! serving core only sees the `ScoreModel` capability. The shipped
//! implementation is a deserialized linear scorer, but nothing outside this
//! module may depend on that.

use serde::Deserialize;
use std::collections::HashMap;

/// A single cell of a feature row. Categorical columns stay `Text` until the
/// target encoder maps them to numbers; a model fed raw text scores it as 0
/// (the documented degraded mode when no encoder artifact is present).
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Text(String),
    Number(f64),
}

impl FeatureValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            FeatureValue::Number(n) => *n,
            FeatureValue::Text(_) => 0.0,
        }
    }
}

/// Capability interface for one opaque quantile predictor.
pub trait ScoreModel: Send + Sync {
    /// Scores one feature row. The row must be aligned to `feature_names()`.
    fn predict(&self, row: &[FeatureValue]) -> f64;

    /// Trained feature-column names, in model order.
    fn feature_names(&self) -> &[String];

    /// Per-feature gain importance, aligned with `feature_names()`.
    fn gain_importances(&self) -> &[f64];
}

/// Serialized linear scorer: `intercept + Σ weight_i × value_i`.
#[derive(Debug, Deserialize)]
pub struct LinearScoreModel {
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
    pub importances: Vec<f64>,
}

impl ScoreModel for LinearScoreModel {
    fn predict(&self, row: &[FeatureValue]) -> f64 {
        let terms: f64 = self
            .weights
            .iter()
            .zip(row.iter())
            .map(|(w, v)| w * v.as_f64())
            .sum();
        self.intercept + terms
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn gain_importances(&self) -> &[f64] {
        &self.importances
    }
}

/// Target encoder artifact: per-column mappings from categorical value to a
/// learned numeric encoding, with a shared default for unseen values.
#[derive(Debug, Deserialize)]
pub struct TargetEncoder {
    /// Columns this encoder was fitted on. May be empty in older artifacts,
    /// in which case the pipeline falls back to its standard categorical set.
    #[serde(default)]
    pub cols: Vec<String>,
    pub mappings: HashMap<String, HashMap<String, f64>>,
    #[serde(default)]
    pub default: f64,
}

impl TargetEncoder {
    /// Encodes one categorical value for one column. Unknown columns and
    /// unseen values encode to the default.
    pub fn encode(&self, column: &str, value: &str) -> f64 {
        self.mappings
            .get(column)
            .and_then(|m| m.get(value))
            .copied()
            .unwrap_or(self.default)
    }
}

/// The `salary_encoders` artifact: optional target encoder plus the trained
/// top-N industry identifiers.
#[derive(Debug, Deserialize)]
pub struct Encoders {
    #[serde(default)]
    pub target_encoder: Option<TargetEncoder>,
    #[serde(default)]
    pub top_industries: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LinearScoreModel {
        LinearScoreModel {
            feature_names: vec!["a".to_string(), "b".to_string()],
            weights: vec![2.0, 3.0],
            intercept: 10.0,
            importances: vec![5.0, 1.0],
        }
    }

    #[test]
    fn test_linear_predict() {
        let row = vec![FeatureValue::Number(1.0), FeatureValue::Number(2.0)];
        assert_eq!(model().predict(&row), 10.0 + 2.0 + 6.0);
    }

    #[test]
    fn test_text_scores_as_zero() {
        let row = vec![
            FeatureValue::Text("data scientist".to_string()),
            FeatureValue::Number(2.0),
        ];
        assert_eq!(model().predict(&row), 10.0 + 6.0);
    }

    #[test]
    fn test_encoder_unseen_value_uses_default() {
        let mut mappings = HashMap::new();
        mappings.insert(
            "title".to_string(),
            HashMap::from([("data scientist".to_string(), 120_000.0)]),
        );
        let enc = TargetEncoder {
            cols: vec!["title".to_string()],
            mappings,
            default: 90_000.0,
        };
        assert_eq!(enc.encode("title", "data scientist"), 120_000.0);
        assert_eq!(enc.encode("title", "underwater basket weaver"), 90_000.0);
        assert_eq!(enc.encode("no_such_column", "x"), 90_000.0);
    }

    #[test]
    fn test_model_deserializes_from_artifact_json() {
        let raw = r#"{
            "feature_names": ["experience_ordinal", "title"],
            "weights": [4000.0, 1.0],
            "intercept": 52000.0,
            "importances": [12.5, 80.0]
        }"#;
        let model: LinearScoreModel = serde_json::from_str(raw).unwrap();
        assert_eq!(model.feature_names.len(), 2);
        assert_eq!(model.intercept, 52000.0);
    }
}
