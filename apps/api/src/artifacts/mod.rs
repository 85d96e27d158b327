//! Read-only model artifact registry.
//!
//! Loaded once at startup from the configured directory and shared behind an
//! `Arc` in `AppState`. Every artifact is optional on disk; handlers check
//! for the ones they need and answer 503 when they are missing. Nothing here
//! is mutated during serving.

pub mod model;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use model::{Encoders, LinearScoreModel, ScoreModel};

/// One role row of the cluster index, position-aligned with the label vector,
/// the 2-D projection, and the feature matrix.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterRoleEntry {
    pub role: String,
    #[serde(default)]
    pub posting_count: u64,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct SkillVocabEntry {
    pub abr: String,
    pub name: String,
    pub freq: u64,
}

/// The `salary_skill_vocab` artifact: canonical abbreviations used as model
/// feature keys plus display entries for the metadata endpoint.
#[derive(Debug, Deserialize)]
pub struct SkillVocab {
    #[serde(default)]
    pub skill_abrs: Vec<String>,
    #[serde(default)]
    pub skills: Vec<SkillVocabEntry>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct ScaleTierLabel {
    pub value: String,
    pub label: String,
}

/// The `salary_company_scale_meta` artifact: tier boundaries and the
/// representative posting-count medians computed at training time.
#[derive(Debug, Deserialize)]
pub struct CompanyScaleMeta {
    pub boundaries: Vec<i64>,
    pub tier_order: Vec<String>,
    pub representative_counts: std::collections::HashMap<String, f64>,
    #[serde(default)]
    pub tiers: Vec<ScaleTierLabel>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct TitleEntry {
    pub title: String,
    pub count: u64,
}

/// The `salary_premiums` artifact: learned per-skill and per-tier salary
/// deltas with blending weights and clamp bounds.
#[derive(Debug, Deserialize)]
pub struct PremiumTable {
    #[serde(default)]
    pub role_skill_deltas: std::collections::HashMap<String, std::collections::HashMap<String, f64>>,
    #[serde(default)]
    pub global_skill_deltas: std::collections::HashMap<String, f64>,
    #[serde(default)]
    pub role_tier_deltas: std::collections::HashMap<String, std::collections::HashMap<String, f64>>,
    #[serde(default)]
    pub global_tier_deltas: std::collections::HashMap<String, f64>,
    #[serde(default = "default_weight")]
    pub skill_weight: f64,
    #[serde(default = "default_weight")]
    pub tier_weight: f64,
    #[serde(default = "default_max_ratio")]
    pub max_adjustment_ratio: f64,
    #[serde(default = "default_max_absolute")]
    pub max_absolute_adjustment: f64,
}

fn default_weight() -> f64 {
    1.0
}

fn default_max_ratio() -> f64 {
    0.35
}

fn default_max_absolute() -> f64 {
    60_000.0
}

/// All artifacts known to the serving layer. Absent files stay `None`.
#[derive(Default)]
pub struct ArtifactRegistry {
    pub salary_median: Option<Box<dyn ScoreModel>>,
    pub salary_p10: Option<Box<dyn ScoreModel>>,
    pub salary_p90: Option<Box<dyn ScoreModel>>,
    pub salary_encoders: Option<Encoders>,
    pub salary_feature_columns: Option<Vec<String>>,
    pub salary_skill_vocab: Option<SkillVocab>,
    pub salary_company_scale_meta: Option<CompanyScaleMeta>,
    pub salary_titles: Option<Vec<TitleEntry>>,
    pub salary_premiums: Option<PremiumTable>,
    pub tfidf_terms: Option<Vec<String>>,
    pub tfidf_matrix: Option<Vec<Vec<f64>>>,
    pub tfidf_role_index: Option<Vec<String>>,
    pub cluster_labels: Option<Vec<i64>>,
    pub cluster_tsne: Option<Vec<[f64; 2]>>,
    pub cluster_role_index: Option<Vec<ClusterRoleEntry>>,
    pub cluster_feature_matrix: Option<Vec<Vec<f64>>>,
    /// Directory the artifacts were actually loaded from.
    pub resolved_dir: PathBuf,
}

impl ArtifactRegistry {
    /// Loads every artifact file that exists under `model_dir`. Relative
    /// paths resolve against the working directory. A present-but-unreadable
    /// file is a startup error; a missing file is not.
    pub fn load(model_dir: &str) -> Result<Self> {
        let base = resolve_model_dir(model_dir);

        let mut registry = ArtifactRegistry {
            resolved_dir: base.clone(),
            ..Default::default()
        };

        registry.salary_median = load_model(&base, "salary_median")?;
        registry.salary_p10 = load_model(&base, "salary_p10")?;
        registry.salary_p90 = load_model(&base, "salary_p90")?;

        registry.salary_encoders = load_json(&base, "salary_encoders")?;
        registry.salary_feature_columns = load_json(&base, "salary_feature_columns")?;
        registry.salary_skill_vocab = load_json(&base, "salary_skill_vocab")?;
        registry.salary_company_scale_meta = load_json(&base, "salary_company_scale_meta")?;
        registry.salary_titles = load_json(&base, "salary_titles")?;
        registry.salary_premiums = load_json(&base, "salary_premiums")?;
        registry.tfidf_terms = load_json(&base, "tfidf_terms")?;
        registry.tfidf_matrix = load_json(&base, "tfidf_matrix")?;
        registry.tfidf_role_index = load_json(&base, "tfidf_role_index")?;
        registry.cluster_labels = load_json(&base, "cluster_labels")?;
        registry.cluster_tsne = load_json(&base, "cluster_tsne")?;
        registry.cluster_role_index = load_json(&base, "cluster_role_index")?;
        registry.cluster_feature_matrix = load_json(&base, "cluster_feature_matrix")?;

        info!(
            "Loaded artifacts from {}: [{}]",
            registry.resolved_dir.display(),
            registry.loaded_names().join(", ")
        );

        Ok(registry)
    }

    /// Names of the artifacts present, for the health endpoint.
    pub fn loaded_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut push = |present: bool, name: &'static str| {
            if present {
                names.push(name);
            }
        };
        push(self.salary_median.is_some(), "salary_median");
        push(self.salary_p10.is_some(), "salary_p10");
        push(self.salary_p90.is_some(), "salary_p90");
        push(self.salary_encoders.is_some(), "salary_encoders");
        push(self.salary_feature_columns.is_some(), "salary_feature_columns");
        push(self.salary_skill_vocab.is_some(), "salary_skill_vocab");
        push(
            self.salary_company_scale_meta.is_some(),
            "salary_company_scale_meta",
        );
        push(self.salary_titles.is_some(), "salary_titles");
        push(self.salary_premiums.is_some(), "salary_premiums");
        push(self.tfidf_terms.is_some(), "tfidf_terms");
        push(self.tfidf_matrix.is_some(), "tfidf_matrix");
        push(self.tfidf_role_index.is_some(), "tfidf_role_index");
        push(self.cluster_labels.is_some(), "cluster_labels");
        push(self.cluster_tsne.is_some(), "cluster_tsne");
        push(self.cluster_role_index.is_some(), "cluster_role_index");
        push(
            self.cluster_feature_matrix.is_some(),
            "cluster_feature_matrix",
        );
        names
    }
}

fn resolve_model_dir(model_dir: &str) -> PathBuf {
    let path = PathBuf::from(model_dir);
    if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&path))
            .unwrap_or(path)
    }
}

fn load_json<T: DeserializeOwned>(base: &Path, name: &str) -> Result<Option<T>> {
    let path = base.join(format!("{name}.json"));
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read artifact {}", path.display()))?;
    let value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse artifact {}", path.display()))?;
    Ok(Some(value))
}

fn load_model(base: &Path, name: &str) -> Result<Option<Box<dyn ScoreModel>>> {
    let model: Option<LinearScoreModel> = load_json(base, name)?;
    Ok(model.map(|m| Box::new(m) as Box<dyn ScoreModel>))
}
