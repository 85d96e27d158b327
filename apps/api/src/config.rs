use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every knob has a serving-safe default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared-secret service credential. `None` means the deployment is not
    /// configured and auth-required paths answer 503.
    pub ml_service_key: Option<String>,
    pub ml_service_auth_required: bool,
    pub ml_rate_limit_enabled: bool,
    pub ml_max_concurrent_infer: usize,
    pub ml_disable_heavy_inference: bool,
    pub ml_limit_predict_per_hour: usize,
    pub ml_limit_skill_gap_per_hour: usize,
    pub ml_limit_metadata_per_hour: usize,
    pub ml_limit_lookup_per_hour: usize,
    pub ml_limit_global_per_hour: usize,
    pub allowed_origins: String,
    pub model_dir: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            ml_service_key: std::env::var("ML_SERVICE_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            ml_service_auth_required: bool_env("ML_SERVICE_AUTH_REQUIRED", true)?,
            ml_rate_limit_enabled: bool_env("ML_RATE_LIMIT_ENABLED", true)?,
            ml_max_concurrent_infer: usize_env("ML_MAX_CONCURRENT_INFER", 2)?.max(1),
            ml_disable_heavy_inference: bool_env("ML_DISABLE_HEAVY_INFERENCE", false)?,
            ml_limit_predict_per_hour: usize_env("ML_LIMIT_PREDICT_PER_HOUR", 40)?,
            ml_limit_skill_gap_per_hour: usize_env("ML_LIMIT_SKILL_GAP_PER_HOUR", 40)?,
            ml_limit_metadata_per_hour: usize_env("ML_LIMIT_METADATA_PER_HOUR", 120)?,
            ml_limit_lookup_per_hour: usize_env("ML_LIMIT_LOOKUP_PER_HOUR", 120)?,
            ml_limit_global_per_hour: usize_env("ML_LIMIT_GLOBAL_PER_HOUR", 300)?,
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            model_dir: std::env::var("MODEL_DIR").unwrap_or_else(|_| "models".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Hourly limit for one endpoint class.
    pub fn endpoint_limit_for(&self, endpoint_class: &str) -> usize {
        match endpoint_class {
            "predict" => self.ml_limit_predict_per_hour,
            "skill_gap" => self.ml_limit_skill_gap_per_hour,
            "metadata" => self.ml_limit_metadata_per_hour,
            _ => self.ml_limit_lookup_per_hour,
        }
    }
}

fn bool_env(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(v) => match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => anyhow::bail!("{key} must be a boolean, got '{other}'"),
        },
        Err(_) => Ok(default),
    }
}

fn usize_env(key: &str, default: usize) -> Result<usize> {
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<usize>()
            .with_context(|| format!("{key} must be a non-negative integer")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Default for Config {
    /// Test fixture with the documented defaults and no credential.
    fn default() -> Self {
        Config {
            ml_service_key: None,
            ml_service_auth_required: true,
            ml_rate_limit_enabled: true,
            ml_max_concurrent_infer: 2,
            ml_disable_heavy_inference: false,
            ml_limit_predict_per_hour: 40,
            ml_limit_skill_gap_per_hour: 40,
            ml_limit_metadata_per_hour: 120,
            ml_limit_lookup_per_hour: 120,
            ml_limit_global_per_hour: 300,
            allowed_origins: "http://localhost:3000".to_string(),
            model_dir: "models".to_string(),
            port: 8000,
            rust_log: "info".to_string(),
        }
    }
}
