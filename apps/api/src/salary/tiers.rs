//! Experience-level ordinals and company scale-tier resolution.

use crate::artifacts::{CompanyScaleMeta, ScaleTierLabel};
use crate::salary::types::SalaryPredictionRequest;

pub const DEFAULT_BOUNDARIES: [i64; 4] = [25, 100, 500, 2000];
pub const DEFAULT_TIER_ORDER: [&str; 5] = ["micro", "small", "mid", "large", "enterprise"];

/// Maps an experience-level label to its fixed ordinal. Unrecognized and
/// empty labels map to -1, which the models were trained to treat as unknown.
pub fn experience_ordinal(label: &str) -> i64 {
    match label.trim().to_lowercase().as_str() {
        "internship" => 0,
        "entry level" | "entry" => 1,
        "associate" => 2,
        "mid-senior level" | "mid-senior" => 3,
        "director" => 4,
        "executive" => 5,
        _ => -1,
    }
}

fn default_representative_count(tier: &str) -> f64 {
    match tier {
        "micro" => 15.0,
        "small" => 65.0,
        "mid" => 280.0,
        "large" => 1200.0,
        "enterprise" => 3000.0,
        _ => 0.0,
    }
}

/// Tier from an employee/posting count against the four boundary thresholds.
/// Non-positive counts resolve to mid, the distribution's center of mass.
pub fn tier_from_count(value: f64, boundaries: &[i64]) -> &'static str {
    if value <= 0.0 {
        return "mid";
    }
    let b: Vec<f64> = if boundaries.len() == 4 {
        boundaries.iter().map(|&x| x as f64).collect()
    } else {
        DEFAULT_BOUNDARIES.iter().map(|&x| x as f64).collect()
    };

    if value <= b[0] {
        "micro"
    } else if value <= b[1] {
        "small"
    } else if value <= b[2] {
        "mid"
    } else if value <= b[3] {
        "large"
    } else {
        "enterprise"
    }
}

/// Resolves the company scale tier and its representative posting count.
///
/// Precedence: explicit valid tier on the request, else derivation from the
/// employee count, else mid. The representative count is the per-tier median
/// computed at training time (or a built-in default without the artifact).
pub fn resolve_company_scale_tier(
    req: &SalaryPredictionRequest,
    meta: Option<&CompanyScaleMeta>,
) -> (String, f64) {
    let tier_order: Vec<String> = meta
        .map(|m| m.tier_order.clone())
        .unwrap_or_else(|| DEFAULT_TIER_ORDER.iter().map(|s| s.to_string()).collect());
    let boundaries: Vec<i64> = meta
        .map(|m| m.boundaries.clone())
        .unwrap_or_else(|| DEFAULT_BOUNDARIES.to_vec());

    let representative = |tier: &str| -> f64 {
        meta.and_then(|m| m.representative_counts.get(tier).copied())
            .unwrap_or_else(|| default_representative_count(tier))
            .max(0.0)
    };

    if let Some(tier) = &req.company_scale_tier {
        if tier_order.iter().any(|t| t == tier) {
            return (tier.clone(), representative(tier));
        }
    }

    if let Some(count) = req.employee_count {
        if count > 0 {
            let tier = tier_from_count(count as f64, &boundaries);
            return (tier.to_string(), representative(tier));
        }
    }

    ("mid".to_string(), representative("mid"))
}

/// Display tiers for the metadata endpoint when the artifact carries none.
pub fn default_tier_labels() -> Vec<ScaleTierLabel> {
    [
        ("micro", "Micro (1-25 postings)"),
        ("small", "Small (26-100 postings)"),
        ("mid", "Mid (101-500 postings)"),
        ("large", "Large (501-2000 postings)"),
        ("enterprise", "Enterprise (2000+ postings)"),
    ]
    .iter()
    .map(|(value, label)| ScaleTierLabel {
        value: value.to_string(),
        label: label.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(employee_count: Option<i64>, tier: Option<&str>) -> SalaryPredictionRequest {
        SalaryPredictionRequest {
            title: "data scientist".to_string(),
            location: String::new(),
            country: "us".to_string(),
            experience_level: String::new(),
            work_type: String::new(),
            remote_allowed: None,
            skills: vec![],
            industries: vec![],
            employee_count,
            company_scale_tier: tier.map(str::to_string),
        }
    }

    #[test]
    fn test_experience_ordinal_table() {
        assert_eq!(experience_ordinal(""), -1);
        assert_eq!(experience_ordinal("Internship"), 0);
        assert_eq!(experience_ordinal("entry level"), 1);
        assert_eq!(experience_ordinal("entry"), 1);
        assert_eq!(experience_ordinal("Associate"), 2);
        assert_eq!(experience_ordinal("Mid-Senior Level"), 3);
        assert_eq!(experience_ordinal("mid-senior"), 3);
        assert_eq!(experience_ordinal("director"), 4);
        assert_eq!(experience_ordinal("EXECUTIVE"), 5);
        assert_eq!(experience_ordinal("wizard"), -1);
    }

    #[test]
    fn test_tier_boundaries_inclusive() {
        let b = DEFAULT_BOUNDARIES;
        assert_eq!(tier_from_count(25.0, &b), "micro");
        assert_eq!(tier_from_count(26.0, &b), "small");
        assert_eq!(tier_from_count(100.0, &b), "small");
        assert_eq!(tier_from_count(500.0, &b), "mid");
        assert_eq!(tier_from_count(800.0, &b), "large");
        assert_eq!(tier_from_count(2000.0, &b), "large");
        assert_eq!(tier_from_count(2001.0, &b), "enterprise");
    }

    #[test]
    fn test_nonpositive_count_resolves_mid() {
        assert_eq!(tier_from_count(0.0, &DEFAULT_BOUNDARIES), "mid");
        assert_eq!(tier_from_count(-5.0, &DEFAULT_BOUNDARIES), "mid");
    }

    #[test]
    fn test_tier_resolution_is_monotonic() {
        let order = ["micro", "small", "mid", "large", "enterprise"];
        let rank = |t: &str| order.iter().position(|&o| o == t).unwrap();
        let mut prev = 0;
        for count in 1..3000 {
            let tier = tier_from_count(count as f64, &DEFAULT_BOUNDARIES);
            let r = rank(tier);
            assert!(r >= prev, "tier shrank at count {count}");
            prev = r;
        }
    }

    #[test]
    fn test_explicit_tier_wins_over_count() {
        let (tier, count) = resolve_company_scale_tier(&request(Some(5), Some("enterprise")), None);
        assert_eq!(tier, "enterprise");
        assert_eq!(count, 3000.0);
    }

    #[test]
    fn test_invalid_explicit_tier_falls_back_to_count() {
        let (tier, _) = resolve_company_scale_tier(&request(Some(5), Some("galactic")), None);
        assert_eq!(tier, "micro");
    }

    #[test]
    fn test_no_signal_defaults_to_mid() {
        let (tier, count) = resolve_company_scale_tier(&request(None, None), None);
        assert_eq!(tier, "mid");
        assert_eq!(count, 280.0);
    }

    #[test]
    fn test_800_employees_resolves_large() {
        // 800 falls in (500, 2000] under default boundaries.
        let (tier, _) = resolve_company_scale_tier(&request(Some(800), None), None);
        assert_eq!(tier, "large");
    }
}
