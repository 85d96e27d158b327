//! Premium blending: learned per-skill and per-tier salary deltas applied on
//! top of the raw quantile predictions, with a hard clamp on the total.

use crate::artifacts::PremiumTable;
use crate::salary::types::SalaryAdjustment;

/// Quantile triple after premium blending, plus the named adjustments that
/// contributed at least one currency unit before clamping.
pub struct BlendedQuantiles {
    pub median: f64,
    pub p10: f64,
    pub p90: f64,
    pub adjustments: Vec<SalaryAdjustment>,
}

/// Applies the premium table to the three quantiles.
///
/// Skill delta: mean of matched per-skill deltas (role-specific table first,
/// global fallback, else omitted) scaled by `skill_weight`. Tier delta:
/// role-specific else global tier entry scaled by `tier_weight`. Their sum is
/// clamped to ±min(max_absolute, max_ratio × |median|) and added uniformly to
/// all three quantiles so the band shifts without changing width.
pub fn apply_premiums(
    role_title: &str,
    selected_skills: &[String],
    company_tier: &str,
    median: f64,
    p10: f64,
    p90: f64,
    premiums: Option<&PremiumTable>,
) -> BlendedQuantiles {
    let Some(table) = premiums else {
        return BlendedQuantiles {
            median,
            p10,
            p90,
            adjustments: vec![],
        };
    };

    let role_key = role_title.to_lowercase();
    let empty = std::collections::HashMap::new();
    let role_skill_map = table.role_skill_deltas.get(&role_key).unwrap_or(&empty);

    let mut per_skill_deltas = Vec::new();
    for skill in selected_skills {
        let feature_key = format!("skill_{skill}");
        if let Some(delta) = role_skill_map.get(&feature_key) {
            per_skill_deltas.push(*delta);
        } else if let Some(delta) = table.global_skill_deltas.get(&feature_key) {
            per_skill_deltas.push(*delta);
        }
    }

    let skill_delta = if per_skill_deltas.is_empty() {
        0.0
    } else {
        per_skill_deltas.iter().sum::<f64>() / per_skill_deltas.len() as f64
    } * table.skill_weight;

    let tier_delta = table
        .role_tier_deltas
        .get(&role_key)
        .and_then(|m| m.get(company_tier))
        .or_else(|| table.global_tier_deltas.get(company_tier))
        .copied()
        .unwrap_or(0.0)
        * table.tier_weight;

    let total_delta = skill_delta + tier_delta;
    let max_allowed = table
        .max_absolute_adjustment
        .min(median.abs() * table.max_adjustment_ratio);
    let total_delta = total_delta.clamp(-max_allowed, max_allowed);

    let mut adjustments = Vec::new();
    if skill_delta.abs() >= 1.0 {
        adjustments.push(SalaryAdjustment {
            source: "skills".to_string(),
            delta: skill_delta.round() as i64,
        });
    }
    if tier_delta.abs() >= 1.0 {
        adjustments.push(SalaryAdjustment {
            source: "company_scale".to_string(),
            delta: tier_delta.round() as i64,
        });
    }

    BlendedQuantiles {
        median: median + total_delta,
        p10: p10 + total_delta,
        p90: p90 + total_delta,
        adjustments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn table() -> PremiumTable {
        serde_json::from_value(serde_json::json!({
            "role_skill_deltas": {
                "data scientist": {"skill_SQL": 4000.0}
            },
            "global_skill_deltas": {"skill_PY": 6000.0, "skill_SQL": 1000.0},
            "role_tier_deltas": {
                "data scientist": {"enterprise": 9000.0}
            },
            "global_tier_deltas": {"enterprise": 5000.0, "micro": -4000.0},
            "skill_weight": 1.0,
            "tier_weight": 1.0,
            "max_adjustment_ratio": 0.35,
            "max_absolute_adjustment": 60000.0
        }))
        .unwrap()
    }

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_table_is_identity() {
        let blended = apply_premiums("x", &[], "mid", 100.0, 90.0, 110.0, None);
        assert_eq!(blended.median, 100.0);
        assert!(blended.adjustments.is_empty());
    }

    #[test]
    fn test_role_table_wins_over_global() {
        // SQL: role map 4000 beats global 1000. PY: only global, 6000.
        let blended = apply_premiums(
            "Data Scientist",
            &skills(&["SQL", "PY"]),
            "mid",
            100_000.0,
            80_000.0,
            120_000.0,
            Some(&table()),
        );
        // mean(4000, 6000) = 5000, no tier delta for mid
        assert_eq!(blended.median, 105_000.0);
        assert_eq!(blended.p10, 85_000.0);
        assert_eq!(blended.p90, 125_000.0);
        assert_eq!(
            blended.adjustments,
            vec![SalaryAdjustment {
                source: "skills".to_string(),
                delta: 5000
            }]
        );
    }

    #[test]
    fn test_tier_delta_role_specific_first() {
        let blended = apply_premiums(
            "data scientist",
            &[],
            "enterprise",
            100_000.0,
            80_000.0,
            120_000.0,
            Some(&table()),
        );
        assert_eq!(blended.median, 109_000.0);
        assert_eq!(blended.adjustments[0].source, "company_scale");
        assert_eq!(blended.adjustments[0].delta, 9000);
    }

    #[test]
    fn test_tier_delta_global_fallback() {
        let blended = apply_premiums(
            "ml engineer",
            &[],
            "enterprise",
            100_000.0,
            80_000.0,
            120_000.0,
            Some(&table()),
        );
        assert_eq!(blended.median, 105_000.0);
    }

    #[test]
    fn test_clamp_by_ratio() {
        // 35% of 10_000 = 3_500 caps the 5_000 skill delta.
        let blended = apply_premiums(
            "data scientist",
            &skills(&["SQL", "PY"]),
            "mid",
            10_000.0,
            8_000.0,
            12_000.0,
            Some(&table()),
        );
        assert_eq!(blended.median, 13_500.0);
        // The adjustment entry reports the unclamped contribution.
        assert_eq!(blended.adjustments[0].delta, 5000);
    }

    #[test]
    fn test_clamp_by_absolute() {
        let mut t = table();
        t.global_skill_deltas = HashMap::from([("skill_PY".to_string(), 500_000.0)]);
        let blended = apply_premiums(
            "ml engineer",
            &skills(&["PY"]),
            "mid",
            1_000_000.0,
            900_000.0,
            1_100_000.0,
            Some(&t),
        );
        // ratio bound is 350_000, absolute bound 60_000 wins
        assert_eq!(blended.median, 1_060_000.0);
    }

    #[test]
    fn test_negative_delta_clamped_symmetrically() {
        let mut t = table();
        t.global_tier_deltas = HashMap::from([("micro".to_string(), -500_000.0)]);
        let blended = apply_premiums(
            "ml engineer",
            &[],
            "micro",
            100_000.0,
            80_000.0,
            120_000.0,
            Some(&t),
        );
        assert_eq!(blended.median, 65_000.0);
    }

    #[test]
    fn test_band_width_preserved() {
        let blended = apply_premiums(
            "data scientist",
            &skills(&["SQL"]),
            "enterprise",
            100_000.0,
            80_000.0,
            120_000.0,
            Some(&table()),
        );
        assert_eq!(blended.p90 - blended.p10, 40_000.0);
    }

    #[test]
    fn test_sub_unit_delta_records_no_adjustment() {
        let mut t = table();
        t.global_skill_deltas = HashMap::from([("skill_PY".to_string(), 0.4)]);
        t.role_skill_deltas.clear();
        t.global_tier_deltas.clear();
        t.role_tier_deltas.clear();
        let blended = apply_premiums(
            "ml engineer",
            &skills(&["PY"]),
            "mid",
            100_000.0,
            80_000.0,
            120_000.0,
            Some(&t),
        );
        assert!(blended.adjustments.is_empty());
        assert!((blended.median - 100_000.4).abs() < 1e-9);
    }

    #[test]
    fn test_weights_scale_deltas() {
        let mut t = table();
        t.skill_weight = 0.5;
        let blended = apply_premiums(
            "data scientist",
            &skills(&["SQL", "PY"]),
            "mid",
            100_000.0,
            80_000.0,
            120_000.0,
            Some(&t),
        );
        assert_eq!(blended.median, 102_500.0);
    }
}
