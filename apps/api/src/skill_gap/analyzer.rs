//! Skill-gap analysis against a precomputed term-importance matrix.

use serde::{Deserialize, Serialize};

use crate::slug::slugify;

/// How many of the role's highest-importance terms are considered.
const TOP_TERMS: usize = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct SkillGapRequest {
    pub current_skills: Vec<String>,
    /// Target role name or slug.
    pub target_role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillDetail {
    pub skill: String,
    /// Importance normalized by the role's top term, in [0, 1].
    pub importance: f64,
    /// `matched`, `gap`, or `bonus`.
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct SkillGapResponse {
    pub canonical_role: String,
    pub match_percentage: f64,
    pub skills: Vec<SkillDetail>,
    /// Gap terms ordered by descending importance.
    pub learning_priority: Vec<String>,
}

/// Resolves a role by case-insensitive exact name or slug equivalence.
pub fn find_role<'a>(target: &str, role_index: &'a [String]) -> Option<&'a str> {
    let target_lower = target.trim().to_lowercase();
    let target_slug = slugify(target);
    role_index
        .iter()
        .find(|role| role.to_lowercase() == target_lower || slugify(role) == target_slug)
        .map(String::as_str)
}

/// Case-insensitive equality or substring containment in either direction.
fn fuzzy_match(user_skill: &str, term: &str) -> bool {
    let user = user_skill.trim().to_lowercase();
    let term = term.trim().to_lowercase();
    user == term || term.contains(&user) || user.contains(&term)
}

/// Analyzes the gap between the user's declared skills and the target role's
/// top terms.
///
/// An unresolved target falls back to the first indexed role; the response's
/// `canonical_role` names what was actually analyzed, so callers can detect
/// the substitution. An explicit not-found would also be defensible, but the
/// fallback matches the behavior clients already rely on.
pub fn analyze_skill_gap(
    req: &SkillGapRequest,
    terms: &[String],
    matrix: &[Vec<f64>],
    role_index: &[String],
) -> SkillGapResponse {
    let role_name = find_role(&req.target_role, role_index)
        .or_else(|| role_index.first().map(String::as_str))
        .unwrap_or("Unknown")
        .to_string();

    let role_idx = role_index
        .iter()
        .position(|r| *r == role_name)
        .unwrap_or(0);
    let row: &[f64] = matrix.get(role_idx).map(Vec::as_slice).unwrap_or(&[]);

    // Highest-scoring nonzero terms, ties broken by ascending index.
    let mut indexed: Vec<(usize, f64)> = row
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| *score > 0.0)
        .collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    indexed.truncate(TOP_TERMS);

    let top_terms: Vec<(&str, f64)> = indexed
        .iter()
        .filter_map(|(i, score)| terms.get(*i).map(|t| (t.as_str(), *score)))
        .collect();

    if top_terms.is_empty() {
        return SkillGapResponse {
            canonical_role: role_name,
            match_percentage: 0.0,
            skills: vec![],
            learning_priority: vec![],
        };
    }

    let max_score = top_terms[0].1;

    let mut skills = Vec::with_capacity(top_terms.len());
    let mut matched_count = 0usize;
    let mut gap_terms: Vec<(String, f64)> = Vec::new();

    for (term, score) in &top_terms {
        let importance = round3(score / max_score);
        let is_matched = req.current_skills.iter().any(|us| fuzzy_match(us, term));
        let status = if is_matched {
            matched_count += 1;
            "matched"
        } else {
            gap_terms.push((term.to_string(), importance));
            "gap"
        };
        skills.push(SkillDetail {
            skill: term.to_string(),
            importance,
            status: status.to_string(),
        });
    }

    // Skills the user holds that the role does not emphasize.
    for user_skill in &req.current_skills {
        let already_listed = skills.iter().any(|s| fuzzy_match(user_skill, &s.skill));
        if !already_listed {
            skills.push(SkillDetail {
                skill: user_skill.clone(),
                importance: 0.0,
                status: "bonus".to_string(),
            });
        }
    }

    let match_percentage = round1(matched_count as f64 / top_terms.len() as f64 * 100.0);

    gap_terms.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let learning_priority = gap_terms.into_iter().map(|(term, _)| term).collect();

    SkillGapResponse {
        canonical_role: role_name,
        match_percentage,
        skills,
        learning_priority,
    }
}

/// Role names available for analysis, sorted.
pub fn available_roles(role_index: &[String]) -> Vec<String> {
    let mut roles = role_index.to_vec();
    roles.sort();
    roles
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
