//! Cluster membership listing and cosine-similarity adjacency ranking.
//!
//! The role index, label vector, 2-D projection, and feature matrix are
//! position-aligned; row i of each describes the same role.

use serde::Serialize;

use crate::artifacts::ClusterRoleEntry;
use crate::slug::slugify;

const MAX_ADJACENT: usize = 10;

#[derive(Debug, Serialize)]
pub struct ClusterPoint {
    pub role: String,
    pub cluster_id: i64,
    pub x: f64,
    pub y: f64,
    pub posting_count: u64,
}

#[derive(Debug, Serialize)]
pub struct ClustersResponse {
    pub clusters: Vec<ClusterPoint>,
    pub cluster_count: usize,
}

#[derive(Debug, Serialize)]
pub struct AdjacentRole {
    pub role: String,
    pub similarity: f64,
    pub cluster_id: i64,
}

#[derive(Debug, Serialize)]
pub struct AdjacentRolesResponse {
    pub query_role: String,
    pub cluster_id: i64,
    pub adjacent_roles: Vec<AdjacentRole>,
}

/// Every indexed role with its cluster label and projection coordinates.
pub fn get_clusters(
    labels: &[i64],
    projection: &[[f64; 2]],
    role_index: &[ClusterRoleEntry],
) -> ClustersResponse {
    let clusters: Vec<ClusterPoint> = role_index
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let label = labels.get(i)?;
            let coords = projection.get(i)?;
            Some(ClusterPoint {
                role: entry.role.clone(),
                cluster_id: *label,
                x: round4(coords[0]),
                y: round4(coords[1]),
                posting_count: entry.posting_count,
            })
        })
        .collect();

    let cluster_count = {
        let mut distinct: Vec<i64> = labels.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        distinct.len()
    };

    ClustersResponse {
        clusters,
        cluster_count,
    }
}

/// The 10 most similar roles to the slug-resolved target, by cosine
/// similarity over the feature matrix. `None` when the slug matches no role.
pub fn get_adjacent_roles(
    slug: &str,
    labels: &[i64],
    role_index: &[ClusterRoleEntry],
    feature_matrix: &[Vec<f64>],
) -> Option<AdjacentRolesResponse> {
    let target_idx = role_index
        .iter()
        .position(|entry| slugify(&entry.role) == slug)?;
    let target_row = feature_matrix.get(target_idx)?;

    let mut scored: Vec<(usize, f64)> = feature_matrix
        .iter()
        .enumerate()
        .map(|(i, row)| (i, cosine_similarity(target_row, row)))
        .collect();
    // Stable sort keeps original index order for equal similarities.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let adjacent_roles: Vec<AdjacentRole> = scored
        .into_iter()
        .filter(|(i, _)| *i != target_idx)
        .take(MAX_ADJACENT)
        .filter_map(|(i, similarity)| {
            let entry = role_index.get(i)?;
            Some(AdjacentRole {
                role: entry.role.clone(),
                similarity: round4(similarity),
                cluster_id: labels.get(i).copied().unwrap_or(-1),
            })
        })
        .collect();

    Some(AdjacentRolesResponse {
        query_role: role_index[target_idx].role.clone(),
        cluster_id: labels.get(target_idx).copied().unwrap_or(-1),
        adjacent_roles,
    })
}

/// Cosine similarity; zero-norm vectors score 0 against everything.
fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
