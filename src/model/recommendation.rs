use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Line3;
use crate::model::edge::EdgeId;
use crate::model::tags::Difficulty;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    pub distance_km: f64,
    pub gain_m: f64,
    pub loss_m: f64,
    pub trail_count: usize,
    pub unique_trail_count: usize,
    pub gain_rate: f64,
    pub estimated_time_hours: f64,
    pub difficulty: Difficulty,
    pub connectivity_score: f64,
}

/// §3 RouteRecommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRecommendation {
    pub uuid: Uuid,
    pub pattern_name: String,
    pub edges: Vec<EdgeId>,
    pub metrics: RouteMetrics,
    pub score: f64,
    pub similarity: f64,
    pub geometry: Line3,
    pub fingerprint: u64,
}

impl RouteRecommendation {
    /// §4.5.6: `hash(pattern_id, sorted(edge_ids))`.
    pub fn compute_fingerprint(pattern_name: &str, edges: &[EdgeId]) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut sorted: Vec<u32> = edges.iter().map(|e| e.0).collect();
        sorted.sort_unstable();

        let mut hasher = rustc_hash::FxHasher::default();
        pattern_name.hash(&mut hasher);
        sorted.hash(&mut hasher);
        hasher.finish()
    }
}
