//! §6 configuration surface. Loading a config file is the CLI
//! collaborator's job (out of scope); this module only owns the typed
//! options and [`Config::validate`].

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::RoutePattern;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct L1Config {
    pub min_trail_length_m: f64,
    pub intersection_tolerance_m: f64,
    pub endpoint_epsilon: f64,
    pub min_gap_m: f64,
    pub max_gap_m: f64,
    pub overlap_threshold: f64,
    pub distance_threshold: f64,
    pub loop_min_segments: usize,
}

impl Default for L1Config {
    fn default() -> Self {
        Self {
            min_trail_length_m: 0.1,
            intersection_tolerance_m: 0.01,
            endpoint_epsilon: 0.001,
            min_gap_m: 0.5,
            max_gap_m: 10.0,
            overlap_threshold: 0.95,
            distance_threshold: 1.0,
            loop_min_segments: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct L2Config {
    pub node_tolerance_m: f64,
    pub edge_to_vertex_tolerance_m: f64,
    pub spatial_tolerance_m: f64,
    pub degree2_merge_tolerance_m: f64,
    pub edge_bridging_tolerance_m: f64,
    pub short_connector_max_length_m: f64,
    pub simplify_tolerance_deg: f64,
    pub simplify_min_points: usize,
}

impl Default for L2Config {
    fn default() -> Self {
        Self {
            node_tolerance_m: 0.5,
            edge_to_vertex_tolerance_m: 0.5,
            spatial_tolerance_m: 1.0,
            degree2_merge_tolerance_m: 0.5,
            edge_bridging_tolerance_m: 50.0,
            short_connector_max_length_m: 25.0,
            simplify_tolerance_deg: 0.00001,
            simplify_min_points: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub distance: f64,
    pub elevation: f64,
    pub connectivity: f64,
    pub diversity: f64,
}

impl Default for ScoringWeights {
    /// §9 Open Question: exact weights are configuration, not core. These
    /// defaults favor matching the requested distance/elevation over
    /// connectivity and diversity.
    fn default() -> Self {
        Self { distance: 0.5, elevation: 0.3, connectivity: 0.15, diversity: 0.05 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyThresholds {
    pub easy_max_gain_rate: f64,
    pub moderate_max_gain_rate: f64,
    pub hard_max_gain_rate: f64,
}

impl Default for DifficultyThresholds {
    fn default() -> Self {
        Self { easy_max_gain_rate: 40.0, moderate_max_gain_rate: 70.0, hard_max_gain_rate: 110.0 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeModel {
    pub avg_speed_kmh: f64,
    pub climb_rate_m_per_hour: f64,
}

impl Default for TimeModel {
    fn default() -> Self {
        Self { avg_speed_kmh: 4.0, climb_rate_m_per_hour: 400.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct L3Config {
    pub patterns: Vec<RoutePattern>,
    pub max_routes_per_pattern: usize,
    pub min_distance_between_routes_m: f64,
    pub max_loop_overlap_percent: f64,
    pub max_backtracking_percent: f64,
    pub min_trail_count: usize,
    pub max_subnetwork_size: usize,
    pub min_subnetwork_size: usize,
    pub tolerance_levels: Vec<f64>,
    pub scoring_weights: ScoringWeights,
    pub difficulty_thresholds: DifficultyThresholds,
    pub time_model: TimeModel,
}

impl Default for L3Config {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            max_routes_per_pattern: 10,
            min_distance_between_routes_m: 200.0,
            max_loop_overlap_percent: 30.0,
            max_backtracking_percent: 20.0,
            min_trail_count: 1,
            max_subnetwork_size: 5000,
            min_subnetwork_size: 2,
            tolerance_levels: vec![0.1, 0.2, 0.35],
            scoring_weights: ScoringWeights::default(),
            difficulty_thresholds: DifficultyThresholds::default(),
            time_model: TimeModel::default(),
        }
    }
}

/// Top-level configuration, grouped by pipeline layer per §6.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub force_3d: bool,
    /// §9 Open Question: when the elevation provider is unavailable, fail
    /// the stage (`true`) or proceed with 2D geometry and null elevation
    /// stats (`false`, the default).
    pub require_elevation: bool,
    pub l1: L1Config,
    pub l2: L2Config,
    pub l3: L3Config,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        if self.l1.min_gap_m > self.l1.max_gap_m {
            return Err(Error::ConfigInvalid("l1.min_gap_m must be <= l1.max_gap_m".into()));
        }
        if self.l1.min_trail_length_m <= 0.0 {
            return Err(Error::ConfigInvalid("l1.min_trail_length_m must be positive".into()));
        }
        if self.l1.loop_min_segments < 2 {
            return Err(Error::ConfigInvalid("l1.loop_min_segments must be >= 2".into()));
        }
        if self.l3.min_subnetwork_size > self.l3.max_subnetwork_size {
            return Err(Error::ConfigInvalid(
                "l3.min_subnetwork_size must be <= l3.max_subnetwork_size".into(),
            ));
        }
        if self.l3.tolerance_levels.is_empty() {
            return Err(Error::ConfigInvalid("l3.tolerance_levels must not be empty".into()));
        }
        let weights = &self.l3.scoring_weights;
        let sum = weights.distance + weights.elevation + weights.connectivity + weights.diversity;
        if sum <= 0.0 {
            return Err(Error::ConfigInvalid("l3.scoring_weights must sum to a positive value".into()));
        }
        Ok(())
    }
}
