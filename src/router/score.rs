//! §4.5.5: scoring.

use crate::config::{DifficultyThresholds, L3Config, ScoringWeights, TimeModel};
use crate::model::{Difficulty, RouteMetrics, RoutePattern};

/// A routed candidate before scoring: aggregate metrics plus the
/// bookkeeping scoring needs (backtracking/overlap percentages,
/// connectivity fraction).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub distance_km: f64,
    pub gain_m: f64,
    pub loss_m: f64,
    pub trail_count: usize,
    pub unique_trail_count: usize,
    pub connectivity_score: f64,
    pub backtracking_percent: f64,
    pub overlap_percent: f64,
}

/// §4.5.5's weighted-combination scorer. Returns `(metrics, score)`, with
/// `score` in `[0, 100]`.
pub fn score_candidate(candidate: &Candidate, pattern: &RoutePattern, config: &L3Config) -> (RouteMetrics, f64) {
    let weights = &config.scoring_weights;

    let delta_d_rel = (candidate.distance_km - pattern.target_distance_km).abs() / pattern.target_distance_km.max(1e-9);
    let delta_e_rel =
        (candidate.gain_m - pattern.target_elevation_gain_m).abs() / pattern.target_elevation_gain_m.max(1e-9);
    let similarity = (1.0 - (weights.distance * delta_d_rel + weights.elevation * delta_e_rel)).clamp(0.0, 1.0);

    let gain_rate = if candidate.distance_km > 0.0 { candidate.gain_m / candidate.distance_km } else { 0.0 };
    let difficulty = classify_difficulty(gain_rate, &config.difficulty_thresholds);
    let estimated_time_hours = estimated_time(candidate.distance_km, candidate.gain_m, &config.time_model);

    let penalty = (candidate.backtracking_percent / 100.0 + candidate.overlap_percent / 100.0) / 2.0;
    let diversity_bonus = if candidate.trail_count > 0 {
        candidate.unique_trail_count as f64 / candidate.trail_count as f64
    } else {
        0.0
    };

    let raw = weights.distance * similarity + weights.connectivity * candidate.connectivity_score
        - penalty
        + weights.diversity * diversity_bonus;
    let weight_sum = (weights.distance + weights.connectivity + weights.diversity).max(1e-9);
    let score = ((raw / weight_sum) * 100.0).clamp(0.0, 100.0);

    let metrics = RouteMetrics {
        distance_km: candidate.distance_km,
        gain_m: candidate.gain_m,
        loss_m: candidate.loss_m,
        trail_count: candidate.trail_count,
        unique_trail_count: candidate.unique_trail_count,
        gain_rate,
        estimated_time_hours,
        difficulty,
        connectivity_score: candidate.connectivity_score,
    };

    (metrics, score)
}

fn classify_difficulty(gain_rate: f64, thresholds: &DifficultyThresholds) -> Difficulty {
    if gain_rate <= thresholds.easy_max_gain_rate {
        Difficulty::Easy
    } else if gain_rate <= thresholds.moderate_max_gain_rate {
        Difficulty::Moderate
    } else if gain_rate <= thresholds.hard_max_gain_rate {
        Difficulty::Hard
    } else {
        Difficulty::Expert
    }
}

fn estimated_time(distance_km: f64, gain_m: f64, time_model: &TimeModel) -> f64 {
    distance_km / time_model.avg_speed_kmh.max(1e-9) + gain_m / time_model.climb_rate_m_per_hour.max(1e-9)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::Shape;

    fn pattern() -> RoutePattern {
        RoutePattern {
            name: "test".into(),
            target_distance_km: 6.0,
            target_elevation_gain_m: 300.0,
            shape: Shape::Loop,
            tolerance_percent: 10.0,
        }
    }

    #[test]
    fn exact_match_scores_highly() {
        let candidate = Candidate {
            distance_km: 6.0,
            gain_m: 300.0,
            loss_m: 300.0,
            trail_count: 3,
            unique_trail_count: 3,
            connectivity_score: 1.0,
            backtracking_percent: 0.0,
            overlap_percent: 0.0,
        };

        let (metrics, score) = score_candidate(&candidate, &pattern(), &L3Config::default());
        assert!(score >= 95.0);
        assert_eq!(metrics.trail_count, 3);
    }

    #[test]
    fn distant_match_scores_lower_than_exact() {
        let config = L3Config::default();
        let exact = Candidate {
            distance_km: 6.0,
            gain_m: 300.0,
            loss_m: 300.0,
            trail_count: 3,
            unique_trail_count: 3,
            connectivity_score: 1.0,
            backtracking_percent: 0.0,
            overlap_percent: 0.0,
        };
        let distant = Candidate { distance_km: 9.0, gain_m: 450.0, ..exact.clone() };

        let (_, exact_score) = score_candidate(&exact, &pattern(), &config);
        let (_, distant_score) = score_candidate(&distant, &pattern(), &config);
        assert!(distant_score < exact_score);
    }

    #[test]
    fn gain_rate_buckets_classify_difficulty() {
        let thresholds = DifficultyThresholds::default();
        assert_eq!(classify_difficulty(10.0, &thresholds), Difficulty::Easy);
        assert_eq!(classify_difficulty(200.0, &thresholds), Difficulty::Expert);
    }
}
