//! §4.5.6: deduplication across patterns.

use std::collections::HashMap;

use itertools::Itertools;

use crate::model::RouteRecommendation;

/// Drops recommendations whose `(pattern, sorted edge set)` fingerprint
/// collides with one already kept, retaining the higher-scoring
/// candidate. Caps the remaining set at `max_routes_per_pattern × n_patterns`,
/// then sorts by `(pattern_name, score desc, uuid asc)` for determinism (§5/§8).
pub fn dedup_and_cap(
    recommendations: Vec<RouteRecommendation>,
    max_routes_per_pattern: usize,
    pattern_count: usize,
) -> Vec<RouteRecommendation> {
    let mut by_fingerprint: HashMap<(String, u64), RouteRecommendation> = HashMap::new();

    for candidate in recommendations {
        let key = (candidate.pattern_name.clone(), candidate.fingerprint);
        match by_fingerprint.get(&key) {
            Some(existing) if existing.score >= candidate.score => continue,
            _ => {
                by_fingerprint.insert(key, candidate);
            }
        }
    }

    let mut survivors: Vec<RouteRecommendation> = by_fingerprint
        .into_values()
        .sorted_by(|a, b| {
            a.pattern_name
                .cmp(&b.pattern_name)
                .then(b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal))
                .then(a.uuid.cmp(&b.uuid))
        })
        .collect();

    let cap = max_routes_per_pattern.saturating_mul(pattern_count.max(1));
    survivors.truncate(cap);
    survivors
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::{Coord3, Line3};
    use crate::model::{Difficulty, RouteMetrics};
    use uuid::Uuid;

    fn recommendation(pattern: &str, fingerprint: u64, score: f64) -> RouteRecommendation {
        RouteRecommendation {
            uuid: Uuid::new_v4(),
            pattern_name: pattern.into(),
            edges: Vec::new(),
            metrics: RouteMetrics {
                distance_km: 1.0,
                gain_m: 0.0,
                loss_m: 0.0,
                trail_count: 1,
                unique_trail_count: 1,
                gain_rate: 0.0,
                estimated_time_hours: 0.25,
                difficulty: Difficulty::Easy,
                connectivity_score: 1.0,
            },
            score,
            similarity: 1.0,
            geometry: Line3::new(vec![Coord3::new(0.0, 0.0, Some(0.0)), Coord3::new(0.01, 0.0, Some(0.0))]),
            fingerprint,
        }
    }

    #[test]
    fn colliding_fingerprint_keeps_the_higher_score() {
        let a = recommendation("loop", 42, 70.0);
        let b = recommendation("loop", 42, 90.0);

        let survivors = dedup_and_cap(vec![a, b], 10, 1);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].score, 90.0);
    }

    #[test]
    fn distinct_fingerprints_both_survive_and_sort_by_score_desc() {
        let a = recommendation("loop", 1, 50.0);
        let b = recommendation("loop", 2, 80.0);

        let survivors = dedup_and_cap(vec![a, b], 10, 1);
        assert_eq!(survivors.len(), 2);
        assert_eq!(survivors[0].score, 80.0);
    }

    #[test]
    fn cap_limits_output_per_pattern_count() {
        let recs: Vec<RouteRecommendation> = (0..5).map(|i| recommendation("loop", i, i as f64)).collect();
        let survivors = dedup_and_cap(recs, 2, 1);
        assert_eq!(survivors.len(), 2);
    }
}
