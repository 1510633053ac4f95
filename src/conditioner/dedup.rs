//! §4.3.2: deduplication.

use uuid::Uuid;

use crate::config::L1Config;
use crate::geo::{hausdorff_distance_meters, Line3};
use crate::model::Trail;

/// Collapses near-identical trails. Two trails are duplicates iff their
/// Hausdorff distance is within `distance_threshold`, or at least
/// `overlap_threshold` of the shorter trail's length lies within
/// `distance_threshold` of the other. The longer trail survives; ties
/// break on the lexicographically smaller uuid. The surviving record
/// inherits `source_id`/tags from the discarded one when it lacks them.
pub fn dedup(trails: Vec<Trail>, config: &L1Config) -> (Vec<Trail>, Vec<(Uuid, String)>) {
    let mut survivors: Vec<Trail> = Vec::new();
    let mut dropped = Vec::new();

    'next_trail: for trail in trails {
        for survivor in survivors.iter_mut() {
            if !bbox_could_overlap(survivor, &trail, config.distance_threshold) {
                continue;
            }
            if is_duplicate(survivor, &trail, config) {
                let (keep, discard) = pick_winner(survivor.clone(), trail);
                dropped.push((discard.uuid, format!("duplicate of {}", keep.uuid)));
                *survivor = keep;
                continue 'next_trail;
            }
        }
        survivors.push(trail);
    }

    (survivors, dropped)
}

fn bbox_could_overlap(a: &Trail, b: &Trail, distance_threshold_m: f64) -> bool {
    let pad = (distance_threshold_m / 111_000.0).max(1e-6);
    !(a.bbox.max_lng + pad < b.bbox.min_lng
        || b.bbox.max_lng + pad < a.bbox.min_lng
        || a.bbox.max_lat + pad < b.bbox.min_lat
        || b.bbox.max_lat + pad < a.bbox.min_lat)
}

fn is_duplicate(a: &Trail, b: &Trail, config: &L1Config) -> bool {
    if hausdorff_distance_meters(&a.geometry, &b.geometry) <= config.distance_threshold {
        return true;
    }

    let (shorter, longer) = if a.length_km <= b.length_km { (&a.geometry, &b.geometry) } else { (&b.geometry, &a.geometry) };
    overlap_fraction(shorter, longer, config.distance_threshold) >= config.overlap_threshold
}

fn overlap_fraction(shorter: &Line3, longer: &Line3, distance_threshold_m: f64) -> f64 {
    let spacing = distance_threshold_m.max(0.5);
    let dense = shorter.segmentize(spacing);
    let points = dense.points();
    if points.is_empty() {
        return 0.0;
    }
    let within = points
        .iter()
        .filter(|p| longer.distance_to_point_meters(**p) <= distance_threshold_m)
        .count();
    within as f64 / points.len() as f64
}

fn pick_winner(a: Trail, b: Trail) -> (Trail, Trail) {
    let a_wins = match a.length_km.partial_cmp(&b.length_km).expect("lengths are never NaN") {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => a.uuid < b.uuid,
    };
    let (mut keep, discard) = if a_wins { (a, b) } else { (b, a) };

    if keep.source_id.is_none() {
        keep.source_id = discard.source_id.clone();
    }
    if keep.tags.0.is_empty() {
        keep.tags = discard.tags.clone();
    }
    (keep, discard)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::Coord3;

    fn trail(a: (f64, f64), b: (f64, f64)) -> Trail {
        Trail::new(
            "test-region",
            Line3::new(vec![Coord3::new(a.0, a.1, Some(0.0)), Coord3::new(b.0, b.1, Some(0.0))]),
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn near_identical_trails_collapse_to_one() {
        let original = trail((0.0, 0.0), (0.01, 0.0));
        let mut copy = trail((0.0, 0.0000001), (0.01, 0.0000001));
        copy.name = Some("copy".into());

        let config = L1Config::default();
        let (survivors, dropped) = dedup(vec![original, copy], &config);

        assert_eq!(survivors.len(), 1);
        assert_eq!(dropped.len(), 1);
    }

    #[test]
    fn distant_trails_both_survive() {
        let a = trail((0.0, 0.0), (0.01, 0.0));
        let b = trail((10.0, 10.0), (10.01, 10.0));

        let config = L1Config::default();
        let (survivors, dropped) = dedup(vec![a, b], &config);

        assert_eq!(survivors.len(), 2);
        assert!(dropped.is_empty());
    }

    #[test]
    fn surviving_record_inherits_missing_source_id() {
        let mut original = trail((0.0, 0.0), (0.01, 0.0));
        original.source_id = None;
        let mut copy = trail((0.0, 0.0000001), (0.01, 0.0000001));
        copy.source_id = Some("osm:123".into());

        let config = L1Config::default();
        let (survivors, _) = dedup(vec![original, copy], &config);
        assert_eq!(survivors[0].source_id.as_deref(), Some("osm:123"));
    }
}
