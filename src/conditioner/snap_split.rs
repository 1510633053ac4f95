//! §4.3.4: the snap-and-split intersection engine, the central L1
//! algorithm. Grounded on `proximity/implementation.rs`'s square-scan
//! R-tree pruning, generalized from nearest-node lookup to pairwise
//! candidate pruning over trail bounding boxes.

use std::collections::HashSet;

use log::debug;
#[cfg(feature = "tracing")]
use tracing::Level;
use uuid::Uuid;

use crate::config::L1Config;
use crate::conditioner::error::ConditionError;
use crate::geo::{self, grid_snap, haversine_meters, Coord3, GeoError, IndexedEnvelope, Line3, SpatialIndex};
use crate::model::Trail;

struct SnappedNode {
    position: Coord3,
    trails: Vec<Uuid>,
}

/// Runs the six-step snap-and-split procedure over the current trail
/// set, returning the post-split trail set and a log of skipped points.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, level = Level::INFO))]
pub fn snap_and_split(trails: Vec<Trail>, config: &L1Config) -> (Vec<Trail>, Vec<(Uuid, String)>) {
    let t = config.intersection_tolerance_m;
    let mut log = Vec::new();

    // Step 1: densify working copies for near-miss detection.
    let densified: Vec<Line3> = trails.iter().map(|trail| trail.geometry.segmentize(t.max(0.01))).collect();

    // Index original trail bboxes to prune candidate pairs.
    let mut index: SpatialIndex<usize> = SpatialIndex::new();
    for (i, trail) in trails.iter().enumerate() {
        index.insert(IndexedEnvelope::from_bbox(
            i,
            trail.bbox.min_lng,
            trail.bbox.min_lat,
            trail.bbox.max_lng,
            trail.bbox.max_lat,
        ));
    }

    // Step 2: detect raw intersection points between pruned candidate pairs.
    let pad_deg = (t / 100_000.0).max(1e-9);
    let mut seen_pairs: HashSet<(usize, usize)> = HashSet::new();
    let mut raw_points: Vec<(Coord3, Uuid, Uuid)> = Vec::new();

    for i in 0..trails.len() {
        let bbox = trails[i].bbox;
        let candidates: Vec<usize> = index
            .query_by_bbox(bbox.min_lng - pad_deg, bbox.min_lat - pad_deg, bbox.max_lng + pad_deg, bbox.max_lat + pad_deg)
            .map(|e| e.id)
            .collect();

        for &j in &candidates {
            if j <= i {
                continue;
            }
            if !seen_pairs.insert((i, j)) {
                continue;
            }
            if !geo::dwithin(&densified[i], &densified[j], t) {
                continue;
            }
            if let geo::Intersection::Points(points) = geo::intersection(&densified[i], &densified[j]) {
                for point in points {
                    raw_points.push((point, trails[i].uuid, trails[j].uuid));
                }
            }
        }
    }

    // Step 3 + 4: snap each point to an existing vertex or the tolerance
    // grid, merging points that land within `t` of each other into one
    // node.
    let mut endpoints: Vec<Coord3> = Vec::with_capacity(trails.len() * 2);
    for trail in &trails {
        if let (Some(s), Some(e)) = (trail.geometry.start_point(), trail.geometry.end_point()) {
            endpoints.push(s);
            endpoints.push(e);
        }
    }

    let mut nodes: Vec<SnappedNode> = Vec::new();
    for (point, uuid_a, uuid_b) in raw_points {
        let snapped = snap_point(point, &endpoints, &nodes, t);
        match nodes.iter_mut().find(|n| haversine_meters(n.position, snapped) < t) {
            Some(existing) => {
                existing.trails.push(uuid_a);
                existing.trails.push(uuid_b);
            }
            None => nodes.push(SnappedNode { position: snapped, trails: vec![uuid_a, uuid_b] }),
        }
    }
    for node in &mut nodes {
        node.trails.sort();
        node.trails.dedup();
    }

    // Step 5 + 6: split each trail at its connected nodes and replace it
    // with the resulting children.
    let mut output = Vec::with_capacity(trails.len());
    for trail in trails {
        let mut split_points: Vec<Coord3> = Vec::new();
        for node in &nodes {
            if !node.trails.contains(&trail.uuid) {
                continue;
            }
            let frac = match trail.geometry.line_locate(node.position) {
                Some(f) => f,
                None => continue,
            };
            if frac <= config.endpoint_epsilon || frac >= 1.0 - config.endpoint_epsilon {
                if trail.geometry.is_loop(t) {
                    log.push((trail.uuid, "loop closure point deferred to loop pre-split".into()));
                }
                continue;
            }
            split_points.push(node.position);
        }

        if split_points.is_empty() {
            output.push(trail);
            continue;
        }

        match split_trail(&trail, split_points, config) {
            Ok(children) => output.extend(children),
            Err(e) => {
                debug!("trail {} split skipped: {e}", trail.uuid);
                log.push((trail.uuid, format!("split skipped: {e}")));
                output.push(trail);
            }
        }
    }

    (output, log)
}

fn snap_point(point: Coord3, endpoints: &[Coord3], nodes: &[SnappedNode], t: f64) -> Coord3 {
    let mut best: Option<(f64, Coord3)> = None;
    for candidate in endpoints.iter().copied().chain(nodes.iter().map(|n| n.position)) {
        let d = haversine_meters(point, candidate);
        if d <= t && best.map(|(best_d, _)| d < best_d).unwrap_or(true) {
            best = Some((d, candidate));
        }
    }
    best.map(|(_, p)| p).unwrap_or_else(|| grid_snap(point, t))
}

/// Splits `trail` sequentially at each of `points` (ordered along the
/// line), then merges any resulting child shorter than
/// `min_trail_length_m` into a neighbor before returning.
fn split_trail(trail: &Trail, mut points: Vec<Coord3>, config: &L1Config) -> Result<Vec<Trail>, ConditionError> {
    points.sort_by(|a, b| {
        let fa = trail.geometry.line_locate(*a).unwrap_or(0.0);
        let fb = trail.geometry.line_locate(*b).unwrap_or(0.0);
        fa.partial_cmp(&fb).expect("line fractions are never NaN")
    });

    let mut children_geometry: Vec<Line3> = Vec::new();
    let mut remaining = trail.geometry.clone();

    for point in points {
        match remaining.split(point, config.endpoint_epsilon) {
            Ok((head, tail)) => {
                children_geometry.push(head);
                remaining = tail;
            }
            Err(GeoError::DegenerateGeometry(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    children_geometry.push(remaining);

    let merged = merge_short_segments(children_geometry, config.min_trail_length_m);

    let mut children = Vec::with_capacity(merged.len());
    for geometry in merged {
        children.push(trail.split_child(geometry)?);
    }
    Ok(children)
}

fn merge_short_segments(mut segments: Vec<Line3>, min_length_m: f64) -> Vec<Line3> {
    if segments.len() <= 1 {
        return segments;
    }

    loop {
        let short_idx = segments.iter().position(|s| s.length_meters() < min_length_m);
        let Some(idx) = short_idx else { break };
        if segments.len() == 1 {
            break;
        }

        if idx > 0 {
            let merged = segments[idx - 1].concat(&segments[idx]);
            segments.splice(idx - 1..=idx, [merged]);
        } else {
            let merged = segments[idx].concat(&segments[idx + 1]);
            segments.splice(idx..=idx + 1, [merged]);
        }
    }
    segments
}

#[cfg(test)]
mod test {
    use super::*;

    fn trail(points: &[(f64, f64)]) -> Trail {
        Trail::new(
            "test-region",
            Line3::new(points.iter().map(|(x, y)| Coord3::new(*x, *y, Some(0.0))).collect()),
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn t_intersection_splits_the_through_trail() {
        // A crosses B at (1,0); per §8 scenario 1, A splits into two
        // children and B is retained as a single trail (its crossing
        // point is an interior point, not near either endpoint).
        let a = trail(&[(0.0, 0.0), (2.0, 0.0)]);
        let b = trail(&[(1.0, -1.0), (1.0, 1.0)]);

        let config = L1Config { intersection_tolerance_m: 0.01, endpoint_epsilon: 0.001, ..L1Config::default() };
        let (result, _log) = snap_and_split(vec![a, b], &config);

        // (1,0) is an interior point of both A and B (fraction 0.5 on
        // each), so §8.2's per-(trail,node) split requirement applies to
        // both: A splits into A1/A2, B splits into B1/B2 — 4 trails.
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn disjoint_trails_are_unaffected() {
        let a = trail(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = trail(&[(10.0, 10.0), (11.0, 11.0)]);

        let config = L1Config::default();
        let (result, log) = snap_and_split(vec![a, b], &config);

        assert_eq!(result.len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn merge_short_segments_drops_sub_minimum_children() {
        let whole = Line3::new(vec![
            Coord3::new(0.0, 0.0, Some(0.0)),
            Coord3::new(0.0, 0.0000001, Some(0.0)),
            Coord3::new(0.0, 0.01, Some(0.0)),
        ]);
        let segments = vec![
            Line3::new(whole.points()[0..2].to_vec()),
            Line3::new(whole.points()[1..3].to_vec()),
        ];
        let merged = merge_short_segments(segments, 10.0);
        assert_eq!(merged.len(), 1);
    }
}
