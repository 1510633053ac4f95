//! §4.3.5: loop pre-split. Trails whose start and end coincide are
//! pre-segmentized into evenly spaced spans so later graph search treats
//! them as routable, rather than as a single self-loop edge.

use crate::config::L1Config;
use crate::conditioner::error::ConditionError;
use crate::geo::Line3;
use crate::model::Trail;

/// Splits every loop trail (start ≈ end within `intersection_tolerance_m`)
/// into at least `loop_min_segments` evenly spaced children.
pub fn presplit_loops(trails: Vec<Trail>, config: &L1Config) -> (Vec<Trail>, Vec<(Uuid, String)>) {
    let mut output = Vec::with_capacity(trails.len());
    let mut log = Vec::new();

    for trail in trails {
        if !trail.geometry.is_loop(config.intersection_tolerance_m) {
            output.push(trail);
            continue;
        }

        match split_loop(&trail, config) {
            Ok(children) => output.extend(children),
            Err(e) => {
                log.push((trail.uuid, format!("loop pre-split skipped: {e}")));
                output.push(trail);
            }
        }
    }

    (output, log)
}

fn split_loop(trail: &Trail, config: &L1Config) -> Result<Vec<Trail>, ConditionError> {
    let spans = config.loop_min_segments.max(2);
    let total = trail.geometry.length_meters();
    if total <= 0.0 {
        return Ok(vec![trail.clone()]);
    }

    let mut remaining = trail.geometry.clone();
    let mut children_geometry: Vec<Line3> = Vec::new();
    let mut consumed_fraction = 0.0_f64;

    for k in 1..spans {
        let target_fraction = k as f64 / spans as f64;
        // `remaining`'s own fractional axis is rescaled relative to what's
        // already been split off.
        let local_fraction = (target_fraction - consumed_fraction) / (1.0 - consumed_fraction);

        let remaining_start = remaining.start_point().ok_or_else(|| {
            ConditionError::UnsplittableLoop { trail: trail.uuid }
        })?;
        let split_point = point_at_fraction(&remaining, local_fraction, remaining_start)?;

        match remaining.split(split_point, 1e-9) {
            Ok((head, tail)) => {
                children_geometry.push(head);
                remaining = tail;
                consumed_fraction = target_fraction;
            }
            Err(_) => continue,
        }
    }
    children_geometry.push(remaining);

    if children_geometry.len() < 2 {
        return Err(ConditionError::UnsplittableLoop { trail: trail.uuid });
    }

    let mut children = Vec::with_capacity(children_geometry.len());
    for geometry in children_geometry {
        children.push(trail.split_child(geometry)?);
    }
    Ok(children)
}

fn point_at_fraction(
    line: &Line3,
    fraction: f64,
    fallback: crate::geo::Coord3,
) -> Result<crate::geo::Coord3, ConditionError> {
    let points = line.points();
    if points.len() < 2 {
        return Ok(fallback);
    }

    let total = line.length_meters();
    let target = total * fraction.clamp(0.0, 1.0);
    let mut acc = 0.0;

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let seg_len = crate::geo::haversine_meters(a, b);
        if acc + seg_len >= target {
            let local_t = if seg_len > 0.0 { (target - acc) / seg_len } else { 0.0 };
            let lng = a.lng + (b.lng - a.lng) * local_t;
            let lat = a.lat + (b.lat - a.lat) * local_t;
            let elevation = match (a.elevation, b.elevation) {
                (Some(za), Some(zb)) => Some(za + (zb - za) * local_t),
                (Some(z), None) | (None, Some(z)) => Some(z),
                (None, None) => None,
            };
            return Ok(crate::geo::Coord3::new(lng, lat, elevation));
        }
        acc += seg_len;
    }
    Ok(fallback)
}

use uuid::Uuid;

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::Coord3;

    fn triangle_loop() -> Trail {
        Trail::new(
            "test-region",
            Line3::new(vec![
                Coord3::new(0.0, 0.0, Some(0.0)),
                Coord3::new(0.01, 0.0, Some(10.0)),
                Coord3::new(0.005, 0.01, Some(0.0)),
                Coord3::new(0.0, 0.0, Some(0.0)),
            ]),
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn loop_trail_is_segmentized_into_min_segments() {
        let config = L1Config { loop_min_segments: 3, ..L1Config::default() };
        let (result, log) = presplit_loops(vec![triangle_loop()], &config);
        assert_eq!(result.len(), 3);
        assert!(log.is_empty());
        for child in &result {
            assert!(child.parent_uuid.is_some());
        }
    }

    #[test]
    fn non_loop_trail_is_untouched() {
        let straight = Trail::new(
            "test-region",
            Line3::new(vec![Coord3::new(0.0, 0.0, Some(0.0)), Coord3::new(0.01, 0.0, Some(0.0))]),
            None,
            None,
        )
        .unwrap();
        let config = L1Config::default();
        let (result, _) = presplit_loops(vec![straight], &config);
        assert_eq!(result.len(), 1);
    }
}
