//! §4.3.3: gap fixing. External backfill (Overpass) is orchestrated by
//! the pipeline, not here — this module only emits synthetic bridges.

use crate::config::L1Config;
use crate::geo::{haversine_meters, Line3};
use crate::model::Trail;

/// Emits a synthetic bridge trail for every pair of distinct trails'
/// endpoints that lie within `[min_gap_m, max_gap_m]` of each other.
pub fn fix_gaps(trails: &[Trail], region: &str, config: &L1Config) -> Vec<Trail> {
    let mut endpoints = Vec::with_capacity(trails.len() * 2);
    for trail in trails {
        if let (Some(start), Some(end)) = (trail.geometry.start_point(), trail.geometry.end_point()) {
            endpoints.push((trail.uuid, start));
            endpoints.push((trail.uuid, end));
        }
    }

    let mut bridges = Vec::new();
    for i in 0..endpoints.len() {
        for j in (i + 1)..endpoints.len() {
            let (uuid_a, point_a) = endpoints[i];
            let (uuid_b, point_b) = endpoints[j];
            if uuid_a == uuid_b {
                continue;
            }

            let dist = haversine_meters(point_a, point_b);
            if dist < config.min_gap_m || dist > config.max_gap_m {
                continue;
            }

            let line = Line3::new(vec![point_a, point_b]);
            let name = Some(format!("bridge: {uuid_a} \u{2194} {uuid_b}"));
            if let Ok(mut bridge) = Trail::new(region, line, None, name) {
                bridge.synthetic = true;
                bridges.push(bridge);
            }
        }
    }
    bridges
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

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
    fn bridges_endpoints_within_gap_window() {
        // Endpoints ~5m apart at the equator (1 degree lng ~= 111km).
        let gap_deg = 5.0 / 111_000.0;
        let a = trail((0.0, 0.0), (0.01, 0.0));
        let b = trail((0.01 + gap_deg, 0.0), (0.02 + gap_deg, 0.0));

        let config = L1Config { min_gap_m: 0.5, max_gap_m: 10.0, ..L1Config::default() };
        let bridges = fix_gaps(&[a, b], "test-region", &config);

        assert_eq!(bridges.len(), 1);
        assert!(bridges[0].synthetic);
        assert_relative_eq!(bridges[0].length_km * 1000.0, 5.0, epsilon = 1.0);
    }

    #[test]
    fn endpoints_outside_window_are_not_bridged() {
        let a = trail((0.0, 0.0), (0.01, 0.0));
        let b = trail((5.0, 5.0), (5.01, 5.0));

        let config = L1Config { min_gap_m: 0.5, max_gap_m: 10.0, ..L1Config::default() };
        let bridges = fix_gaps(&[a, b], "test-region", &config);
        assert!(bridges.is_empty());
    }
}
