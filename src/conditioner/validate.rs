//! §4.3.1: validation and cleanup.

use rayon::prelude::*;
use uuid::Uuid;

use crate::config::L1Config;
use crate::external::ElevationProvider;
use crate::geo::{Coord3, Line3};
use crate::model::Trail;

/// Drops trails with invalid geometry, sub-minimum length, or (when
/// `require_elevation`) unresolvable 3D elevation. Surviving trails have
/// their elevation stats recomputed from geometry when missing or
/// inconsistent. Runs per-trail in parallel — each trail is independent.
pub fn validate_and_clean(
    trails: Vec<Trail>,
    config: &L1Config,
    elevation: Option<&dyn ElevationProvider>,
    require_elevation: bool,
) -> (Vec<Trail>, Vec<(Uuid, String)>) {
    let results: Vec<Result<Trail, (Uuid, String)>> = trails
        .into_par_iter()
        .map(|trail| validate_one(trail, config, elevation, require_elevation))
        .collect();

    let mut kept = Vec::with_capacity(results.len());
    let mut dropped = Vec::new();
    for result in results {
        match result {
            Ok(trail) => kept.push(trail),
            Err(reason) => dropped.push(reason),
        }
    }
    (kept, dropped)
}

fn validate_one(
    mut trail: Trail,
    config: &L1Config,
    elevation: Option<&dyn ElevationProvider>,
    require_elevation: bool,
) -> Result<Trail, (Uuid, String)> {
    if !trail.geometry.is_valid() {
        return Err((trail.uuid, "invalid geometry".into()));
    }

    if trail.length_km * 1000.0 < config.min_trail_length_m {
        return Err((trail.uuid, format!("length {:.3}m below minimum", trail.length_km * 1000.0)));
    }

    if let Some(provider) = elevation {
        trail.geometry = fill_elevation(&trail.geometry, provider);
    }

    if require_elevation && trail.geometry.points().iter().any(|p| p.elevation.is_none()) {
        return Err((trail.uuid, "missing elevation data and require_elevation is set".into()));
    }

    let inconsistent = trail.elevation.map(|e| !e.is_consistent()).unwrap_or(true);
    if inconsistent {
        trail
            .recompute_from_geometry()
            .map_err(|e| (trail.uuid, format!("recompute failed: {e}")))?;
    }

    Ok(trail)
}

fn fill_elevation(line: &Line3, provider: &dyn ElevationProvider) -> Line3 {
    let points: Vec<Coord3> = line
        .points()
        .iter()
        .map(|p| {
            if p.elevation.is_some() {
                *p
            } else {
                Coord3::new(p.lng, p.lat, provider.elevation(p.lng, p.lat))
            }
        })
        .collect();
    Line3::new(points)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::external::elevation::NoElevationProvider;

    fn trail(points: Vec<Coord3>) -> Trail {
        Trail::new("test-region", Line3::new(points), None, None).unwrap()
    }

    #[test]
    fn drops_trails_shorter_than_minimum() {
        let short = trail(vec![Coord3::new(0.0, 0.0, Some(0.0)), Coord3::new(0.0000001, 0.0, Some(0.0))]);
        let config = L1Config { min_trail_length_m: 10.0, ..L1Config::default() };
        let (kept, dropped) = validate_and_clean(vec![short], &config, None, false);
        assert!(kept.is_empty());
        assert_eq!(dropped.len(), 1);
    }

    #[test]
    fn keeps_valid_trail() {
        let line = trail(vec![Coord3::new(0.0, 0.0, Some(0.0)), Coord3::new(0.01, 0.0, Some(5.0))]);
        let config = L1Config::default();
        let (kept, dropped) = validate_and_clean(vec![line], &config, None, false);
        assert_eq!(kept.len(), 1);
        assert!(dropped.is_empty());
    }

    #[test]
    fn require_elevation_drops_trail_with_no_provider_data() {
        let line = Line3::new(vec![Coord3::new(0.0, 0.0, None), Coord3::new(0.01, 0.0, None)]);
        let trail = Trail { elevation: None, ..trail(vec![Coord3::new(0.0, 0.0, Some(0.0)), Coord3::new(0.01, 0.0, Some(0.0))]) };
        let mut trail = trail;
        trail.geometry = line;
        let config = L1Config::default();
        let (kept, dropped) = validate_and_clean(vec![trail], &config, Some(&NoElevationProvider), true);
        assert!(kept.is_empty());
        assert_eq!(dropped.len(), 1);
    }
}
