//! §6: "Overpass backfill (read-only): `fetch_trails(bbox, filters) ->
//! [Trail]`. ... Returned trails are subjected to L1 validation and
//! dedup."

use crate::model::{Trail, TrailType};

#[derive(Debug, Clone, Default)]
pub struct OverpassFilters {
    pub trail_types: Vec<TrailType>,
    pub exclude_surfaces: Vec<crate::model::Surface>,
    pub timeout_seconds: u64,
    pub max_trails_per_request: usize,
}

/// The OSM-backed backfill source. Implementing this (HTTP, caching,
/// rate limiting) is out of scope (§1); core logic only consumes
/// whatever trails come back, re-entering L1 validation and dedup.
pub trait OverpassBackfill: Send + Sync {
    type Error: std::error::Error;

    fn fetch_trails(
        &self,
        bbox: (f64, f64, f64, f64),
        filters: &OverpassFilters,
    ) -> Result<Vec<Trail>, Self::Error>;
}
