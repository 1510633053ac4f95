//! §6 external interfaces. These are trait boundaries only — the CLI
//! surface, OSM ingestion, raster lookups, and SQLite/GeoJSON emission
//! that implement them are out of scope (§1).

pub mod elevation;
pub mod exporter;
pub mod overpass;

pub use elevation::ElevationProvider;
pub use exporter::{ExportSink, Exporter};
pub use overpass::{OverpassBackfill, OverpassFilters};
