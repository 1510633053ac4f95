//! §6: "Exporter: `export(trails, vertices, edges, recommendations,
//! sink)` with sinks `{sqlite_file, geojson_file}`; the core treats the
//! sink opaquely. Exports must preserve 3D coordinates (no Z stripping)."

use crate::model::{Edge, RouteRecommendation, Trail, Vertex};

#[derive(Debug, Clone)]
pub enum ExportSink {
    SqliteFile(std::path::PathBuf),
    GeojsonFile(std::path::PathBuf),
}

/// The serialization boundary. Implementing a concrete sink (SQLite,
/// GeoJSON) is out of scope (§1); the core only needs to hand it a
/// finalized set of records.
pub trait Exporter: Send + Sync {
    type Error: std::error::Error;

    fn export(
        &self,
        trails: &[Trail],
        vertices: &[Vertex],
        edges: &[Edge],
        recommendations: &[RouteRecommendation],
        sink: &ExportSink,
    ) -> Result<(), Self::Error>;
}
