//! §4.4: the L2 graph assembler.

pub mod bridge;
pub mod chain_merge;
pub mod dedup;
pub mod edges;
pub mod error;
pub mod vertices;

use log::{info, warn};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::config::L2Config;
use crate::model::{Edge, EdgeId, Trail, Vertex, VertexId};

pub use error::AssembleError;

/// Per-record outcome counts for one L2 run (§7).
#[derive(Debug, Default)]
pub struct L2Report {
    pub trails_in: usize,
    pub edges_out: usize,
    pub vertices_out: usize,
    pub rejected: Vec<(Uuid, String)>,
    pub merged_chains: usize,
    pub deduped: Vec<(EdgeId, String)>,
    pub bridges_added: usize,
}

/// Runs the full L2 pipeline: vertex extraction, edge construction,
/// degree-2 chain merging, overlap dedup, component bridging, in that
/// order (§4.4.1 through §4.4.5).
pub fn assemble(trails: Vec<Trail>, config: &L2Config) -> Result<(Vec<Vertex>, Vec<Edge>, L2Report), AssembleError> {
    info!("L2 assembling {} trails", trails.len());
    let mut report = L2Report { trails_in: trails.len(), ..L2Report::default() };

    let (vertices, endpoint_vertices) = vertices::extract_vertices(&trails, config);
    let (built_edges, rejected) = edges::build_edges(&trails, &endpoint_vertices, &vertices, config);
    for (uuid, reason) in &rejected {
        warn!("trail {uuid} rejected during edge construction: {reason}");
    }
    report.rejected.extend(rejected);

    let vertex_ids: std::collections::HashSet<VertexId> = vertices.iter().map(|v| v.id).collect();
    for edge in &built_edges {
        if !vertex_ids.contains(&edge.source) || !vertex_ids.contains(&edge.target) {
            return Err(AssembleError::GraphInconsistent(format!(
                "edge {:?} references a vertex missing from the vertex table",
                edge.id
            )));
        }
    }

    let trails_by_uuid: FxHashMap<Uuid, Trail> = trails.into_iter().map(|t| (t.uuid, t)).collect();

    let before_merge = built_edges.len();
    let merged = chain_merge::merge_chains(built_edges, &vertices, &trails_by_uuid, config);
    report.merged_chains = before_merge.saturating_sub(merged.len());

    let (deduped, dedup_log) = dedup::dedup_edges(merged, config);
    report.deduped = dedup_log;
    let before_bridge = deduped.len();

    let bridged = bridge::bridge_components(deduped, &vertices, config);
    report.bridges_added = bridged.len().saturating_sub(before_bridge);

    report.vertices_out = vertices.len();
    report.edges_out = bridged.len();
    info!(
        "L2 assembly produced {} vertices, {} edges ({} rejected, {} merged chains, {} bridges added)",
        report.vertices_out,
        report.edges_out,
        report.rejected.len(),
        report.merged_chains,
        report.bridges_added
    );
    Ok((vertices, bridged, report))
}
