use serde::{Deserialize, Serialize};

use crate::geo::Coord3;

/// Dense, per-run integer identity — §9's "arena storage with integer
/// indices" redesign flag, instead of the original's implicit pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexKind {
    Intersection,
    Endpoint,
}

/// §3 Vertex (node, L2): a point in the routable graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub position: Coord3,
    pub kind: VertexKind,
    /// Trail uuids that reference this vertex as an endpoint.
    pub connected_trails: Vec<uuid::Uuid>,
}

impl Vertex {
    pub fn new(id: VertexId, position: Coord3) -> Self {
        Self { id, position, kind: VertexKind::Endpoint, connected_trails: Vec::new() }
    }

    /// Recomputes `kind` from the number of *distinct* trails referencing
    /// this vertex: `intersection` iff ≥2 distinct trails meet here.
    pub fn recompute_kind(&mut self) {
        let mut distinct = self.connected_trails.clone();
        distinct.sort();
        distinct.dedup();
        self.kind = if distinct.len() >= 2 { VertexKind::Intersection } else { VertexKind::Endpoint };
    }
}
