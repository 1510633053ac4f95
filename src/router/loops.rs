//! §4.5.4: loop (simple circuit) search, Hawick-style — enumerate simple
//! cycles by DFS with a blocked-vertex set, treating each undirected edge
//! as bidirectional per the glossary's "Hawick circuit" definition.

use rustc_hash::FxHashMap;
#[cfg(feature = "tracing")]
use tracing::Level;

use crate::model::{Edge, EdgeId, VertexId};

#[derive(Debug, Clone)]
pub struct Circuit {
    pub edges: Vec<EdgeId>,
    pub vertices: Vec<VertexId>,
    pub length_m: f64,
}

struct Adjacency {
    out: FxHashMap<VertexId, Vec<(VertexId, EdgeId, f64)>>,
}

impl Adjacency {
    fn build(edges: &[Edge]) -> Self {
        let mut out: FxHashMap<VertexId, Vec<(VertexId, EdgeId, f64)>> = FxHashMap::default();
        for edge in edges {
            let length_m = edge.length_km * 1000.0;
            out.entry(edge.source).or_default().push((edge.target, edge.id, length_m));
            out.entry(edge.target).or_default().push((edge.source, edge.id, length_m));
        }
        Self { out }
    }

    fn neighbors(&self, v: VertexId) -> &[(VertexId, EdgeId, f64)] {
        self.out.get(&v).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// Enumerates simple circuits through `start`, up to `max_circuits`,
/// ranked by ascending total length. `start` is fixed as the circuit's
/// lowest vertex id to avoid reporting the same cycle from every vertex
/// on it, and both traversal directions of one cycle collapse to one
/// entry (reverse-edge-set dedup).
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, level = Level::INFO))]
pub fn find_circuits(vertices: &[VertexId], edges: &[Edge], start: VertexId, max_circuits: usize) -> Vec<Circuit> {
    let adjacency = Adjacency::build(edges);
    let mut found: Vec<Circuit> = Vec::new();
    let mut seen_edge_sets: Vec<Vec<EdgeId>> = Vec::new();

    let mut blocked: std::collections::HashSet<VertexId> = std::collections::HashSet::new();
    let mut path_vertices = vec![start];
    let mut path_edges: Vec<EdgeId> = Vec::new();
    let mut path_length_m = 0.0;

    blocked.insert(start);
    dfs(
        &adjacency,
        start,
        start,
        &mut blocked,
        &mut path_vertices,
        &mut path_edges,
        &mut path_length_m,
        &mut found,
        &mut seen_edge_sets,
        max_circuits,
        vertices.len(),
    );

    found.sort_by(|a, b| a.length_m.partial_cmp(&b.length_m).unwrap_or(std::cmp::Ordering::Equal));
    found.truncate(max_circuits);
    found
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    adjacency: &Adjacency,
    start: VertexId,
    current: VertexId,
    blocked: &mut std::collections::HashSet<VertexId>,
    path_vertices: &mut Vec<VertexId>,
    path_edges: &mut Vec<EdgeId>,
    path_length_m: &mut f64,
    found: &mut Vec<Circuit>,
    seen_edge_sets: &mut Vec<Vec<EdgeId>>,
    max_circuits: usize,
    node_cap: usize,
) {
    if found.len() >= max_circuits || path_vertices.len() > node_cap {
        return;
    }

    for &(neighbor, edge_id, weight) in adjacency.neighbors(current) {
        if path_edges.last() == Some(&edge_id) {
            continue;
        }

        if neighbor == start && path_vertices.len() >= 3 {
            let mut sorted_edges = path_edges.clone();
            sorted_edges.push(edge_id);
            sorted_edges.sort_by_key(|e| e.0);
            if seen_edge_sets.contains(&sorted_edges) {
                continue;
            }
            seen_edge_sets.push(sorted_edges);

            let mut edges = path_edges.clone();
            edges.push(edge_id);
            found.push(Circuit {
                edges,
                vertices: path_vertices.clone(),
                length_m: *path_length_m + weight,
            });
            continue;
        }

        if blocked.contains(&neighbor) {
            continue;
        }

        blocked.insert(neighbor);
        path_vertices.push(neighbor);
        path_edges.push(edge_id);
        *path_length_m += weight;

        dfs(
            adjacency, start, neighbor, blocked, path_vertices, path_edges, path_length_m, found, seen_edge_sets,
            max_circuits, node_cap,
        );

        *path_length_m -= weight;
        path_edges.pop();
        path_vertices.pop();
        blocked.remove(&neighbor);
    }
}
