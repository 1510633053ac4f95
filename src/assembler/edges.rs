//! §4.4.2: edge construction.

use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::config::L2Config;
use crate::geo::haversine_meters;
use crate::model::{Edge, EdgeId, Trail, Vertex, VertexId};

/// Emits one edge per conditioned trail whose endpoints resolved to
/// vertices within `edge_to_vertex_tolerance_m`. Self-loop edges
/// (`source == target`) are rejected — by §4.3.5, loop trails have
/// already been pre-segmentized in L1, so a surviving self-loop here
/// indicates an unresolved loop and is counted as a dangling endpoint.
pub fn build_edges(
    trails: &[Trail],
    endpoint_vertices: &FxHashMap<Uuid, (VertexId, VertexId)>,
    vertices: &[Vertex],
    config: &L2Config,
) -> (Vec<Edge>, Vec<(Uuid, String)>) {
    let positions: FxHashMap<VertexId, _> = vertices.iter().map(|v| (v.id, v.position)).collect();

    let mut edges = Vec::with_capacity(trails.len());
    let mut rejected = Vec::new();
    let mut next_id = 0u32;

    for trail in trails {
        let Some(&(source, target)) = endpoint_vertices.get(&trail.uuid) else {
            rejected.push((trail.uuid, "no resolved endpoint vertex".into()));
            continue;
        };

        let (Some(start), Some(end)) = (trail.geometry.start_point(), trail.geometry.end_point()) else {
            rejected.push((trail.uuid, "trail has no endpoints".into()));
            continue;
        };

        let source_pos = positions[&source];
        let target_pos = positions[&target];
        if haversine_meters(start, source_pos) > config.edge_to_vertex_tolerance_m
            || haversine_meters(end, target_pos) > config.edge_to_vertex_tolerance_m
        {
            rejected.push((trail.uuid, "endpoint outside edge_to_vertex_tolerance_m".into()));
            continue;
        }

        if source == target {
            rejected.push((trail.uuid, "self-loop edge rejected".into()));
            continue;
        }

        edges.push(Edge::new(EdgeId(next_id), source, target, trail.uuid, trail.geometry.clone()));
        next_id += 1;
    }

    (edges, rejected)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assembler::vertices::extract_vertices;
    use crate::geo::{Coord3, Line3};

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
    fn builds_one_edge_per_trail() {
        let a = trail((0.0, 0.0), (1.0, 0.0));
        let b = trail((1.0, 0.0), (1.0, 1.0));
        let trails = vec![a, b];

        let config = L2Config::default();
        let (vertices, endpoint_vertices) = extract_vertices(&trails, &config);
        let (edges, rejected) = build_edges(&trails, &endpoint_vertices, &vertices, &config);

        assert_eq!(edges.len(), 2);
        assert!(rejected.is_empty());
    }
}
