//! §4.4.1: vertex extraction.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::config::L2Config;
use crate::geo::{grid_snap, Coord3};
use crate::model::{Trail, Vertex, VertexId};

/// Creates one candidate vertex per trail endpoint, merging candidates
/// whose grid-snapped positions coincide at `node_tolerance_m`. Returns
/// the merged vertex table and, per trail uuid, the `(source, target)`
/// vertex ids its endpoints resolved to.
pub fn extract_vertices(
    trails: &[Trail],
    config: &L2Config,
) -> (Vec<Vertex>, FxHashMap<Uuid, (VertexId, VertexId)>) {
    let mut groups: BTreeMap<(i64, i64), Vec<(Uuid, Coord3)>> = BTreeMap::new();

    for trail in trails {
        if let (Some(start), Some(end)) = (trail.geometry.start_point(), trail.geometry.end_point()) {
            for point in [start, end] {
                let snapped = grid_snap(point, config.node_tolerance_m);
                groups.entry(quantize(snapped)).or_default().push((trail.uuid, snapped));
            }
        }
    }

    let mut vertices = Vec::with_capacity(groups.len());
    let mut position_lookup: FxHashMap<(i64, i64), VertexId> = FxHashMap::default();

    for (index, (key, entries)) in groups.iter().enumerate() {
        let id = VertexId(index as u32);
        let mut connected: Vec<Uuid> = entries.iter().map(|(uuid, _)| *uuid).collect();
        connected.sort();
        connected.dedup();

        let mut vertex = Vertex::new(id, entries[0].1);
        vertex.connected_trails = connected;
        vertex.recompute_kind();

        vertices.push(vertex);
        position_lookup.insert(*key, id);
    }

    let mut endpoint_vertices: FxHashMap<Uuid, (VertexId, VertexId)> = FxHashMap::default();
    for trail in trails {
        if let (Some(start), Some(end)) = (trail.geometry.start_point(), trail.geometry.end_point()) {
            let start_key = quantize(grid_snap(start, config.node_tolerance_m));
            let end_key = quantize(grid_snap(end, config.node_tolerance_m));
            if let (Some(&source), Some(&target)) = (position_lookup.get(&start_key), position_lookup.get(&end_key)) {
                endpoint_vertices.insert(trail.uuid, (source, target));
            }
        }
    }

    (vertices, endpoint_vertices)
}

fn quantize(point: Coord3) -> (i64, i64) {
    ((point.lng * 1e9).round() as i64, (point.lat * 1e9).round() as i64)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::Line3;

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
    fn shared_endpoint_merges_into_one_intersection_vertex() {
        let a = trail((0.0, 0.0), (1.0, 0.0));
        let b = trail((1.0, 0.0), (1.0, 1.0));

        let config = L2Config::default();
        let (vertices, endpoints) = extract_vertices(&[a.clone(), b.clone()], &config);

        assert_eq!(vertices.len(), 3);
        let shared = endpoints[&a.uuid].1;
        assert_eq!(shared, endpoints[&b.uuid].0);

        let shared_vertex = vertices.iter().find(|v| v.id == shared).unwrap();
        assert_eq!(shared_vertex.kind, crate::model::VertexKind::Intersection);
    }

    #[test]
    fn disjoint_trails_produce_four_endpoint_vertices() {
        let a = trail((0.0, 0.0), (1.0, 0.0));
        let b = trail((10.0, 10.0), (11.0, 11.0));

        let config = L2Config::default();
        let (vertices, _) = extract_vertices(&[a, b], &config);
        assert_eq!(vertices.len(), 4);
    }
}
