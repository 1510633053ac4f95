//! §4.4.3: degree-2 chain merging.

use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::config::L2Config;
use crate::geo::haversine_meters;
use crate::model::{Edge, EdgeId, Trail, Vertex, VertexId};

/// Dissolves every vertex with degree exactly 2 whose two incident edges
/// share compatible trail attributes and meet within
/// `degree2_merge_tolerance_m`, concatenating them into one edge.
/// Repeats to a fixed point.
pub fn merge_chains(mut edges: Vec<Edge>, vertices: &[Vertex], trails: &FxHashMap<Uuid, Trail>, config: &L2Config) -> Vec<Edge> {
    let positions: FxHashMap<VertexId, _> = vertices.iter().map(|v| (v.id, v.position)).collect();
    let mut next_id = edges.iter().map(|e| e.id.0).max().map(|m| m + 1).unwrap_or(0);

    loop {
        let degree = incidence(&edges);
        let merged_any = try_merge_one(&mut edges, &degree, &positions, trails, config, &mut next_id);
        if !merged_any {
            break;
        }
    }

    edges
}

/// Finds the first mergeable degree-2 vertex (compatible attributes,
/// continuous geometry) and merges it. Returns whether a merge happened;
/// skips over degree-2 vertices that fail either check so they don't
/// block progress on the rest of the graph.
fn try_merge_one(
    edges: &mut Vec<Edge>,
    degree: &FxHashMap<VertexId, Vec<usize>>,
    positions: &FxHashMap<VertexId, crate::geo::Coord3>,
    trails: &FxHashMap<Uuid, Trail>,
    config: &L2Config,
    next_id: &mut u32,
) -> bool {
    for (&vid, incident) in degree {
        if incident.len() != 2 || incident[0] == incident[1] {
            continue;
        }
        let (i, j) = (incident[0], incident[1]);
        if !compatible(&edges[i], &edges[j], trails) {
            continue;
        }
        if let Some(&position) = positions.get(&vid) {
            if !continuous_at(&edges[i], &edges[j], vid, position, config.degree2_merge_tolerance_m) {
                continue;
            }
        }

        let merged = concat_edges(&edges[i], &edges[j], vid, *next_id);
        *next_id += 1;
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        edges.remove(hi);
        edges.remove(lo);
        edges.push(merged);
        return true;
    }
    false
}

fn continuous_at(a: &Edge, b: &Edge, vid: VertexId, position: crate::geo::Coord3, tolerance_m: f64) -> bool {
    let a_end = if a.target == vid { a.geometry.end_point() } else { a.geometry.start_point() };
    let b_end = if b.source == vid { b.geometry.start_point() } else { b.geometry.end_point() };
    match (a_end, b_end) {
        (Some(a_end), Some(b_end)) => {
            haversine_meters(a_end, position) <= tolerance_m && haversine_meters(b_end, position) <= tolerance_m
        }
        _ => false,
    }
}

fn incidence(edges: &[Edge]) -> FxHashMap<VertexId, Vec<usize>> {
    let mut map: FxHashMap<VertexId, Vec<usize>> = FxHashMap::default();
    for (index, edge) in edges.iter().enumerate() {
        map.entry(edge.source).or_default().push(index);
        map.entry(edge.target).or_default().push(index);
    }
    map
}

fn compatible(a: &Edge, b: &Edge, trails: &FxHashMap<Uuid, Trail>) -> bool {
    if a.bidirectional != b.bidirectional {
        return false;
    }
    match (trails.get(&a.trail_uuid), trails.get(&b.trail_uuid)) {
        (Some(ta), Some(tb)) => same_when_present(&ta.name, &tb.name) && same_when_present(&ta.surface, &tb.surface),
        _ => true,
    }
}

fn same_when_present<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    }
}

fn concat_edges(a: &Edge, b: &Edge, vid: VertexId, id: u32) -> Edge {
    let into_vid = if a.target == vid { a.geometry.clone() } else { a.geometry.reversed() };
    let out_of_vid = if b.source == vid { b.geometry.clone() } else { b.geometry.reversed() };
    let geometry = into_vid.concat(&out_of_vid);

    let source = if a.source == vid { a.target } else { a.source };
    let target = if b.target == vid { b.source } else { b.target };

    Edge {
        id: EdgeId(id),
        source,
        target,
        trail_uuid: a.trail_uuid,
        length_km: a.length_km + b.length_km,
        gain: a.gain + b.gain,
        loss: a.loss + b.loss,
        bidirectional: a.bidirectional,
        geometry,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::{Coord3, Line3};
    use crate::model::VertexId;

    fn trail() -> Trail {
        Trail::new(
            "test-region",
            Line3::new(vec![Coord3::new(0.0, 0.0, Some(0.0)), Coord3::new(0.02, 0.0, Some(0.0))]),
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn chain_of_two_edges_merges_into_one() {
        let t = trail();
        let mut trails = FxHashMap::default();
        trails.insert(t.uuid, t.clone());

        let line1 = Line3::new(vec![Coord3::new(0.0, 0.0, Some(0.0)), Coord3::new(0.01, 0.0, Some(0.0))]);
        let line2 = Line3::new(vec![Coord3::new(0.01, 0.0, Some(0.0)), Coord3::new(0.02, 0.0, Some(0.0))]);

        let e1 = Edge::new(EdgeId(0), VertexId(0), VertexId(1), t.uuid, line1);
        let e2 = Edge::new(EdgeId(1), VertexId(1), VertexId(2), t.uuid, line2);

        let vertices = vec![
            Vertex::new(VertexId(0), Coord3::new(0.0, 0.0, Some(0.0))),
            Vertex::new(VertexId(1), Coord3::new(0.01, 0.0, Some(0.0))),
            Vertex::new(VertexId(2), Coord3::new(0.02, 0.0, Some(0.0))),
        ];

        let merged = merge_chains(vec![e1, e2], &vertices, &trails, &L2Config::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, VertexId(0));
        assert_eq!(merged[0].target, VertexId(2));
    }

    #[test]
    fn branching_vertex_is_not_merged() {
        let t = trail();
        let mut trails = FxHashMap::default();
        trails.insert(t.uuid, t.clone());

        let line1 = Line3::new(vec![Coord3::new(0.0, 0.0, Some(0.0)), Coord3::new(0.01, 0.0, Some(0.0))]);
        let line2 = Line3::new(vec![Coord3::new(0.01, 0.0, Some(0.0)), Coord3::new(0.02, 0.0, Some(0.0))]);
        let line3 = Line3::new(vec![Coord3::new(0.01, 0.0, Some(0.0)), Coord3::new(0.01, 0.01, Some(0.0))]);

        let e1 = Edge::new(EdgeId(0), VertexId(0), VertexId(1), t.uuid, line1);
        let e2 = Edge::new(EdgeId(1), VertexId(1), VertexId(2), t.uuid, line2);
        let e3 = Edge::new(EdgeId(2), VertexId(1), VertexId(3), t.uuid, line3);

        let vertices = vec![
            Vertex::new(VertexId(0), Coord3::new(0.0, 0.0, Some(0.0))),
            Vertex::new(VertexId(1), Coord3::new(0.01, 0.0, Some(0.0))),
            Vertex::new(VertexId(2), Coord3::new(0.02, 0.0, Some(0.0))),
            Vertex::new(VertexId(3), Coord3::new(0.01, 0.01, Some(0.0))),
        ];

        let merged = merge_chains(vec![e1, e2, e3], &vertices, &trails, &L2Config::default());
        assert_eq!(merged.len(), 3);
    }
}
