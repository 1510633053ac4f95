//! §4.4.4: overlap deduplication.

use crate::config::L2Config;
use crate::geo::hausdorff_distance_meters;
use crate::model::{Edge, EdgeId};

/// Drops edges that share the same endpoint pair (in either direction)
/// as a previously kept edge and lie within `spatial_tolerance_m`
/// Hausdorff distance of it. The longer edge survives; ties prefer the
/// one with more complete trail attribution (length as the proxy here,
/// since attribute completeness lives on the source `Trail`).
pub fn dedup_edges(edges: Vec<Edge>, config: &L2Config) -> (Vec<Edge>, Vec<(EdgeId, String)>) {
    let mut survivors: Vec<Edge> = Vec::new();
    let mut dropped = Vec::new();

    'next_edge: for edge in edges {
        for survivor in survivors.iter_mut() {
            if !same_endpoint_pair(survivor, &edge) {
                continue;
            }
            if hausdorff_distance_meters(&survivor.geometry, &edge.geometry) > config.spatial_tolerance_m {
                continue;
            }
            if edge.length_km > survivor.length_km {
                dropped.push((survivor.id, format!("duplicate of {:?}", edge.id)));
                *survivor = edge;
            } else {
                dropped.push((edge.id, format!("duplicate of {:?}", survivor.id)));
            }
            continue 'next_edge;
        }
        survivors.push(edge);
    }

    (survivors, dropped)
}

fn same_endpoint_pair(a: &Edge, b: &Edge) -> bool {
    (a.source == b.source && a.target == b.target) || (a.source == b.target && a.target == b.source)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::{Coord3, Line3};
    use crate::model::VertexId;
    use uuid::Uuid;

    fn edge(id: u32, source: u32, target: u32, points: &[(f64, f64)]) -> Edge {
        Edge::new(
            EdgeId(id),
            VertexId(source),
            VertexId(target),
            Uuid::new_v4(),
            Line3::new(points.iter().map(|(x, y)| Coord3::new(*x, *y, Some(0.0))).collect()),
        )
    }

    #[test]
    fn near_identical_parallel_edges_collapse() {
        let a = edge(0, 0, 1, &[(0.0, 0.0), (0.01, 0.0)]);
        let b = edge(1, 0, 1, &[(0.0, 0.0000001), (0.01, 0.0000001)]);

        let config = L2Config::default();
        let (survivors, dropped) = dedup_edges(vec![a, b], &config);
        assert_eq!(survivors.len(), 1);
        assert_eq!(dropped.len(), 1);
    }

    #[test]
    fn distinct_endpoint_pairs_both_survive() {
        let a = edge(0, 0, 1, &[(0.0, 0.0), (0.01, 0.0)]);
        let b = edge(1, 2, 3, &[(1.0, 1.0), (1.01, 1.0)]);

        let config = L2Config::default();
        let (survivors, dropped) = dedup_edges(vec![a, b], &config);
        assert_eq!(survivors.len(), 2);
        assert!(dropped.is_empty());
    }

    #[test]
    fn reversed_endpoint_pair_is_still_recognized_as_duplicate() {
        let a = edge(0, 0, 1, &[(0.0, 0.0), (0.01, 0.0)]);
        let b = edge(1, 1, 0, &[(0.01, 0.0000001), (0.0, 0.0000001)]);

        let config = L2Config::default();
        let (survivors, dropped) = dedup_edges(vec![a, b], &config);
        assert_eq!(survivors.len(), 1);
        assert_eq!(dropped.len(), 1);
    }
}
