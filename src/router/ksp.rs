//! k-shortest-paths search. The inner Dijkstra is grounded on
//! `transition::primitives::dijkstra::Dijkstra::reach`'s min-heap shape
//! (a reversed-`Ord` holder over a `BinaryHeap`, parents tracked in an
//! index map); Yen's algorithm is layered on top to produce up to `k`
//! loopless paths in increasing length order, as §4.5.3 requires.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHasher};
#[cfg(feature = "tracing")]
use tracing::Level;

use crate::model::{Edge, EdgeId, VertexId};

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

#[derive(Debug, Clone)]
pub struct Path {
    pub edges: Vec<EdgeId>,
    pub vertices: Vec<VertexId>,
    pub length_m: f64,
}

/// Adjacency built once per subnetwork and reused across every seed's
/// KSP search (§5: "built once per stage and then read-only").
pub struct Adjacency {
    out: FxHashMap<VertexId, Vec<(VertexId, EdgeId, f64)>>,
}

impl Adjacency {
    pub fn build(edges: &[Edge]) -> Self {
        let mut out: FxHashMap<VertexId, Vec<(VertexId, EdgeId, f64)>> = FxHashMap::default();
        for edge in edges {
            let length_m = edge.length_km * 1000.0;
            out.entry(edge.source).or_default().push((edge.target, edge.id, length_m));
            if edge.bidirectional {
                out.entry(edge.target).or_default().push((edge.source, edge.id, length_m));
            }
        }
        Self { out }
    }

    fn neighbors(&self, v: VertexId) -> &[(VertexId, EdgeId, f64)] {
        self.out.get(&v).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// Min-heap entry: `Ord` is reversed against `cost` so `BinaryHeap` (a
/// max-heap) pops the smallest cost first, mirroring
/// `transition::primitives::dijkstra::SmallestHolder`.
struct HeapEntry {
    cost: f64,
    vertex: VertexId,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.partial_cmp(&self.cost).expect("edge lengths are never NaN")
    }
}

/// Single-source shortest path to `target`, skipping any vertex in
/// `banned_vertices` or edge in `banned_edges` (Yen's spur-path removal).
pub fn dijkstra(
    adjacency: &Adjacency,
    source: VertexId,
    target: VertexId,
    banned_vertices: &HashSet<VertexId>,
    banned_edges: &HashSet<EdgeId>,
) -> Option<Path> {
    if banned_vertices.contains(&source) || banned_vertices.contains(&target) {
        return None;
    }

    let mut dist: FxHashMap<VertexId, f64> = FxHashMap::default();
    let mut parent: FxIndexMap<VertexId, (VertexId, EdgeId)> = FxIndexMap::default();
    let mut heap = BinaryHeap::new();

    dist.insert(source, 0.0);
    heap.push(HeapEntry { cost: 0.0, vertex: source });

    while let Some(HeapEntry { cost, vertex }) = heap.pop() {
        if vertex == target {
            break;
        }
        if cost > *dist.get(&vertex).unwrap_or(&f64::INFINITY) {
            continue;
        }

        for &(neighbor, edge_id, weight) in adjacency.neighbors(vertex) {
            if banned_vertices.contains(&neighbor) || banned_edges.contains(&edge_id) {
                continue;
            }
            let next_cost = cost + weight;
            if next_cost < *dist.get(&neighbor).unwrap_or(&f64::INFINITY) {
                dist.insert(neighbor, next_cost);
                parent.insert(neighbor, (vertex, edge_id));
                heap.push(HeapEntry { cost: next_cost, vertex: neighbor });
            }
        }
    }

    if !dist.contains_key(&target) {
        return None;
    }

    let mut edges = Vec::new();
    let mut vertices = vec![target];
    let mut current = target;
    while current != source {
        let &(prev, edge_id) = parent.get(&current)?;
        edges.push(edge_id);
        vertices.push(prev);
        current = prev;
    }
    edges.reverse();
    vertices.reverse();

    Some(Path { edges, vertices, length_m: dist[&target] })
}

/// Visits every vertex reachable from `source` in cost order, grounded
/// directly on `transition::primitives::dijkstra::Dijkstra::reach` —
/// same min-heap/parent-map shape, generalized from "stop at target" to
/// "visit everything" for out-and-back/point-to-point seed search
/// (§4.5.3), which needs the full reachable set to pick a target near a
/// desired one-way distance.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, level = Level::INFO))]
pub fn reach_all(adjacency: &Adjacency, source: VertexId) -> FxHashMap<VertexId, Path> {
    let mut dist: FxHashMap<VertexId, f64> = FxHashMap::default();
    let mut parent: FxIndexMap<VertexId, (VertexId, EdgeId)> = FxIndexMap::default();
    let mut heap = BinaryHeap::new();

    dist.insert(source, 0.0);
    heap.push(HeapEntry { cost: 0.0, vertex: source });

    while let Some(HeapEntry { cost, vertex }) = heap.pop() {
        if cost > *dist.get(&vertex).unwrap_or(&f64::INFINITY) {
            continue;
        }
        for &(neighbor, edge_id, weight) in adjacency.neighbors(vertex) {
            let next_cost = cost + weight;
            if next_cost < *dist.get(&neighbor).unwrap_or(&f64::INFINITY) {
                dist.insert(neighbor, next_cost);
                parent.insert(neighbor, (vertex, edge_id));
                heap.push(HeapEntry { cost: next_cost, vertex: neighbor });
            }
        }
    }

    let mut reachable = FxHashMap::default();
    for (&vertex, &length_m) in &dist {
        let mut edges = Vec::new();
        let mut vertices = vec![vertex];
        let mut current = vertex;
        while current != source {
            let Some(&(prev, edge_id)) = parent.get(&current) else { break };
            edges.push(edge_id);
            vertices.push(prev);
            current = prev;
        }
        edges.reverse();
        vertices.reverse();
        reachable.insert(vertex, Path { edges, vertices, length_m });
    }
    reachable
}

/// Yen's algorithm: up to `k` loopless shortest paths from `source` to
/// `target`, in increasing length order.
#[cfg_attr(feature = "tracing", tracing::instrument(skip(adjacency), level = Level::INFO))]
pub fn k_shortest_paths(adjacency: &Adjacency, source: VertexId, target: VertexId, k: usize) -> Vec<Path> {
    let Some(first) = dijkstra(adjacency, source, target, &HashSet::new(), &HashSet::new()) else {
        return Vec::new();
    };

    let mut found = vec![first];
    let mut candidates: Vec<Path> = Vec::new();

    while found.len() < k {
        let prev = found.last().unwrap().clone();

        for i in 0..prev.vertices.len().saturating_sub(1) {
            let spur_node = prev.vertices[i];
            let root_edges: Vec<EdgeId> = prev.edges[..i].to_vec();
            let root_vertices: Vec<VertexId> = prev.vertices[..=i].to_vec();

            let mut banned_edges: HashSet<EdgeId> = HashSet::new();
            for existing in &found {
                if existing.vertices.len() > i && existing.vertices[..=i] == prev.vertices[..=i] {
                    banned_edges.insert(existing.edges[i]);
                }
            }

            let banned_vertices: HashSet<VertexId> = root_vertices[..i].iter().copied().collect();

            if let Some(spur) = dijkstra(adjacency, spur_node, target, &banned_vertices, &banned_edges) {
                let mut total_edges = root_edges.clone();
                total_edges.extend(spur.edges.clone());
                let mut total_vertices = prev.vertices[..i].to_vec();
                total_vertices.extend(spur.vertices.clone());

                let candidate = Path {
                    length_m: path_length(adjacency, &total_edges),
                    edges: total_edges,
                    vertices: total_vertices,
                };

                if !found.iter().any(|p| p.edges == candidate.edges)
                    && !candidates.iter().any(|p| p.edges == candidate.edges)
                {
                    candidates.push(candidate);
                }
            }
        }

        candidates.sort_by(|a, b| a.length_m.partial_cmp(&b.length_m).unwrap_or(Ordering::Equal));
        let Some(next) = (if candidates.is_empty() { None } else { Some(candidates.remove(0)) }) else { break };
        found.push(next);
    }

    found
}

fn path_length(adjacency: &Adjacency, edges: &[EdgeId]) -> f64 {
    let weights: FxHashMap<EdgeId, f64> = adjacency
        .out
        .values()
        .flatten()
        .map(|&(_, edge_id, weight)| (edge_id, weight))
        .collect();
    edges.iter().filter_map(|e| weights.get(e)).sum()
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use uuid::Uuid;

    use super::*;
    use crate::geo::{Coord3, Line3};
    use crate::model::EdgeId;

    fn edge(id: u32, source: u32, target: u32, length_m: f64) -> Edge {
        let deg = length_m / 111_320.0;
        Edge::new(
            EdgeId(id),
            VertexId(source),
            VertexId(target),
            Uuid::new_v4(),
            Line3::new(vec![Coord3::new(0.0, 0.0, Some(0.0)), Coord3::new(deg, 0.0, Some(0.0))]),
        )
    }

    #[test]
    fn dijkstra_finds_shortest_path_on_a_simple_chain() {
        let edges = vec![edge(0, 0, 1, 100.0), edge(1, 1, 2, 100.0)];
        let adjacency = Adjacency::build(&edges);

        let path = dijkstra(&adjacency, VertexId(0), VertexId(2), &HashSet::new(), &HashSet::new()).unwrap();
        assert_eq!(path.edges, vec![EdgeId(0), EdgeId(1)]);
        assert_relative_eq!(path.length_m, 200.0, epsilon = 1.0);
    }

    #[test]
    fn ksp_returns_alternate_routes_when_available() {
        let edges = vec![
            edge(0, 0, 1, 100.0),
            edge(1, 1, 2, 100.0),
            edge(2, 0, 2, 500.0),
        ];
        let adjacency = Adjacency::build(&edges);

        let paths = k_shortest_paths(&adjacency, VertexId(0), VertexId(2), 2);
        assert_eq!(paths.len(), 2);
        assert!(paths[0].length_m <= paths[1].length_m);
    }

    #[test]
    fn unreachable_target_yields_no_path() {
        let edges = vec![edge(0, 0, 1, 100.0)];
        let adjacency = Adjacency::build(&edges);
        assert!(dijkstra(&adjacency, VertexId(0), VertexId(2), &HashSet::new(), &HashSet::new()).is_none());
    }

    #[test]
    fn reach_all_visits_every_connected_vertex() {
        let edges = vec![edge(0, 0, 1, 100.0), edge(1, 1, 2, 150.0)];
        let adjacency = Adjacency::build(&edges);

        let reachable = reach_all(&adjacency, VertexId(0));
        assert_eq!(reachable.len(), 3);
        assert_relative_eq!(reachable[&VertexId(2)].length_m, 250.0, epsilon = 1.0);
    }
}
