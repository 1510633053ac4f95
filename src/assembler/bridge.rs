//! §4.4.5: bridging disconnected components.

use petgraph::graphmap::UnGraphMap;

use crate::config::L2Config;
use crate::geo::{haversine_meters, Line3};
use crate::model::{Edge, EdgeId, Vertex, VertexId};

/// For every pair of vertices in distinct connected components within
/// `edge_bridging_tolerance_m`, synthesizes a straight connector edge (up
/// to `short_connector_max_length_m`). Best-effort: a network with
/// multiple components after this pass is still valid output.
pub fn bridge_components(mut edges: Vec<Edge>, vertices: &[Vertex], config: &L2Config) -> Vec<Edge> {
    let mut next_id = edges.iter().map(|e| e.id.0).max().map(|m| m + 1).unwrap_or(0);

    loop {
        let components = component_of(vertices, &edges);
        let candidate = nearest_cross_component_pair(vertices, &components, config.edge_bridging_tolerance_m);

        let Some((a, b, distance_m)) = candidate else { break };
        if distance_m > config.short_connector_max_length_m {
            break;
        }

        let (pos_a, pos_b) = (
            vertices.iter().find(|v| v.id == a).unwrap().position,
            vertices.iter().find(|v| v.id == b).unwrap().position,
        );
        let geometry = Line3::new(vec![pos_a, pos_b]);
        let trail_uuid = uuid::Uuid::new_v4();
        let mut connector = Edge::new(EdgeId(next_id), a, b, trail_uuid, geometry);
        connector.bidirectional = true;
        next_id += 1;
        edges.push(connector);
    }

    edges
}

fn component_of(vertices: &[Vertex], edges: &[Edge]) -> std::collections::HashMap<VertexId, usize> {
    let mut graph: UnGraphMap<VertexId, ()> = UnGraphMap::new();
    for vertex in vertices {
        graph.add_node(vertex.id);
    }
    for edge in edges {
        graph.add_edge(edge.source, edge.target, ());
    }

    let mut labels = std::collections::HashMap::new();
    let mut next_label = 0usize;
    let nodes: Vec<VertexId> = graph.nodes().collect();
    for node in nodes {
        if labels.contains_key(&node) {
            continue;
        }
        let mut stack = vec![node];
        labels.insert(node, next_label);
        while let Some(current) = stack.pop() {
            for neighbor in graph.neighbors(current) {
                if labels.contains_key(&neighbor) {
                    continue;
                }
                labels.insert(neighbor, next_label);
                stack.push(neighbor);
            }
        }
        next_label += 1;
    }
    labels
}

/// Finds the closest pair of vertices that belong to different
/// components, if any lie within `tolerance_m`.
fn nearest_cross_component_pair(
    vertices: &[Vertex],
    components: &std::collections::HashMap<VertexId, usize>,
    tolerance_m: f64,
) -> Option<(VertexId, VertexId, f64)> {
    let mut best: Option<(VertexId, VertexId, f64)> = None;

    for i in 0..vertices.len() {
        for j in (i + 1)..vertices.len() {
            let (vi, vj) = (&vertices[i], &vertices[j]);
            if components.get(&vi.id) == components.get(&vj.id) {
                continue;
            }
            let distance_m = haversine_meters(vi.position, vj.position);
            if distance_m > tolerance_m {
                continue;
            }
            if best.map(|(_, _, best_d)| distance_m < best_d).unwrap_or(true) {
                best = Some((vi.id, vj.id, distance_m));
            }
        }
    }

    best
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::Coord3;
    use uuid::Uuid;

    fn vertex(id: u32, lng: f64, lat: f64) -> Vertex {
        Vertex::new(VertexId(id), Coord3::new(lng, lat, Some(0.0)))
    }

    #[test]
    fn bridges_two_nearby_components() {
        let vertices = vec![vertex(0, 0.0, 0.0), vertex(1, 0.0001, 0.0001)];
        let edges: Vec<Edge> = Vec::new();

        let mut config = L2Config::default();
        config.edge_bridging_tolerance_m = 50.0;
        config.short_connector_max_length_m = 50.0;

        let bridged = bridge_components(edges, &vertices, &config);
        assert_eq!(bridged.len(), 1);
        assert!(
            (bridged[0].source == VertexId(0) && bridged[0].target == VertexId(1))
                || (bridged[0].source == VertexId(1) && bridged[0].target == VertexId(0))
        );
    }

    #[test]
    fn distant_components_are_left_unbridged() {
        let vertices = vec![vertex(0, 0.0, 0.0), vertex(1, 10.0, 10.0)];
        let edges: Vec<Edge> = Vec::new();

        let config = L2Config::default();
        let bridged = bridge_components(edges, &vertices, &config);
        assert!(bridged.is_empty());
    }

    #[test]
    fn already_connected_vertices_are_not_bridged_again() {
        let vertices = vec![vertex(0, 0.0, 0.0), vertex(1, 0.0001, 0.0001)];
        let edges = vec![Edge::new(
            EdgeId(0),
            VertexId(0),
            VertexId(1),
            Uuid::new_v4(),
            Line3::new(vec![Coord3::new(0.0, 0.0, Some(0.0)), Coord3::new(0.0001, 0.0001, Some(0.0))]),
        )];

        let config = L2Config::default();
        let bridged = bridge_components(edges, &vertices, &config);
        assert_eq!(bridged.len(), 1);
    }
}
