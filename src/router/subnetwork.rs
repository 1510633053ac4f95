//! §4.5.2: subnetwork scheduling.

use petgraph::graphmap::UnGraphMap;

use crate::config::L3Config;
use crate::model::{Edge, Vertex, VertexId};

/// One connected component of the routable graph, isolated so its search
/// structures can be built and released independently (§4.5.1/§5).
pub struct Subnetwork {
    pub vertices: Vec<VertexId>,
    pub edges: Vec<Edge>,
}

/// Partitions the graph into connected components, skipping any whose
/// vertex count falls outside `[min_subnetwork_size, max_subnetwork_size]`.
/// Skipped components are logged with a reason, not treated as errors.
pub fn schedule(vertices: &[Vertex], edges: &[Edge], config: &L3Config) -> (Vec<Subnetwork>, Vec<(usize, String)>) {
    let mut graph: UnGraphMap<VertexId, usize> = UnGraphMap::new();
    for vertex in vertices {
        graph.add_node(vertex.id);
    }
    for (index, edge) in edges.iter().enumerate() {
        graph.add_edge(edge.source, edge.target, index);
    }

    let mut labels: std::collections::HashMap<VertexId, usize> = std::collections::HashMap::new();
    let mut next_label = 0usize;
    for &node in graph.nodes().collect::<Vec<_>>().iter() {
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

    let mut by_label: std::collections::HashMap<usize, Vec<VertexId>> = std::collections::HashMap::new();
    for (&vid, &label) in &labels {
        by_label.entry(label).or_default().push(vid);
    }

    let mut subnetworks = Vec::new();
    let mut skipped = Vec::new();

    for (label, component_vertices) in by_label {
        let size = component_vertices.len();
        if size < config.min_subnetwork_size {
            skipped.push((label, format!("{size} nodes below min_subnetwork_size ({})", config.min_subnetwork_size)));
            continue;
        }
        if size > config.max_subnetwork_size {
            skipped.push((label, format!("{size} nodes above max_subnetwork_size ({})", config.max_subnetwork_size)));
            continue;
        }

        let member: std::collections::HashSet<VertexId> = component_vertices.iter().copied().collect();
        let component_edges: Vec<Edge> =
            edges.iter().filter(|e| member.contains(&e.source) && member.contains(&e.target)).cloned().collect();

        subnetworks.push(Subnetwork { vertices: component_vertices, edges: component_edges });
    }

    (subnetworks, skipped)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::{Coord3, Line3};
    use crate::model::{EdgeId, VertexId};
    use uuid::Uuid;

    fn vertex(id: u32) -> Vertex {
        Vertex::new(VertexId(id), Coord3::new(id as f64, 0.0, Some(0.0)))
    }

    fn edge(id: u32, source: u32, target: u32) -> Edge {
        Edge::new(
            EdgeId(id),
            VertexId(source),
            VertexId(target),
            Uuid::new_v4(),
            Line3::new(vec![Coord3::new(source as f64, 0.0, Some(0.0)), Coord3::new(target as f64, 0.0, Some(0.0))]),
        )
    }

    #[test]
    fn separates_and_filters_components_by_size() {
        let vertices = vec![vertex(0), vertex(1), vertex(2), vertex(3), vertex(4)];
        let edges = vec![edge(0, 0, 1), edge(1, 1, 2)];

        let mut config = L3Config::default();
        config.min_subnetwork_size = 2;
        config.max_subnetwork_size = 100;

        let (subnetworks, skipped) = schedule(&vertices, &edges, &config);
        assert_eq!(subnetworks.len(), 1);
        assert_eq!(subnetworks[0].vertices.len(), 3);
        assert_eq!(skipped.len(), 2);
    }
}
