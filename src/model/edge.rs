use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Line3;
use crate::model::vertex::VertexId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

/// §3 Edge (L2): a routable segment connecting two vertices, derived
/// from one conditioned trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: VertexId,
    pub target: VertexId,
    pub trail_uuid: Uuid,
    pub geometry: Line3,
    pub length_km: f64,
    pub gain: f64,
    pub loss: f64,
    pub bidirectional: bool,
}

impl Edge {
    pub fn new(
        id: EdgeId,
        source: VertexId,
        target: VertexId,
        trail_uuid: Uuid,
        geometry: Line3,
    ) -> Self {
        let length_km = geometry.length_meters() / 1000.0;
        let (gain, loss) = gain_loss(&geometry);
        Self { id, source, target, trail_uuid, geometry, length_km, gain, loss, bidirectional: true }
    }

    /// §4.4.2 self-loop rejection: an edge whose source equals its
    /// target is invalid unless produced by the loop pre-splitter.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

pub(crate) fn gain_loss(line: &Line3) -> (f64, f64) {
    let mut gain = 0.0;
    let mut loss = 0.0;
    for pair in line.points().windows(2) {
        if let (Some(a), Some(b)) = (pair[0].elevation, pair[1].elevation) {
            let delta = b - a;
            if delta > 0.0 {
                gain += delta;
            } else {
                loss += -delta;
            }
        }
    }
    (gain, loss)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::Coord3;

    #[test]
    fn self_loop_edges_are_flagged() {
        let line = Line3::new(vec![
            Coord3::new(0.0, 0.0, Some(0.0)),
            Coord3::new(0.0, 0.001, Some(0.0)),
            Coord3::new(0.0, 0.0, Some(0.0)),
        ]);
        let edge = Edge::new(EdgeId(0), VertexId(1), VertexId(1), Uuid::new_v4(), line);
        assert!(edge.is_self_loop());
    }

    #[test]
    fn gain_and_loss_sum_from_elevation_profile() {
        let line = Line3::new(vec![
            Coord3::new(0.0, 0.0, Some(0.0)),
            Coord3::new(0.0, 0.001, Some(10.0)),
            Coord3::new(0.0, 0.002, Some(4.0)),
        ]);
        let edge = Edge::new(EdgeId(0), VertexId(1), VertexId(2), Uuid::new_v4(), line);
        assert_eq!(edge.gain, 10.0);
        assert_eq!(edge.loss, 6.0);
    }
}
