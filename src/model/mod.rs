//! The data model of §3.

pub mod edge;
pub mod pattern;
pub mod recommendation;
pub mod tags;
pub mod trail;
pub mod vertex;

pub use edge::{Edge, EdgeId};
pub use pattern::{RoutePattern, Shape};
pub use recommendation::{RouteMetrics, RouteRecommendation};
pub use tags::{Difficulty, ExtraTags, Surface, TrailType};
pub use trail::{BBox, ElevationStats, Trail};
pub use vertex::{Vertex, VertexId, VertexKind};
