//! Geometry kernel (§4.1): 2D/3D polyline primitives, predicates, and a
//! spatial index. Every other component treats this module as a black
//! box for tolerance handling and coordinate dimensionality.

pub mod error;
pub mod index;
pub mod line;
pub mod predicates;

pub use error::GeoError;
pub use index::{IndexedEnvelope, SpatialIndex};
pub use line::{grid_snap, haversine_meters, Coord3, Line3};
pub use predicates::{Intersection, dwithin, hausdorff_distance_meters, intersection, intersects};
