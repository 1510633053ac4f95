use crate::impl_err;

/// Failure modes for the geometry kernel (§4.1). None are recovered
/// locally; they propagate to the caller.
#[derive(Debug)]
pub enum GeoError {
    InvalidGeometry(String),
    DegenerateGeometry(String),
    DimensionMismatch(String),
}

impl std::fmt::Display for GeoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoError::InvalidGeometry(reason) => write!(f, "invalid geometry: {reason}"),
            GeoError::DegenerateGeometry(reason) => write!(f, "degenerate geometry: {reason}"),
            GeoError::DimensionMismatch(reason) => write!(f, "dimension mismatch: {reason}"),
        }
    }
}

impl std::error::Error for GeoError {}

impl_err!(GeoError, Geometry);
