use crate::geo::GeoError;
use crate::impl_err;

/// §4.4 failure modes. `DanglingEndpoint` is per-edge (rejected and
/// counted); `GraphInconsistent` is fatal for the current run.
#[derive(Debug)]
pub enum AssembleError {
    DanglingEndpoint,
    GraphInconsistent(String),
    Geometry(GeoError),
}

impl std::fmt::Display for AssembleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssembleError::DanglingEndpoint => write!(f, "no vertex found within tolerance"),
            AssembleError::GraphInconsistent(reason) => write!(f, "graph inconsistent: {reason}"),
            AssembleError::Geometry(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AssembleError {}

impl From<GeoError> for AssembleError {
    fn from(value: GeoError) -> Self {
        AssembleError::Geometry(value)
    }
}

impl_err!(AssembleError, Assemble);
