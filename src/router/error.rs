use crate::geo::GeoError;
use crate::impl_err;

/// §4.5 failure modes. `SubnetworkTooLarge`/`KSPExhausted` are normal,
/// per-subnetwork outcomes handled by the caller (counted, not fatal);
/// this enum only carries the genuinely exceptional cases.
#[derive(Debug)]
pub enum RouteError {
    Cancelled,
    Geometry(GeoError),
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteError::Cancelled => write!(f, "route search cancelled"),
            RouteError::Geometry(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RouteError {}

impl From<GeoError> for RouteError {
    fn from(value: GeoError) -> Self {
        RouteError::Geometry(value)
    }
}

impl_err!(RouteError, Route);
