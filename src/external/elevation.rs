//! §6: "Elevation provider (read-only): `elevation(lng, lat) -> meters |
//! missing`. Used by L1 to populate 3D geometry and stats."

/// A read-only elevation lookup. The raster/DEM backend that implements
/// this is out of scope (§1); L1 only depends on this trait boundary.
pub trait ElevationProvider: Send + Sync {
    /// Returns the elevation in meters at `(lng, lat)`, or `None` if the
    /// provider has no data for that location.
    fn elevation(&self, lng: f64, lat: f64) -> Option<f64>;
}

/// An `ElevationProvider` that never has data — used where no provider is
/// configured; §9 Open Question: the caller decides whether that's fatal
/// (`require_elevation = true`) or proceeds with 2D geometry.
pub struct NoElevationProvider;

impl ElevationProvider for NoElevationProvider {
    fn elevation(&self, _lng: f64, _lat: f64) -> Option<f64> {
        None
    }
}
