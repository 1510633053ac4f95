use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::{GeoError, Line3};
use crate::model::tags::{Difficulty, ExtraTags, Surface, TrailType};

/// `gain`/`loss` in meters, `min`/`avg`/`max` elevation in meters. §3:
/// `min ≤ avg ≤ max`, `gain, loss ≥ 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationStats {
    pub gain: f64,
    pub loss: f64,
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl ElevationStats {
    /// Derives elevation stats from a 3D line's elevation samples.
    /// Returns `None` if any sample lacks elevation.
    pub fn from_geometry(line: &Line3) -> Option<Self> {
        let elevations: Vec<f64> = line.points().iter().map(|p| p.elevation).collect::<Option<Vec<_>>>()?;
        if elevations.is_empty() {
            return None;
        }

        let mut gain = 0.0;
        let mut loss = 0.0;
        for pair in elevations.windows(2) {
            let delta = pair[1] - pair[0];
            if delta > 0.0 {
                gain += delta;
            } else {
                loss += -delta;
            }
        }

        let min = elevations.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = elevations.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let avg = elevations.iter().sum::<f64>() / elevations.len() as f64;

        Some(Self { gain, loss, min, avg, max })
    }

    pub fn is_consistent(&self) -> bool {
        self.gain >= 0.0 && self.loss >= 0.0 && self.min <= self.avg && self.avg <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BBox {
    pub fn is_valid(&self) -> bool {
        self.min_lng < self.max_lng && self.min_lat < self.max_lat
    }
}

/// §3 Trail: the raw/conditioned unit of the network before L2 assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trail {
    pub uuid: Uuid,
    pub source_id: Option<String>,
    pub name: Option<String>,
    pub region: String,
    pub geometry: Line3,
    pub length_km: f64,
    pub elevation: Option<ElevationStats>,
    pub bbox: BBox,
    pub parent_uuid: Option<Uuid>,
    pub surface: Option<Surface>,
    pub trail_type: Option<TrailType>,
    pub difficulty: Option<Difficulty>,
    pub synthetic: bool,
    pub tags: ExtraTags,
}

impl Trail {
    /// Constructs a `Trail`, recomputing bbox/length/elevation from
    /// `geometry` per §3's invariant: "if geometry is set, bbox and
    /// length are recomputed; if geometry is 3D the elevation stats
    /// must be derivable from it."
    pub fn new(
        region: impl Into<String>,
        geometry: Line3,
        source_id: Option<String>,
        name: Option<String>,
    ) -> Result<Self, GeoError> {
        if !geometry.is_valid() {
            return Err(GeoError::InvalidGeometry("trail geometry failed validation".into()));
        }

        let (min_lng, min_lat, max_lng, max_lat) = geometry.envelope()?;
        let bbox = BBox { min_lng, min_lat, max_lng, max_lat };
        let length_km = geometry.length_meters() / 1000.0;

        if length_km <= 0.0 {
            return Err(GeoError::DegenerateGeometry("zero-length trail".into()));
        }

        let elevation = ElevationStats::from_geometry(&geometry);

        Ok(Self {
            uuid: Uuid::new_v4(),
            source_id,
            name,
            region: region.into(),
            geometry,
            length_km,
            elevation,
            bbox,
            parent_uuid: None,
            surface: None,
            trail_type: None,
            difficulty: None,
            synthetic: false,
            tags: ExtraTags::default(),
        })
    }

    /// Recomputes bbox/length/elevation after `geometry` changes (L1
    /// splitting, bridging). Keeps identity and attributes.
    pub fn recompute_from_geometry(&mut self) -> Result<(), GeoError> {
        let (min_lng, min_lat, max_lng, max_lat) = self.geometry.envelope()?;
        self.bbox = BBox { min_lng, min_lat, max_lng, max_lat };
        self.length_km = self.geometry.length_meters() / 1000.0;
        self.elevation = ElevationStats::from_geometry(&self.geometry);
        Ok(())
    }

    /// A child produced by splitting `self` at a point (§4.3.4): a new
    /// identity, `parent_uuid` set, attributes copied.
    pub fn split_child(&self, geometry: Line3) -> Result<Self, GeoError> {
        let mut child = self.clone();
        child.uuid = Uuid::new_v4();
        child.parent_uuid = Some(self.uuid);
        child.geometry = geometry;
        child.recompute_from_geometry()?;
        Ok(child)
    }

    pub fn is_valid(&self) -> bool {
        self.geometry.is_valid() && self.length_km > 0.0 && self.bbox.is_valid()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::Coord3;

    fn simple_line() -> Line3 {
        Line3::new(vec![
            Coord3::new(0.0, 0.0, Some(0.0)),
            Coord3::new(0.0, 0.01, Some(10.0)),
        ])
    }

    #[test]
    fn new_trail_autofills_bbox_and_length() {
        let trail = Trail::new("test-region", simple_line(), None, None).expect("valid trail");
        assert!(trail.bbox.is_valid());
        assert!(trail.length_km > 0.0);
        assert_eq!(trail.elevation.unwrap().gain, 10.0);
    }

    #[test]
    fn split_child_gets_new_identity_and_parent_lineage() {
        let trail = Trail::new("test-region", simple_line(), None, None).unwrap();
        let child = trail.split_child(simple_line()).unwrap();
        assert_ne!(child.uuid, trail.uuid);
        assert_eq!(child.parent_uuid, Some(trail.uuid));
    }

    #[test]
    fn degenerate_geometry_is_rejected() {
        let zero_length = Line3::new(vec![
            Coord3::new(0.0, 0.0, Some(0.0)),
            Coord3::new(0.0, 0.0, Some(0.0)),
        ]);
        assert!(Trail::new("r", zero_length, None, None).is_err());
    }
}
