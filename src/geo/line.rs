//! The 2D/3D line-string primitive and the operation contracts of §4.1.
//!
//! Every spatial operation in the pipeline routes through `Line3` so that
//! tolerance handling and dimensionality are uniform; nothing reaches
//! directly into `geo::LineString` arithmetic from L1/L2/L3.

use geo::algorithm::ClosestPoint;
use geo::{Closest, Coord, Distance, Geodesic, Length, LineLocatePoint, LineString, Point};
use serde::{Deserialize, Serialize};

use crate::geo::GeoError;

/// A single 3D vertex of a trail: WGS84 longitude/latitude with an
/// optional elevation in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord3 {
    pub lng: f64,
    pub lat: f64,
    pub elevation: Option<f64>,
}

impl Coord3 {
    pub fn new(lng: f64, lat: f64, elevation: Option<f64>) -> Self {
        Self { lng, lat, elevation }
    }

    #[inline]
    pub fn point(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

impl From<Coord3> for Coord<f64> {
    fn from(value: Coord3) -> Self {
        Coord { x: value.lng, y: value.lat }
    }
}

/// An ordered 3D polyline. Construction does not itself enforce the
/// "≥2 points" invariant of §3 — callers validate with [`Line3::is_valid`]
/// before trusting a `Line3` as a `Trail::geometry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line3 {
    points: Vec<Coord3>,
}

impl Line3 {
    pub fn new(points: Vec<Coord3>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Coord3] {
        &self.points
    }

    /// `make_line(points)` — constructs a 3D line from vertex positions.
    pub fn make_line(points: Vec<Coord3>) -> Self {
        Self::new(points)
    }

    /// `npoints(line)` — integer count; ≥2 for any valid line.
    pub fn npoints(&self) -> usize {
        self.points.len()
    }

    /// `start_point(line)`.
    pub fn start_point(&self) -> Option<Coord3> {
        self.points.first().copied()
    }

    /// `end_point(line)`.
    pub fn end_point(&self) -> Option<Coord3> {
        self.points.last().copied()
    }

    /// `dump_points(line)` — the ordered vertex sequence.
    pub fn dump_points(&self) -> &[Coord3] {
        &self.points
    }

    /// True iff `start_point == end_point` within `epsilon` meters —
    /// used by the loop pre-splitter (§4.3.5).
    pub fn is_loop(&self, epsilon_m: f64) -> bool {
        match (self.start_point(), self.end_point()) {
            (Some(a), Some(b)) => haversine_meters(a, b) <= epsilon_m,
            _ => false,
        }
    }

    /// `is_valid(line)` — true iff no repeated consecutive points and no
    /// segment self-intersections after snapping.
    pub fn is_valid(&self) -> bool {
        if self.points.len() < 2 {
            return false;
        }
        if self
            .points
            .windows(2)
            .any(|pair| pair[0].lng == pair[1].lng && pair[0].lat == pair[1].lat)
        {
            return false;
        }
        !self.self_intersects()
    }

    fn self_intersects(&self) -> bool {
        let segments: Vec<(Coord<f64>, Coord<f64>)> = self
            .points
            .windows(2)
            .map(|pair| (pair[0].into(), pair[1].into()))
            .collect();

        for i in 0..segments.len() {
            for j in (i + 2)..segments.len() {
                // Adjacent segments sharing an endpoint are not self-intersections.
                if i == 0 && j == segments.len() - 1 {
                    continue;
                }
                if segments_cross(segments[i], segments[j]) {
                    return true;
                }
            }
        }
        false
    }

    /// `length_meters(line)` — geodesic length on the WGS84 spheroid.
    pub fn length_meters(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.as_linestring_2d().length::<Geodesic>()
    }

    /// `envelope(line)` — axis-aligned bbox `(min_lng,min_lat,max_lng,max_lat)`.
    pub fn envelope(&self) -> Result<(f64, f64, f64, f64), GeoError> {
        if self.points.is_empty() {
            return Err(GeoError::DegenerateGeometry("empty line has no envelope".into()));
        }
        let (mut min_lng, mut min_lat) = (f64::INFINITY, f64::INFINITY);
        let (mut max_lng, mut max_lat) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &self.points {
            min_lng = min_lng.min(p.lng);
            min_lat = min_lat.min(p.lat);
            max_lng = max_lng.max(p.lng);
            max_lat = max_lat.max(p.lat);
        }
        Ok((min_lng, min_lat, max_lng, max_lat))
    }

    /// `force_2d(line)` — projection dropping elevation.
    pub fn force_2d(&self) -> Self {
        Self::new(
            self.points
                .iter()
                .map(|p| Coord3::new(p.lng, p.lat, None))
                .collect(),
        )
    }

    /// `force_3d(line, default_z)` — elevation interpolated linearly for
    /// any point currently missing it; points with no neighbour bearing
    /// elevation fall back to `default_z`.
    pub fn force_3d(&self, default_z: f64) -> Self {
        let mut out = self.points.clone();
        let n = out.len();

        for i in 0..n {
            if out[i].elevation.is_some() {
                continue;
            }

            let before = out[..i].iter().rev().find_map(|p| p.elevation.map(|z| (p, z)));
            let after = out[i + 1..].iter().find_map(|p| p.elevation.map(|z| (p, z)));

            out[i].elevation = Some(match (before, after) {
                (Some((_, z1)), Some((_, z2))) => (z1 + z2) / 2.0,
                (Some((_, z)), None) | (None, Some((_, z))) => z,
                (None, None) => default_z,
            });
        }
        Self::new(out)
    }

    /// `segmentize(line, max_spacing_m)` — densified copy with no segment
    /// longer than `max_spacing_m`.
    pub fn segmentize(&self, max_spacing_m: f64) -> Self {
        if self.points.len() < 2 || max_spacing_m <= 0.0 {
            return self.clone();
        }

        let mut out = Vec::with_capacity(self.points.len());
        out.push(self.points[0]);

        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let dist = haversine_meters(a, b);
            let steps = (dist / max_spacing_m).ceil().max(1.0) as usize;

            for step in 1..=steps {
                let t = step as f64 / steps as f64;
                out.push(interpolate(a, b, t));
            }
        }
        Self::new(out)
    }

    /// `simplify(line, tol_deg, min_pts)` — Douglas-Peucker style, no-op
    /// if `npoints(line) < min_pts`.
    pub fn simplify(&self, tol_deg: f64, min_pts: usize) -> Self {
        if self.points.len() < min_pts || self.points.len() < 3 {
            return self.clone();
        }
        let kept = douglas_peucker(&self.points, tol_deg);
        Self::new(kept)
    }

    /// `line_locate(line, point)` — normalized 0..1 position of the
    /// closest projection of `point` onto the line.
    pub fn line_locate(&self, point: Coord3) -> Option<f64> {
        let line = self.as_linestring_2d();
        line.line_locate_point(&point.point())
    }

    /// `split(line, point)` — deterministic split at the closest
    /// projection; fails if the point is within `endpoint_epsilon` of an
    /// endpoint.
    pub fn split(&self, point: Coord3, endpoint_epsilon: f64) -> Result<(Self, Self), GeoError> {
        let frac = self
            .line_locate(point)
            .ok_or_else(|| GeoError::InvalidGeometry("point does not project onto line".into()))?;

        if frac < endpoint_epsilon || frac > 1.0 - endpoint_epsilon {
            return Err(GeoError::DegenerateGeometry(
                "split point within endpoint_epsilon of an endpoint".into(),
            ));
        }

        let total = self.length_meters();
        let target = total * frac;

        let mut acc = 0.0;
        let mut head = vec![self.points[0]];
        let mut tail = Vec::new();
        let mut inserted = false;

        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let seg_len = haversine_meters(a, b);

            if !inserted && acc + seg_len >= target {
                let local_t = if seg_len > 0.0 { (target - acc) / seg_len } else { 0.0 };
                let split_point = interpolate(a, b, local_t.clamp(0.0, 1.0));
                head.push(split_point);
                tail.push(split_point);
                tail.push(b);
                inserted = true;
            } else if inserted {
                tail.push(b);
            } else {
                head.push(b);
            }
            acc += seg_len;
        }

        if !inserted {
            return Err(GeoError::InvalidGeometry("split target exceeds line length".into()));
        }

        let head_line = Self::new(head);
        let tail_line = Self::new(tail);

        if head_line.length_meters() <= 0.0 || tail_line.length_meters() <= 0.0 {
            return Err(GeoError::DegenerateGeometry("split yields a zero-length segment".into()));
        }

        Ok((head_line, tail_line))
    }

    /// Nearest point on this line (2D) to an arbitrary query point, in
    /// geodesic meters — used by dedup's overlap-fraction check (§4.3.2).
    pub(crate) fn distance_to_point_meters(&self, query: Coord3) -> f64 {
        let line = self.as_linestring_2d();
        match line.closest_point(&query.point()) {
            Closest::Intersection(p) | Closest::SinglePoint(p) => Geodesic.distance(p, query.point()),
            Closest::Indeterminate => f64::INFINITY,
        }
    }

    /// Concatenates `self` with `other`, dropping `other`'s first point
    /// (assumed coincident with `self`'s last). Used to stitch continuous
    /// chains back together (§4.3.4 split-merge, §4.4.3 chain merging).
    pub(crate) fn concat(&self, other: &Line3) -> Line3 {
        let mut points = self.points.clone();
        points.extend_from_slice(&other.points[1..]);
        Line3::new(points)
    }

    /// Endpoint-reversed copy — used to orient a chain's constituent
    /// edges consistently before concatenation.
    pub(crate) fn reversed(&self) -> Line3 {
        let mut points = self.points.clone();
        points.reverse();
        Line3::new(points)
    }

    pub(crate) fn as_linestring_2d(&self) -> LineString<f64> {
        LineString::from(
            self.points
                .iter()
                .map(|p| Coord { x: p.lng, y: p.lat })
                .collect::<Vec<_>>(),
        )
    }
}

/// Snaps `point` to the nearest node of a local-meter grid at
/// `resolution_m`, used wherever a deterministic merge key is needed for
/// near-coincident positions (§4.3.4 step 3, §4.4.1 vertex merging).
pub fn grid_snap(point: Coord3, resolution_m: f64) -> Coord3 {
    let deg_per_m_lat = 1.0 / 110_574.0;
    let deg_per_m_lng = 1.0 / (111_320.0 * point.lat.to_radians().cos().abs().max(1e-6));
    let res_lat = resolution_m * deg_per_m_lat;
    let res_lng = resolution_m * deg_per_m_lng;
    let lng = (point.lng / res_lng).round() * res_lng;
    let lat = (point.lat / res_lat).round() * res_lat;
    Coord3::new(lng, lat, point.elevation)
}

fn interpolate(a: Coord3, b: Coord3, t: f64) -> Coord3 {
    let lng = a.lng + (b.lng - a.lng) * t;
    let lat = a.lat + (b.lat - a.lat) * t;
    let elevation = match (a.elevation, b.elevation) {
        (Some(za), Some(zb)) => Some(za + (zb - za) * t),
        (Some(z), None) | (None, Some(z)) => Some(z),
        (None, None) => None,
    };
    Coord3::new(lng, lat, elevation)
}

/// Geodesic point-to-point distance in meters, matching `aaru`'s use of
/// `Geodesic.distance` in `src/graph/traits/proximity/implementation.rs`.
pub fn haversine_meters(a: Coord3, b: Coord3) -> f64 {
    Geodesic.distance(a.point(), b.point())
}

fn segments_cross(a: (Coord<f64>, Coord<f64>), b: (Coord<f64>, Coord<f64>)) -> bool {
    fn cross(o: Coord<f64>, p: Coord<f64>, q: Coord<f64>) -> f64 {
        (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x)
    }
    fn on_segment(p: Coord<f64>, q: Coord<f64>, r: Coord<f64>) -> bool {
        r.x <= p.x.max(q.x) && r.x >= p.x.min(q.x) && r.y <= p.y.max(q.y) && r.y >= p.y.min(q.y)
    }

    let (p1, q1) = a;
    let (p2, q2) = b;

    let d1 = cross(p2, q2, p1);
    let d2 = cross(p2, q2, q1);
    let d3 = cross(p1, q1, p2);
    let d4 = cross(p1, q1, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(p2, q2, p1))
        || (d2 == 0.0 && on_segment(p2, q2, q1))
        || (d3 == 0.0 && on_segment(p1, q1, p2))
        || (d4 == 0.0 && on_segment(p1, q1, q2))
}

fn douglas_peucker(points: &[Coord3], tol_deg: f64) -> Vec<Coord3> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let (first, last) = (points[0], points[points.len() - 1]);
    let mut max_dist = 0.0_f64;
    let mut max_idx = 0;

    for (i, p) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let dist = perpendicular_distance_deg(*p, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_idx = i;
        }
    }

    if max_dist > tol_deg {
        let mut left = douglas_peucker(&points[..=max_idx], tol_deg);
        let right = douglas_peucker(&points[max_idx..], tol_deg);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

fn perpendicular_distance_deg(p: Coord3, a: Coord3, b: Coord3) -> f64 {
    let (dx, dy) = (b.lng - a.lng, b.lat - a.lat);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return ((p.lng - a.lng).powi(2) + (p.lat - a.lat).powi(2)).sqrt();
    }
    ((dy * p.lng - dx * p.lat + b.lng * a.lat - b.lat * a.lng) / len).abs()
}
