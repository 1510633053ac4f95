//! 2D predicates over [`Line3`](crate::geo::Line3), per the §4.1 contract
//! table: `intersects`, `dwithin`, `intersection`.

use geo::{Distance, Geodesic, Intersects, LineString};

use crate::geo::line::{Coord3, Line3};

/// `intersects(a,b)` — true iff the 2D projections of `a` and `b` share
/// at least one point.
pub fn intersects(a: &Line3, b: &Line3) -> bool {
    a.as_linestring_2d().intersects(&b.as_linestring_2d())
}

/// `dwithin(a,b,d)` — true iff any point of `a` lies within `d` geodesic
/// meters of any point of `b`.
pub fn dwithin(a: &Line3, b: &Line3, d: f64) -> bool {
    for pa in a.points() {
        for pb in b.points() {
            if Geodesic.distance(pa.point(), pb.point()) <= d {
                return true;
            }
        }
    }
    false
}

/// An intersection result: a set of crossing points, or — for
/// overlapping collinear runs — the shared endpoints treated as multiple
/// point intersections (§4.3 edge policy: "overlaps are treated as
/// multiple points at shared endpoints").
#[derive(Debug, Clone, PartialEq)]
pub enum Intersection {
    Points(Vec<Coord3>),
    None,
}

/// `intersection(a,b)` — returns the crossing points between two lines'
/// 2D projections, interpolating elevation from the owning line at the
/// crossing fraction.
pub fn intersection(a: &Line3, b: &Line3) -> Intersection {
    let mut points = Vec::new();

    let segs_a: Vec<(Coord3, Coord3)> = a.points().windows(2).map(|p| (p[0], p[1])).collect();
    let segs_b: Vec<(Coord3, Coord3)> = b.points().windows(2).map(|p| (p[0], p[1])).collect();

    for &(a1, a2) in &segs_a {
        for &(b1, b2) in &segs_b {
            if let Some(point) = segment_intersection(a1, a2, b1, b2) {
                points.push(point);
            }
        }
    }

    // Shared endpoints count as intersections even when collinear runs
    // overlap rather than cross transversally.
    for &ea in &[a.start_point(), a.end_point()] {
        for &eb in &[b.start_point(), b.end_point()] {
            if let (Some(ea), Some(eb)) = (ea, eb) {
                if Geodesic.distance(ea.point(), eb.point()) < 1e-6 {
                    points.push(ea);
                }
            }
        }
    }

    dedup_close(&mut points);

    if points.is_empty() {
        Intersection::None
    } else {
        Intersection::Points(points)
    }
}

fn dedup_close(points: &mut Vec<Coord3>) {
    let mut kept: Vec<Coord3> = Vec::new();
    for p in points.drain(..) {
        if !kept.iter().any(|k| Geodesic.distance(k.point(), p.point()) < 1e-6) {
            kept.push(p);
        }
    }
    *points = kept;
}

fn segment_intersection(a1: Coord3, a2: Coord3, b1: Coord3, b2: Coord3) -> Option<Coord3> {
    let (x1, y1, x2, y2) = (a1.lng, a1.lat, a2.lng, a2.lat);
    let (x3, y3, x4, y4) = (b1.lng, b1.lat, b2.lng, b2.lat);

    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom.abs() < 1e-15 {
        return None;
    }

    let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / denom;
    let u = ((x1 - x3) * (y1 - y2) - (y1 - y3) * (x1 - x2)) / denom;

    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }

    let lng = x1 + t * (x2 - x1);
    let lat = y1 + t * (y2 - y1);
    let elevation = match (a1.elevation, a2.elevation) {
        (Some(z1), Some(z2)) => Some(z1 + t * (z2 - z1)),
        _ => None,
    };

    Some(Coord3::new(lng, lat, elevation))
}

/// Hausdorff distance between two lines' 2D projections, in geodesic
/// meters — used by L1 dedup (§4.3.2) and L2 overlap dedup (§4.4.4).
pub fn hausdorff_distance_meters(a: &Line3, b: &Line3) -> f64 {
    fn directed(from: &LineString<f64>, to: &LineString<f64>) -> f64 {
        from.points()
            .map(|p| {
                to.points()
                    .map(|q| Geodesic.distance(p, q))
                    .fold(f64::INFINITY, f64::min)
            })
            .fold(0.0_f64, f64::max)
    }

    let la = a.as_linestring_2d();
    let lb = b.as_linestring_2d();
    directed(&la, &lb).max(directed(&lb, &la))
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    fn line(coords: &[(f64, f64)]) -> Line3 {
        Line3::new(coords.iter().map(|(x, y)| Coord3::new(*x, *y, Some(0.0))).collect())
    }

    #[test]
    fn t_intersection_single_point() {
        let a = line(&[(0.0, 0.0), (2.0, 0.0)]);
        let b = line(&[(1.0, -1.0), (1.0, 1.0)]);

        match intersection(&a, &b) {
            Intersection::Points(points) => {
                assert_eq!(points.len(), 1);
                assert_relative_eq!(points[0].lng, 1.0, epsilon = 1e-9);
                assert_relative_eq!(points[0].lat, 0.0, epsilon = 1e-9);
            }
            Intersection::None => panic!("expected an intersection"),
        }
    }

    #[test]
    fn shared_endpoint_is_single_intersection() {
        let a = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = line(&[(1.0, 0.0), (2.0, 1.0)]);

        match intersection(&a, &b) {
            Intersection::Points(points) => assert_eq!(points.len(), 1),
            Intersection::None => panic!("expected the shared endpoint"),
        }
    }

    #[test]
    fn disjoint_lines_have_no_intersection() {
        let a = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = line(&[(10.0, 10.0), (11.0, 11.0)]);
        assert_eq!(intersection(&a, &b), Intersection::None);
    }

    #[test]
    fn dwithin_detects_near_miss() {
        let a = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = line(&[(0.0, 0.0001), (1.0, 0.0001)]);
        assert!(dwithin(&a, &b, 50.0));
        assert!(!dwithin(&a, &b, 0.1));
    }
}
