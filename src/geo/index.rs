//! The mandatory spatial index of §4.1: range/envelope queries and
//! geodesic `dwithin` queries that prune candidate pairs before any
//! `O(n)` pairwise pass.
//!
//! Grounded on `libs/routers_codec/src/primitive/node.rs`'s
//! `RTreeObject`/`PointDistance` impls over `geo::Point`.

use geo::{Destination, Geodesic, Point};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

/// An indexed envelope keyed by an opaque id — a trail uuid, a vertex
/// id, an edge id. The index only stores bounding geometry; callers
/// look the full record up by `id` in the owning table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedEnvelope<Id> {
    pub id: Id,
    min: [f64; 2],
    max: [f64; 2],
}

impl<Id: Copy> IndexedEnvelope<Id> {
    pub fn from_bbox(id: Id, min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self { id, min: [min_lng, min_lat], max: [max_lng, max_lat] }
    }

    pub fn from_point(id: Id, lng: f64, lat: f64) -> Self {
        Self { id, min: [lng, lat], max: [lng, lat] }
    }

    fn centroid(&self) -> Point<f64> {
        Point::new((self.min[0] + self.max[0]) / 2.0, (self.min[1] + self.max[1]) / 2.0)
    }
}

impl<Id: Copy + PartialEq> RTreeObject for IndexedEnvelope<Id> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

impl<Id: Copy + PartialEq> PointDistance for IndexedEnvelope<Id> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let p = Point::new(point[0], point[1]);
        Geodesic.distance(self.centroid(), p).powi(2)
    }
}

/// An R-tree backed spatial index over bounding envelopes. Used by the
/// staging workspace over trail bboxes, and by L1/L2 over vertex/edge
/// positions.
pub struct SpatialIndex<Id: Copy + PartialEq> {
    tree: RTree<IndexedEnvelope<Id>>,
}

impl<Id: Copy + PartialEq> Default for SpatialIndex<Id> {
    fn default() -> Self {
        Self { tree: RTree::new() }
    }
}

impl<Id: Copy + PartialEq> SpatialIndex<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: IndexedEnvelope<Id>) {
        self.tree.insert(entry);
    }

    pub fn remove(&mut self, entry: &IndexedEnvelope<Id>) -> bool {
        self.tree.remove(entry).is_some()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// `query_by_bbox` — range query against an axis-aligned envelope.
    pub fn query_by_bbox(
        &self,
        min_lng: f64,
        min_lat: f64,
        max_lng: f64,
        max_lat: f64,
    ) -> impl Iterator<Item = &IndexedEnvelope<Id>> {
        let envelope = AABB::from_corners([min_lng, min_lat], [max_lng, max_lat]);
        self.tree.locate_in_envelope_intersecting(&envelope)
    }

    /// `query_dwithin(point, dist)` — candidates whose envelope centroid
    /// lies within a square bound around `point`, pruning before an
    /// exact geodesic check. Matches the "square-scan" idiom of
    /// `src/graph/traits/proximity/implementation.rs`.
    pub fn query_dwithin(&self, lng: f64, lat: f64, dist_m: f64) -> impl Iterator<Item = &IndexedEnvelope<Id>> {
        let origin = Point::new(lng, lat);
        let bottom_right = Geodesic.destination(origin, 135.0, dist_m);
        let top_left = Geodesic.destination(origin, 315.0, dist_m);

        let envelope = AABB::from_corners(
            [top_left.x(), top_left.y()],
            [bottom_right.x(), bottom_right.y()],
        );
        self.tree.locate_in_envelope_intersecting(&envelope)
    }

    pub fn nearest(&self, lng: f64, lat: f64) -> Option<&IndexedEnvelope<Id>> {
        self.tree.nearest_neighbor(&[lng, lat])
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedEnvelope<Id>> {
        self.tree.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bbox_query_finds_overlapping_entries() {
        let mut index: SpatialIndex<u32> = SpatialIndex::new();
        index.insert(IndexedEnvelope::from_point(1, 0.0, 0.0));
        index.insert(IndexedEnvelope::from_point(2, 10.0, 10.0));

        let found: Vec<_> = index.query_by_bbox(-1.0, -1.0, 1.0, 1.0).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn dwithin_prunes_by_square_scan() {
        let mut index: SpatialIndex<u32> = SpatialIndex::new();
        index.insert(IndexedEnvelope::from_point(1, 0.0, 0.0));
        index.insert(IndexedEnvelope::from_point(2, 1.0, 1.0));

        let nearby: Vec<_> = index.query_dwithin(0.0, 0.0, 100.0).collect();
        assert_eq!(nearby.len(), 1);
    }
}
