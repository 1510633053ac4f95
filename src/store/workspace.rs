use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::geo::{IndexedEnvelope, SpatialIndex};
use crate::model::{Edge, EdgeId, RouteRecommendation, Trail, Vertex, VertexId};
use crate::store::error::StoreError;

/// Options for [`Workspace::open`].
#[derive(Debug, Clone, Default)]
pub struct WorkspaceOptions {
    pub force_3d: bool,
}

/// §4.2: isolates one pipeline run's mutable state. Every run creates a
/// fresh workspace identified by `region + timestamp`; writers take an
/// exclusive lock for the duration of a batch insert, readers acquire a
/// shared snapshot handle stable for the life of the read (§5) — modeled
/// here with `std::sync::RwLock` since, unlike `aaru`'s OSM-ingestion
/// `scc::HashIndex`, this workspace is single-process and in-memory.
pub struct Workspace {
    pub name: String,
    region: String,
    frozen: bool,

    trails: RwLock<FxHashMap<Uuid, Trail>>,
    trail_index: RwLock<SpatialIndex<Uuid>>,

    vertices: RwLock<FxHashMap<VertexId, Vertex>>,
    edges: RwLock<FxHashMap<EdgeId, Edge>>,
    recommendations: RwLock<Vec<RouteRecommendation>>,

    snapshots: RwLock<Vec<FxHashMap<Uuid, Trail>>>,
}

impl Workspace {
    /// `open(region, options) -> Workspace`.
    pub fn open(region: impl Into<String>, options: WorkspaceOptions) -> Self {
        let region = region.into();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let _ = options; // force_3d is consumed by L1 conditioning, not the store itself.

        Self {
            name: format!("{region}-{timestamp}"),
            region,
            frozen: false,
            trails: RwLock::new(FxHashMap::default()),
            trail_index: RwLock::new(SpatialIndex::new()),
            vertices: RwLock::new(FxHashMap::default()),
            edges: RwLock::new(FxHashMap::default()),
            recommendations: RwLock::new(Vec::new()),
            snapshots: RwLock::new(Vec::new()),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// `insert_trails(batch)` — atomic: the whole batch is inserted or
    /// none. Validates every record, then commits.
    pub fn insert_trails(&mut self, batch: Vec<Trail>) -> Result<Vec<Uuid>, StoreError> {
        if self.frozen {
            return Err(StoreError::Frozen);
        }

        let trails = self.trails.read().expect("trails lock poisoned");
        for trail in &batch {
            if !trail.is_valid() {
                return Err(StoreError::ValidationFailed {
                    field: "geometry".into(),
                    reason: format!("trail {} failed §3 validation", trail.uuid),
                });
            }
            if trails.contains_key(&trail.uuid) {
                return Err(StoreError::Conflict(trail.uuid));
            }
        }
        drop(trails);

        let mut trails = self.trails.write().expect("trails lock poisoned");
        let mut index = self.trail_index.write().expect("index lock poisoned");

        let mut ids = Vec::with_capacity(batch.len());
        for trail in batch {
            index.insert(IndexedEnvelope::from_bbox(
                trail.uuid,
                trail.bbox.min_lng,
                trail.bbox.min_lat,
                trail.bbox.max_lng,
                trail.bbox.max_lat,
            ));
            ids.push(trail.uuid);
            trails.insert(trail.uuid, trail);
        }

        Ok(ids)
    }

    /// Removes a trail (used by L1 replace: insert children, then
    /// delete the parent, within the same logical step).
    pub fn remove_trail(&mut self, uuid: Uuid) -> Option<Trail> {
        let mut trails = self.trails.write().expect("trails lock poisoned");
        let removed = trails.remove(&uuid)?;
        let mut index = self.trail_index.write().expect("index lock poisoned");
        index.remove(&IndexedEnvelope::from_bbox(
            uuid,
            removed.bbox.min_lng,
            removed.bbox.min_lat,
            removed.bbox.max_lng,
            removed.bbox.max_lat,
        ));
        Some(removed)
    }

    pub fn trails(&self) -> Vec<Trail> {
        self.trails.read().expect("trails lock poisoned").values().cloned().collect()
    }

    pub fn trail(&self, uuid: Uuid) -> Option<Trail> {
        self.trails.read().expect("trails lock poisoned").get(&uuid).cloned()
    }

    pub fn trail_count(&self) -> usize {
        self.trails.read().expect("trails lock poisoned").len()
    }

    /// `query_by_bbox(bbox)`.
    pub fn query_by_bbox(&self, min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Vec<Uuid> {
        self.trail_index
            .read()
            .expect("index lock poisoned")
            .query_by_bbox(min_lng, min_lat, max_lng, max_lat)
            .map(|e| e.id)
            .collect()
    }

    /// `query_dwithin(point, dist)`.
    pub fn query_dwithin(&self, lng: f64, lat: f64, dist_m: f64) -> Vec<Uuid> {
        self.trail_index
            .read()
            .expect("index lock poisoned")
            .query_dwithin(lng, lat, dist_m)
            .map(|e| e.id)
            .collect()
    }

    /// `snapshot()` — nested transactional boundary for an individual L1
    /// step.
    pub fn snapshot(&self) {
        let trails = self.trails.read().expect("trails lock poisoned").clone();
        self.snapshots.write().expect("snapshot lock poisoned").push(trails);
    }

    /// `rollback()` — restores the most recent snapshot, discarding
    /// whatever mutations happened since.
    pub fn rollback(&mut self) -> Result<(), StoreError> {
        let restored = self
            .snapshots
            .write()
            .expect("snapshot lock poisoned")
            .pop()
            .ok_or(StoreError::NotOpen)?;

        let mut index = SpatialIndex::new();
        for trail in restored.values() {
            index.insert(IndexedEnvelope::from_bbox(
                trail.uuid,
                trail.bbox.min_lng,
                trail.bbox.min_lat,
                trail.bbox.max_lng,
                trail.bbox.max_lat,
            ));
        }

        *self.trails.write().expect("trails lock poisoned") = restored;
        *self.trail_index.write().expect("index lock poisoned") = index;
        Ok(())
    }

    /// `freeze()` — transitions to read-only; only L2/L3-derived tables
    /// may be written after this.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn set_vertices(&mut self, vertices: Vec<Vertex>) {
        let mut table = self.vertices.write().expect("vertex lock poisoned");
        table.clear();
        table.extend(vertices.into_iter().map(|v| (v.id, v)));
    }

    pub fn vertices(&self) -> Vec<Vertex> {
        self.vertices.read().expect("vertex lock poisoned").values().cloned().collect()
    }

    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        let mut table = self.edges.write().expect("edge lock poisoned");
        table.clear();
        table.extend(edges.into_iter().map(|e| (e.id, e)));
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.edges.read().expect("edge lock poisoned").values().cloned().collect()
    }

    pub fn set_recommendations(&mut self, recs: Vec<RouteRecommendation>) {
        *self.recommendations.write().expect("rec lock poisoned") = recs;
    }

    pub fn recommendations(&self) -> Vec<RouteRecommendation> {
        self.recommendations.read().expect("rec lock poisoned").clone()
    }

    /// `drop()` — tears down the workspace; all derived data is
    /// discarded. Named to avoid colliding with `std::ops::Drop`.
    pub fn teardown(self) {
        drop(self);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::Coord3;
    use crate::model::trail::Trail as TrailModel;
    use crate::geo::Line3;

    fn sample_trail() -> TrailModel {
        let line = Line3::new(vec![
            Coord3::new(0.0, 0.0, Some(0.0)),
            Coord3::new(0.01, 0.0, Some(5.0)),
        ]);
        TrailModel::new("test-region", line, None, None).unwrap()
    }

    #[test]
    fn insert_and_query_by_bbox() {
        let mut ws = Workspace::open("test-region", WorkspaceOptions::default());
        let trail = sample_trail();
        let uuid = trail.uuid;
        ws.insert_trails(vec![trail]).unwrap();

        let found = ws.query_by_bbox(-1.0, -1.0, 1.0, 1.0);
        assert_eq!(found, vec![uuid]);
    }

    #[test]
    fn insert_rejects_duplicate_uuid() {
        let mut ws = Workspace::open("test-region", WorkspaceOptions::default());
        let trail = sample_trail();
        let dup = trail.clone();
        ws.insert_trails(vec![trail]).unwrap();

        let err = ws.insert_trails(vec![dup]).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn freeze_rejects_further_writes() {
        let mut ws = Workspace::open("test-region", WorkspaceOptions::default());
        ws.freeze();
        let err = ws.insert_trails(vec![sample_trail()]).unwrap_err();
        assert!(matches!(err, StoreError::Frozen));
    }

    #[test]
    fn rollback_restores_pre_batch_state() {
        let mut ws = Workspace::open("test-region", WorkspaceOptions::default());
        ws.snapshot();
        ws.insert_trails(vec![sample_trail()]).unwrap();
        assert_eq!(ws.trail_count(), 1);

        ws.rollback().unwrap();
        assert_eq!(ws.trail_count(), 0);
    }
}
