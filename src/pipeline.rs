//! §6's run lifecycle API: `install`, `prepare_region`, `run_l1`,
//! `run_l2`, `run_l3`, `export`, `cleanup`. Stage sequencing and
//! cancellation follow §5: each stage reads the previous stage's output
//! wholesale, no stage reaches backward into an earlier one's internals.

use log::info;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::external::{ElevationProvider, ExportSink, Exporter, OverpassBackfill, OverpassFilters};
use crate::model::{Edge, RouteRecommendation, Trail, Vertex};
use crate::store::{Workspace, WorkspaceOptions};
use crate::util::CancellationToken;
use crate::{assembler, conditioner, router};

/// Summaries surfaced to the controlling process after each stage, per
/// §7's "counted and logged, not fatal" reporting.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub l1: Option<conditioner::L1Report>,
    pub l2: Option<assembler::L2Report>,
    pub l3: Option<router::L3Report>,
}

/// Owns one region's run end to end: a staging [`Workspace`], the
/// configuration it was opened with, and a [`CancellationToken`] checked
/// at every stage and subnetwork boundary (§5).
pub struct Pipeline<'a> {
    config: Config,
    cancel: CancellationToken,
    workspace: Option<Workspace>,
    elevation: Option<&'a dyn ElevationProvider>,
    overpass: Option<&'a dyn OverpassBackfill<Error = crate::error::Error>>,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    recommendations: Vec<RouteRecommendation>,
    summary: RunSummary,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            workspace: None,
            elevation: None,
            overpass: None,
            vertices: Vec::new(),
            edges: Vec::new(),
            recommendations: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn with_elevation_provider(mut self, provider: &'a dyn ElevationProvider) -> Self {
        self.elevation = Some(provider);
        self
    }

    pub fn with_overpass_backfill(mut self, backfill: &'a dyn OverpassBackfill<Error = crate::error::Error>) -> Self {
        self.overpass = Some(backfill);
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// `install` — one-time setup before any region is touched: config
    /// validation, the only "config file loading" this crate owns (§6).
    pub fn install(&self) -> Result<()> {
        self.config.validate()
    }

    /// `prepare_region(region, bbox?)` — opens a fresh staging workspace
    /// for `region`. If an Overpass backfill collaborator and a `bbox`
    /// are both present, fetched trails are inserted into the workspace
    /// raw; they flow through the same L1 validation/dedup as everything
    /// else (§6: "returned trails are subjected to L1 validation and
    /// dedup"), not pre-filtered here.
    pub fn prepare_region(
        &mut self,
        region: impl Into<String>,
        trails: Vec<Trail>,
        bbox: Option<(f64, f64, f64, f64)>,
    ) -> Result<usize> {
        let region = region.into();
        info!("preparing region {region} with {} trails supplied", trails.len());
        let mut workspace = Workspace::open(region.clone(), WorkspaceOptions { force_3d: self.config.force_3d });

        let mut batch = trails;
        if let (Some(backfill), Some(bbox)) = (self.overpass, bbox) {
            let filters = OverpassFilters::default();
            let fetched = backfill
                .fetch_trails(bbox, &filters)
                .map_err(|e| Error::BackfillUnavailable(e.to_string()))?;
            batch.extend(fetched);
        }

        let inserted = workspace.insert_trails(batch)?.len();
        self.workspace = Some(workspace);
        Ok(inserted)
    }

    /// `run_l1` — trail conditioning (§4.3). Replaces the workspace's
    /// trail set with the conditioned output; raw trails are discarded
    /// (L1 is not reversible, matching §4.3's "no step re-reads an
    /// earlier trail's raw geometry").
    pub fn run_l1(&mut self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let workspace = self.workspace.as_mut().ok_or(crate::store::StoreError::NotOpen)?;

        let region = workspace.region().to_string();
        let raw = workspace.trails();
        let uuids: Vec<Uuid> = raw.iter().map(|t| t.uuid).collect();

        let (conditioned, report) =
            conditioner::condition(raw, &region, &self.config.l1, self.elevation, self.config.require_elevation);

        for uuid in uuids {
            workspace.remove_trail(uuid);
        }
        workspace.insert_trails(conditioned)?;

        self.summary.l1 = Some(report);
        Ok(())
    }

    /// `run_l2` — network assembly (§4.4). Freezes the workspace's trail
    /// table: only L2/L3-derived tables (vertices, edges,
    /// recommendations) may be written afterward.
    pub fn run_l2(&mut self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let workspace = self.workspace.as_mut().ok_or(crate::store::StoreError::NotOpen)?;

        let trails = workspace.trails();
        let (vertices, edges, report) = assembler::assemble(trails, &self.config.l2)?;

        workspace.set_vertices(vertices.clone());
        workspace.set_edges(edges.clone());
        workspace.freeze();

        self.vertices = vertices;
        self.edges = edges;
        self.summary.l2 = Some(report);
        Ok(())
    }

    /// `run_l3(patterns)` — route generation (§4.5). `patterns` replaces
    /// `config.l3.patterns` for this run, so a controller can generate
    /// against a different pattern set per call without re-running L1/L2.
    pub fn run_l3(&mut self, patterns: Vec<crate::model::RoutePattern>) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let workspace = self.workspace.as_mut().ok_or(crate::store::StoreError::NotOpen)?;

        let trails_by_uuid: FxHashMap<Uuid, Trail> =
            workspace.trails().into_iter().map(|t| (t.uuid, t)).collect();

        let mut l3_config = self.config.l3.clone();
        l3_config.patterns = patterns;

        let (recommendations, report) =
            router::route(&self.vertices, &self.edges, &trails_by_uuid, &l3_config, &self.cancel)?;

        workspace.set_recommendations(recommendations.clone());
        self.recommendations = recommendations;
        self.summary.l3 = Some(report);
        Ok(())
    }

    /// `export(trails, vertices, edges, recommendations, sink)` —
    /// delegates to the `Exporter` collaborator; the core treats `sink`
    /// opaquely (§6).
    pub fn export<E>(&self, exporter: &E, sink: &ExportSink) -> Result<()>
    where
        E: Exporter,
    {
        let workspace = self.workspace.as_ref().ok_or(crate::store::StoreError::NotOpen)?;
        let trails = workspace.trails();

        exporter
            .export(&trails, &self.vertices, &self.edges, &self.recommendations, sink)
            .map_err(|e| Error::ExporterFailed(e.to_string()))
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// `cleanup` — tears down the workspace; all derived data is
    /// discarded.
    pub fn cleanup(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            info!("tearing down workspace for region {}", workspace.region());
            workspace.teardown();
        }
        self.vertices.clear();
        self.edges.clear();
        self.recommendations.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::{Coord3, Line3};
    use crate::model::{RoutePattern, Shape};

    fn trail(lng_start: f64) -> Trail {
        let line = Line3::new(vec![
            Coord3::new(lng_start, 0.0, Some(0.0)),
            Coord3::new(lng_start + 0.01, 0.0, Some(5.0)),
        ]);
        Trail::new("test-region", line, None, None).unwrap()
    }

    #[test]
    fn install_validates_config() {
        let pipeline = Pipeline::new(Config::default());
        assert!(pipeline.install().is_ok());
    }

    #[test]
    fn install_rejects_invalid_config() {
        let mut config = Config::default();
        config.l1.min_gap_m = 100.0;
        config.l1.max_gap_m = 1.0;
        let pipeline = Pipeline::new(config);
        assert!(pipeline.install().is_err());
    }

    #[test]
    fn full_run_with_no_trails_produces_empty_outputs() {
        let mut pipeline = Pipeline::new(Config::default());
        pipeline.prepare_region("test-region", Vec::new(), None).unwrap();
        pipeline.run_l1().unwrap();
        pipeline.run_l2().unwrap();

        let pattern = RoutePattern {
            name: "short loop".into(),
            target_distance_km: 5.0,
            target_elevation_gain_m: 100.0,
            shape: Shape::Loop,
            tolerance_percent: 20.0,
        };
        pipeline.run_l3(vec![pattern]).unwrap();

        assert!(pipeline.recommendations.is_empty());
        assert!(pipeline.summary().l3.is_some());
        pipeline.cleanup();
    }

    #[test]
    fn run_l1_conditions_and_replaces_workspace_trails() {
        let mut pipeline = Pipeline::new(Config::default());
        pipeline.prepare_region("test-region", vec![trail(0.0)], None).unwrap();
        pipeline.run_l1().unwrap();
        assert_eq!(pipeline.summary().l1.as_ref().unwrap().trails_in, 1);
    }

    #[test]
    fn stages_run_in_order_without_a_workspace_fail() {
        let mut pipeline = Pipeline::new(Config::default());
        assert!(pipeline.run_l1().is_err());
    }

    fn line(points: &[(f64, f64)]) -> Line3 {
        Line3::new(points.iter().map(|(x, y)| Coord3::new(*x, *y, Some(0.0))).collect())
    }

    #[test]
    fn t_intersection_splits_both_trails_end_to_end() {
        // §8 scenario 1: A crosses B at an interior point of both, so L1
        // splits both and L2 resolves 5 vertices / 4 edges.
        let a = Trail::new("test-region", line(&[(0.0, 0.0), (2.0, 0.0)]), None, None).unwrap();
        let b = Trail::new("test-region", line(&[(1.0, -1.0), (1.0, 1.0)]), None, None).unwrap();

        let mut pipeline = Pipeline::new(Config::default());
        pipeline.prepare_region("test-region", vec![a, b], None).unwrap();
        pipeline.run_l1().unwrap();
        assert_eq!(pipeline.summary().l1.as_ref().unwrap().trails_out, 4);

        pipeline.run_l2().unwrap();
        let l2 = pipeline.summary().l2.as_ref().unwrap();
        assert_eq!(l2.vertices_out, 5);
        assert_eq!(l2.edges_out, 4);
    }

    #[test]
    fn duplicate_trail_is_dropped_during_l1() {
        // §8 scenario 2: a near-identical copy (>95% overlap) is dropped;
        // `trail_count` decrements by one.
        let original = Trail::new("test-region", line(&[(0.0, 0.0), (0.01, 0.0)]), None, None).unwrap();
        let mut copy = Trail::new("test-region", line(&[(0.0, 0.0000001), (0.01, 0.0000001)]), None, None).unwrap();
        copy.name = Some("copy".into());

        let mut pipeline = Pipeline::new(Config::default());
        pipeline.prepare_region("test-region", vec![original, copy], None).unwrap();
        pipeline.run_l1().unwrap();

        let l1 = pipeline.summary().l1.as_ref().unwrap();
        assert_eq!(l1.trails_in, 2);
        assert_eq!(l1.trails_out, 1);
        assert_eq!(l1.dropped.len(), 1);
    }

    #[test]
    fn gap_fix_bridges_and_the_bridge_is_load_bearing() {
        // §8 scenario 3: two trails 5 m apart under `max_gap_m = 10`
        // produce a synthetic bridge; removing that bridge edge splits
        // the network back into its two original components.
        let gap_deg = 5.0 / 111_000.0;
        let a = Trail::new("test-region", line(&[(0.0, 0.0), (0.01, 0.0)]), None, None).unwrap();
        let b = Trail::new(
            "test-region",
            line(&[(0.01 + gap_deg, 0.0), (0.02 + gap_deg, 0.0)]),
            None,
            None,
        )
        .unwrap();

        let mut config = Config::default();
        config.l1.min_gap_m = 0.5;
        config.l1.max_gap_m = 10.0;

        let mut pipeline = Pipeline::new(config);
        pipeline.prepare_region("test-region", vec![a, b], None).unwrap();
        pipeline.run_l1().unwrap();
        assert_eq!(pipeline.summary().l1.as_ref().unwrap().bridges_added, 1);

        pipeline.run_l2().unwrap();
        let l2 = pipeline.summary().l2.as_ref().unwrap();
        assert_eq!(l2.vertices_out, 4);
        assert_eq!(l2.edges_out, 3);

        let l3_config = crate::config::L3Config { min_subnetwork_size: 1, ..crate::config::L3Config::default() };
        let (whole, skipped) = router::subnetwork::schedule(&pipeline.vertices, &pipeline.edges, &l3_config);
        assert!(skipped.is_empty());
        assert_eq!(whole.len(), 1);

        let bridge = pipeline.edges.iter().find(|e| e.length_km * 1000.0 < 10.0).expect("bridge edge");
        let without_bridge: Vec<Edge> = pipeline.edges.iter().filter(|e| e.id != bridge.id).cloned().collect();
        let (components, _) = router::subnetwork::schedule(&pipeline.vertices, &without_bridge, &l3_config);
        assert_eq!(components.len(), 2);
    }
}
