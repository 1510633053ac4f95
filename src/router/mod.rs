//! §4.5: the L3 route generator.

pub mod dedup;
pub mod error;
pub mod ksp;
pub mod loops;
pub mod score;
pub mod subnetwork;

use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::config::L3Config;
use crate::model::{Edge, EdgeId, RouteRecommendation, Shape, Trail, Vertex, VertexId};
use crate::util::CancellationToken;

pub use error::RouteError;
pub use score::Candidate;

/// Per-record outcome counts for one L3 run (§7).
#[derive(Debug, Default)]
pub struct L3Report {
    pub subnetworks_processed: usize,
    pub subnetworks_skipped: Vec<(usize, String)>,
    pub recommendations_out: usize,
}

/// Runs the full L3 pipeline: subnetwork scheduling, per-pattern search
/// (KSP for out-and-back/point-to-point, circuit enumeration for loops),
/// scoring, and cross-pattern deduplication (§4.5.1 through §4.5.6).
pub fn route(
    vertices: &[Vertex],
    edges: &[Edge],
    trails: &FxHashMap<Uuid, Trail>,
    config: &L3Config,
    cancel: &CancellationToken,
) -> Result<(Vec<RouteRecommendation>, L3Report), RouteError> {
    info!("L3 routing {} vertices / {} edges across {} patterns", vertices.len(), edges.len(), config.patterns.len());
    let (subnetworks, skipped) = subnetwork::schedule(vertices, edges, config);
    for (size, reason) in &skipped {
        debug!("subnetwork of size {size} skipped: {reason}");
    }
    let mut report = L3Report { subnetworks_skipped: skipped, ..L3Report::default() };

    let vertices_by_id: FxHashMap<VertexId, &Vertex> = vertices.iter().map(|v| (v.id, v)).collect();
    let mut all_candidates: Vec<RouteRecommendation> = Vec::new();

    for subnetwork in &subnetworks {
        if cancel.is_cancelled() {
            return Err(RouteError::Cancelled);
        }

        let edges_by_id: FxHashMap<EdgeId, &Edge> = subnetwork.edges.iter().map(|e| (e.id, e)).collect();
        let adjacency = ksp::Adjacency::build(&subnetwork.edges);

        for pattern in &config.patterns {
            if cancel.is_cancelled() {
                return Err(RouteError::Cancelled);
            }

            let found = match pattern.shape {
                Shape::OutAndBack | Shape::PointToPoint => search_linear(
                    &subnetwork.vertices,
                    &adjacency,
                    &edges_by_id,
                    &vertices_by_id,
                    trails,
                    pattern,
                    config,
                    pattern.shape == Shape::OutAndBack,
                ),
                Shape::Loop => search_loops(&subnetwork.vertices, &subnetwork.edges, &edges_by_id, trails, pattern, config),
                Shape::Lollipop => Vec::new(),
            };

            all_candidates.extend(found);
        }

        report.subnetworks_processed += 1;
    }

    let deduped = dedup::dedup_and_cap(all_candidates, config.max_routes_per_pattern, config.patterns.len());
    report.recommendations_out = deduped.len();
    if report.recommendations_out == 0 {
        warn!("L3 routing produced no recommendations across {} subnetworks", report.subnetworks_processed);
    } else {
        info!("L3 routing produced {} recommendations", report.recommendations_out);
    }
    Ok((deduped, report))
}

#[allow(clippy::too_many_arguments)]
fn search_linear(
    subnetwork_vertices: &[VertexId],
    adjacency: &ksp::Adjacency,
    edges_by_id: &FxHashMap<EdgeId, &Edge>,
    vertices_by_id: &FxHashMap<VertexId, &Vertex>,
    trails: &FxHashMap<Uuid, Trail>,
    pattern: &crate::model::RoutePattern,
    config: &L3Config,
    out_and_back: bool,
) -> Vec<RouteRecommendation> {
    let one_way_target_km = if out_and_back { pattern.target_distance_km / 2.0 } else { pattern.target_distance_km };

    let seeds = thin_seeds(subnetwork_vertices, vertices_by_id, config.min_distance_between_routes_m);
    let mut out = Vec::new();

    'seed: for &seed in &seeds {
        if out.len() >= config.max_routes_per_pattern {
            break;
        }

        // `reach_all` finds which vertices sit near the one-way target
        // distance cheaply; `k_shortest_paths` then does the real work of
        // finding up to `max_routes_per_pattern` distinct routes to each
        // one, per §4.5.3 (a single Dijkstra path per target under-produces
        // candidates in sparse subnetworks with few near-target vertices).
        let reachable = ksp::reach_all(adjacency, seed);
        for &tolerance_fraction in &sorted_tolerance_levels(config) {
            let tol_km = one_way_target_km * tolerance_fraction;
            let mut targets: Vec<VertexId> = reachable
                .iter()
                .filter(|(_, path)| ((path.length_m / 1000.0) - one_way_target_km).abs() <= tol_km)
                .map(|(&v, _)| v)
                .collect();
            targets.sort();

            for target in targets {
                let paths = ksp::k_shortest_paths(adjacency, seed, target, config.max_routes_per_pattern);
                for path in &paths {
                    if let Some(recommendation) = build_recommendation(
                        pattern,
                        &path.edges,
                        &path.vertices,
                        0.0,
                        edges_by_id,
                        trails,
                        config,
                        out_and_back,
                    ) {
                        out.push(recommendation);
                        if out.len() >= config.max_routes_per_pattern {
                            continue 'seed;
                        }
                    }
                }
            }
        }
    }

    out
}

fn search_loops(
    subnetwork_vertices: &[VertexId],
    subnetwork_edges: &[Edge],
    edges_by_id: &FxHashMap<EdgeId, &Edge>,
    trails: &FxHashMap<Uuid, Trail>,
    pattern: &crate::model::RoutePattern,
    config: &L3Config,
) -> Vec<RouteRecommendation> {
    let mut accepted: Vec<RouteRecommendation> = Vec::new();

    for &start in subnetwork_vertices {
        if accepted.len() >= config.max_routes_per_pattern {
            break;
        }

        let circuits = loops::find_circuits(subnetwork_vertices, subnetwork_edges, start, config.max_routes_per_pattern);
        for circuit in circuits {
            if circuit.edges.len() < config.min_trail_count {
                continue;
            }
            if !pattern.matches(circuit.length_m / 1000.0, 0.0) && !within_any_tolerance(pattern, circuit.length_m, config)
            {
                continue;
            }

            let max_overlap = accepted
                .iter()
                .map(|existing| overlap_percent(&existing.edges, &circuit.edges, edges_by_id))
                .fold(0.0_f64, f64::max);
            if max_overlap > config.max_loop_overlap_percent {
                continue;
            }

            if let Some(recommendation) = build_recommendation(
                pattern,
                &circuit.edges,
                &circuit.vertices,
                max_overlap,
                edges_by_id,
                trails,
                config,
                false,
            ) {
                accepted.push(recommendation);
                if accepted.len() >= config.max_routes_per_pattern {
                    break;
                }
            }
        }
    }

    accepted
}

fn within_any_tolerance(pattern: &crate::model::RoutePattern, length_m: f64, config: &L3Config) -> bool {
    sorted_tolerance_levels(config).iter().any(|&tol| {
        let tol_km = pattern.target_distance_km * tol;
        ((length_m / 1000.0) - pattern.target_distance_km).abs() <= tol_km
    })
}

fn sorted_tolerance_levels(config: &L3Config) -> Vec<f64> {
    let mut levels = config.tolerance_levels.clone();
    levels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    levels
}

fn overlap_percent(a: &[EdgeId], b: &[EdgeId], edges_by_id: &FxHashMap<EdgeId, &Edge>) -> f64 {
    let shared_len: f64 = b
        .iter()
        .filter(|e| a.contains(e))
        .filter_map(|e| edges_by_id.get(e))
        .map(|e| e.length_km * 1000.0)
        .sum();
    let b_len: f64 = b.iter().filter_map(|e| edges_by_id.get(e)).map(|e| e.length_km * 1000.0).sum();
    if b_len <= 0.0 {
        0.0
    } else {
        100.0 * shared_len / b_len
    }
}

/// Fraction of vertex visits in a route that revisit an already-visited
/// vertex (§4.5.4's backtracking metric). KSP paths and Hawick circuits
/// are loopless by construction, so this is normally 0; it only trips if
/// a route's vertex sequence genuinely doubles back on itself.
fn repeated_vertex_percent(vertices: &[VertexId]) -> f64 {
    if vertices.is_empty() {
        return 0.0;
    }
    let mut seen: std::collections::HashSet<VertexId> = std::collections::HashSet::new();
    let repeats = vertices.iter().filter(|v| !seen.insert(**v)).count();
    100.0 * repeats as f64 / vertices.len() as f64
}

/// Picks seed vertices spaced at least `min_distance_m` apart (greedy
/// spatial thinning, §4.5.3), iterating in stable vertex-id order for
/// determinism.
fn thin_seeds(candidates: &[VertexId], vertices_by_id: &FxHashMap<VertexId, &Vertex>, min_distance_m: f64) -> Vec<VertexId> {
    let mut sorted = candidates.to_vec();
    sorted.sort();

    let mut chosen: Vec<VertexId> = Vec::new();
    for &candidate in &sorted {
        let Some(&vertex) = vertices_by_id.get(&candidate) else { continue };
        let far_enough = chosen.iter().all(|&other| {
            let Some(&other_vertex) = vertices_by_id.get(&other) else { return true };
            crate::geo::haversine_meters(vertex.position, other_vertex.position) >= min_distance_m
        });
        if far_enough {
            chosen.push(candidate);
        }
    }
    chosen
}

#[allow(clippy::too_many_arguments)]
fn build_recommendation(
    pattern: &crate::model::RoutePattern,
    edges: &[EdgeId],
    route_vertices: &[VertexId],
    overlap_percent_value: f64,
    edges_by_id: &FxHashMap<EdgeId, &Edge>,
    trails: &FxHashMap<Uuid, Trail>,
    config: &L3Config,
    out_and_back: bool,
) -> Option<RouteRecommendation> {
    if edges.is_empty() {
        return None;
    }

    let resolved: Vec<&Edge> = edges.iter().filter_map(|id| edges_by_id.get(id).copied()).collect();
    if resolved.len() != edges.len() {
        return None;
    }

    let one_way_distance_km: f64 = resolved.iter().map(|e| e.length_km).sum();
    let one_way_gain: f64 = resolved.iter().map(|e| e.gain).sum();
    let one_way_loss: f64 = resolved.iter().map(|e| e.loss).sum();

    let (distance_km, gain_m, loss_m) = if out_and_back {
        (one_way_distance_km * 2.0, one_way_gain + one_way_loss, one_way_loss + one_way_gain)
    } else {
        (one_way_distance_km, one_way_gain, one_way_loss)
    };

    if !pattern.matches(distance_km, gain_m) && !within_any_tolerance(pattern, distance_km * 1000.0, config) {
        return None;
    }

    // §4.5.4: reject candidates that revisit too much of their own route
    // before they ever reach scoring.
    let backtracking_percent = repeated_vertex_percent(route_vertices);
    if backtracking_percent > config.max_backtracking_percent {
        return None;
    }

    let trail_count = resolved.len();
    let unique_trail_count = {
        let mut uuids: Vec<Uuid> = resolved.iter().map(|e| e.trail_uuid).collect();
        uuids.sort();
        uuids.dedup();
        uuids.len()
    };

    let connectivity_score = connectivity(&resolved, trails);

    let geometry = concat_geometries(&resolved);

    let candidate = Candidate {
        distance_km,
        gain_m,
        loss_m,
        trail_count,
        unique_trail_count,
        connectivity_score,
        backtracking_percent,
        overlap_percent: overlap_percent_value,
    };

    let (metrics, score) = score::score_candidate(&candidate, pattern, config);
    let fingerprint = RouteRecommendation::compute_fingerprint(&pattern.name, edges);

    Some(RouteRecommendation {
        uuid: Uuid::new_v4(),
        pattern_name: pattern.name.clone(),
        edges: edges.to_vec(),
        metrics,
        score,
        similarity: (score / 100.0).clamp(0.0, 1.0),
        geometry,
        fingerprint,
    })
}

/// Fraction of consecutive edge pairs sharing a common trail name or
/// meeting at a true intersection vertex (§4.5.5's connectivity score).
fn connectivity(edges: &[&Edge], trails: &FxHashMap<Uuid, Trail>) -> f64 {
    if edges.len() < 2 {
        return 1.0;
    }

    let matches = edges.windows(2).filter(|pair| {
        let (a, b) = (pair[0], pair[1]);
        let same_name = match (trails.get(&a.trail_uuid).and_then(|t| t.name.as_ref()), trails.get(&b.trail_uuid).and_then(|t| t.name.as_ref())) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        };
        same_name
    });

    matches.count() as f64 / (edges.len() - 1) as f64
}

fn concat_geometries(edges: &[&Edge]) -> crate::geo::Line3 {
    let mut iter = edges.iter();
    let Some(first) = iter.next() else { return crate::geo::Line3::new(Vec::new()) };
    let mut geometry = first.geometry.clone();
    for edge in iter {
        geometry = geometry.concat(&edge.geometry);
    }
    geometry
}
