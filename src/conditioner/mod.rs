//! §4.3: the L1 trail conditioner.

pub mod dedup;
pub mod error;
pub mod gapfix;
pub mod loop_split;
pub mod snap_split;
pub mod validate;

use log::{info, warn};
use uuid::Uuid;

use crate::config::L1Config;
use crate::external::ElevationProvider;
use crate::model::Trail;

pub use error::ConditionError;

/// Per-record outcome counts for one L1 run (§7: "counted and logged, not
/// fatal").
#[derive(Debug, Default)]
pub struct L1Report {
    pub trails_in: usize,
    pub trails_out: usize,
    pub dropped: Vec<(Uuid, String)>,
    pub bridges_added: usize,
    pub skipped: Vec<(Uuid, String)>,
}

/// Runs the full L1 pipeline: validate/clean, dedup, gap-fix, snap-and-
/// split, loop pre-split, in that order (§4.3.1 through §4.3.5).
pub fn condition(
    trails: Vec<Trail>,
    region: &str,
    config: &L1Config,
    elevation: Option<&dyn ElevationProvider>,
    require_elevation: bool,
) -> (Vec<Trail>, L1Report) {
    info!("L1 conditioning {} trails for region {region}", trails.len());
    let mut report = L1Report { trails_in: trails.len(), ..L1Report::default() };

    let (cleaned, dropped) = validate::validate_and_clean(trails, config, elevation, require_elevation);
    for (uuid, reason) in &dropped {
        warn!("trail {uuid} dropped during validation: {reason}");
    }
    report.dropped.extend(dropped);

    let (deduped, dedup_dropped) = dedup::dedup(cleaned, config);
    for (uuid, reason) in &dedup_dropped {
        warn!("trail {uuid} dropped as a duplicate: {reason}");
    }
    report.dropped.extend(dedup_dropped);

    let bridges = gapfix::fix_gaps(&deduped, region, config);
    report.bridges_added = bridges.len();
    let mut with_bridges = deduped;
    with_bridges.extend(bridges);

    let (split, split_log) = snap_split::snap_and_split(with_bridges, config);
    report.skipped.extend(split_log);

    let (final_trails, loop_log) = loop_split::presplit_loops(split, config);
    report.skipped.extend(loop_log);

    report.trails_out = final_trails.len();
    info!(
        "L1 conditioning produced {} trails ({} dropped, {} bridges added)",
        report.trails_out,
        report.dropped.len(),
        report.bridges_added
    );
    (final_trails, report)
}
