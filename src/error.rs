use thiserror::Error;

use crate::assembler::AssembleError;
use crate::conditioner::ConditionError;
use crate::geo::GeoError;
use crate::router::RouteError;
use crate::store::StoreError;

/// The closed error taxonomy from §7. Every stage-local error type
/// (`GeoError`, `StoreError`, `ConditionError`, `AssembleError`,
/// `RouteError`) converts into one of these variants via `impl_err!`.
///
/// `thiserror` gives the CLI collaborator (out of scope, §1) a
/// ready-made one-line `Display` for fatal errors, matching §7's
/// "human-readable one-line cause" requirement.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },

    #[error("geometry error: {0}")]
    Geometry(GeoError),

    #[error("staging workspace error: {0}")]
    Store(StoreError),

    #[error("trail conditioning error: {0}")]
    Condition(ConditionError),

    #[error("network assembly error: {0}")]
    Assemble(AssembleError),

    #[error("route generation error: {0}")]
    Route(RouteError),

    #[error("dangling endpoint: no vertex found within tolerance")]
    DanglingEndpoint,

    #[error("graph inconsistent: {0}")]
    GraphInconsistent(String),

    #[error("subnetwork too large: {0} nodes")]
    SubnetworkTooLarge(usize),

    #[error("search timed out")]
    SearchTimeout,

    #[error("operation cancelled")]
    Cancelled,

    #[error("scorer unavailable, falling back to heuristic")]
    ScorerUnavailable,

    #[error("external backfill unavailable: {0}")]
    BackfillUnavailable(String),

    #[error("exporter failed: {0}")]
    ExporterFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The exit-code mapping a controlling process (§6, out of scope) would
/// use: 0 for success, nonzero stage-specific codes otherwise.
impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ConfigInvalid(_) => 2,
            Error::ValidationFailed { .. } => 3,
            Error::Geometry(_) => 4,
            Error::Store(_) => 5,
            Error::Condition(_) => 6,
            Error::Assemble(_) => 7,
            Error::Route(_) => 8,
            Error::DanglingEndpoint | Error::GraphInconsistent(_) => 9,
            Error::SubnetworkTooLarge(_) => 10,
            Error::SearchTimeout => 11,
            Error::Cancelled => 12,
            Error::ScorerUnavailable => 13,
            Error::BackfillUnavailable(_) => 14,
            Error::ExporterFailed(_) => 15,
            Error::Internal(_) => 1,
        }
    }
}
