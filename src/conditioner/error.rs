use uuid::Uuid;

use crate::geo::GeoError;
use crate::impl_err;
use crate::store::StoreError;

/// §4.3 failure modes. `SplitDegenerate` and `UnsplittableLoop` are
/// per-point failures the caller counts and logs (§7), not propagated;
/// the `Geometry`/`Store` variants cover the genuinely fatal paths.
#[derive(Debug)]
pub enum ConditionError {
    SplitDegenerate { trail: Uuid, reason: String },
    UnsplittableLoop { trail: Uuid },
    Geometry(GeoError),
    Store(StoreError),
}

impl std::fmt::Display for ConditionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionError::SplitDegenerate { trail, reason } => {
                write!(f, "split of trail {trail} is degenerate: {reason}")
            }
            ConditionError::UnsplittableLoop { trail } => {
                write!(f, "trail {trail} is a loop and cannot be split by a single point")
            }
            ConditionError::Geometry(e) => write!(f, "{e}"),
            ConditionError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConditionError {}

impl From<GeoError> for ConditionError {
    fn from(value: GeoError) -> Self {
        ConditionError::Geometry(value)
    }
}

impl From<StoreError> for ConditionError {
    fn from(value: StoreError) -> Self {
        ConditionError::Store(value)
    }
}

impl_err!(ConditionError, Condition);
