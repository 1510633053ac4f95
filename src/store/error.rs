use uuid::Uuid;

use crate::impl_err;

/// §4.2 failure modes.
#[derive(Debug)]
pub enum StoreError {
    ValidationFailed { field: String, reason: String },
    Conflict(Uuid),
    Frozen,
    NotOpen,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::ValidationFailed { field, reason } => {
                write!(f, "validation failed for {field}: {reason}")
            }
            StoreError::Conflict(uuid) => write!(f, "conflicting identity: {uuid}"),
            StoreError::Frozen => write!(f, "workspace is frozen, write rejected"),
            StoreError::NotOpen => write!(f, "workspace is not open"),
        }
    }
}

impl std::error::Error for StoreError {}

impl_err!(StoreError, Store);
