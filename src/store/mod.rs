//! §4.2: the staging workspace each pipeline run owns exclusively.

pub mod error;
pub mod workspace;

pub use error::StoreError;
pub use workspace::{Workspace, WorkspaceOptions};
