//! Errors raised while building one station's report.

use thiserror::Error;

use crate::render::TemplateError;
use crate::store::StoreError;

/// Failure of a single station's pipeline. Never aborts the batch.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{0}")]
    DataStoreUnavailable(StoreError),
    #[error("normals unavailable: {0}")]
    NormalsUnavailable(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("assembly inconsistency: {0}")]
    AssemblyInconsistency(String),
}

impl From<StoreError> for BuildError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NormalsUnavailable(msg) => BuildError::NormalsUnavailable(msg),
            other => BuildError::DataStoreUnavailable(other),
        }
    }
}
