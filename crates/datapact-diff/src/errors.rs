use thiserror::Error;

use crate::model::DiffResult;

#[derive(Debug, Error)]
pub enum DiffError {
    /// The compared trees diverge; displays the full report.
    #[error("{0}")]
    Mismatch(DiffResult),
    #[error("invalid rule pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl DiffError {
    /// Changes carried by a mismatch.
    pub fn result(&self) -> Option<&DiffResult> {
        match self {
            DiffError::Mismatch(result) => Some(result),
            DiffError::InvalidPattern { .. } => None,
        }
    }
}
