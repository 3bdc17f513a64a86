use serde_json::Value;
use thiserror::Error;

use crate::path::ValuePath;

/// Errors raised by the generic mapping utilities.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    /// An `extend_only` merge tried to replace an existing leaf.
    #[error("merge conflict at {path}: refusing to replace {existing} with {incoming}")]
    MergeConflict {
        path: ValuePath,
        existing: Value,
        incoming: Value,
    },
    /// An element-wise modifier was applied to something that is not a sequence.
    #[error("modifier for '{key}' expects a sequence, found {found}")]
    NotASequence { key: String, found: &'static str },
    /// A per-key operation was applied to something that is not a mapping.
    #[error("expected a mapping at {path}, found {found}")]
    NotAMapping { path: ValuePath, found: &'static str },
}

/// Convenience alias for mapping results.
pub type Result<T> = std::result::Result<T, MappingError>;
