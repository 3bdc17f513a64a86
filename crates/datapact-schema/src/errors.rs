use datapact_core::{MappingError, ValuePath};
use thiserror::Error;

/// Errors emitted while declaring, synthesizing, or overriding contracts.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid declaration at {context}: {message}")]
    InvalidDeclaration { context: String, message: String },
    #[error("unknown field '{path}' for schema '{schema}' (declared: {declared})")]
    UnknownField {
        schema: String,
        path: ValuePath,
        declared: String,
    },
    #[error("invalid override at {path}: expected a mapping, found {found}")]
    InvalidOverride { path: ValuePath, found: &'static str },
    #[error("no distinct element for {path} after {attempts} attempts")]
    UniqueExhausted { path: ValuePath, attempts: u32 },
    #[error("contract does not match the declaration format: {0}")]
    ContractFormat(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),
}

impl SchemaError {
    pub(crate) fn declaration(context: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::InvalidDeclaration {
            context: context.into(),
            message: message.into(),
        }
    }
}
