//! Core value-tree helpers for datapact.
//!
//! This crate defines the path and type vocabulary shared by the schema and
//! diff crates, plus the generic mapping utilities both of them build on.
//! Everything here operates on plain `serde_json::Value` trees.

pub mod error;
pub mod kind;
pub mod mapping;
pub mod path;

pub use error::{MappingError, Result};
pub use kind::ValueType;
pub use mapping::{
    Filter, KeyModifiers, Matcher, MergeOptions, Modifier, Pattern, Transform, apply_modifier,
    exclude_nulls, filter_dict, matches_pattern, merge_with_updates, normalize, normalize_refs,
    select_matching,
};
pub use path::{PathSegment, ValuePath};

/// Identity key used when aligning sequences of mappings.
pub const DEFAULT_IDENTITY_KEY: &str = "id";
