//! Structural comparison of value trees for datapact.
//!
//! [`compare`] walks an expected and an actual tree in lock-step and records
//! every divergence as a [`Change`]. Per-path [`Rule`]s replace the default
//! equality check, and sequences can be aligned by identity before they are
//! compared. [`ensure_match`] turns a non-empty result into an error carrying
//! the rendered report.

pub mod engine;
pub mod errors;
pub mod model;
pub mod report;
pub mod rules;

pub use engine::{DiffOptions, compare, ensure_match};
pub use errors::DiffError;
pub use model::{Change, ChangeKind, DiffResult};
pub use report::render_report;
pub use rules::{
    Changed, DecimalEq, FnRule, NotNull, PathPattern, Rule, RuleSet, TimestampWithin,
    UnorderedEq, UuidShape, WithinTolerance,
};
