//! Generic recursive helpers over nested mapping/sequence trees.
//!
//! None of these know about schemas or diffs; both build on them.

mod filter;
mod merge;
mod modifier;
mod normalize;
mod pattern;

pub use filter::{Filter, exclude_nulls, filter_dict};
pub use merge::{MergeOptions, merge_with_updates};
pub use modifier::{KeyModifiers, Modifier, Transform, apply_modifier};
pub use normalize::{normalize, normalize_refs, same_identity};
pub use pattern::{Matcher, Pattern, matches_pattern, select_matching};
