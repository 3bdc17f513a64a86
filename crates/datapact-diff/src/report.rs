use std::fmt::Write as _;

use serde_json::Value;

use crate::model::{ChangeKind, DiffResult};

const MAX_VALUE_CHARS: usize = 120;

/// Render a deterministic, path-annotated text report.
///
/// The first line counts changes per kind in order of first appearance;
/// every following line describes one change.
pub fn render_report(result: &DiffResult) -> String {
    if result.is_empty() {
        return "no differences".to_string();
    }

    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for change in result {
        let name = change.kind.name();
        match counts.iter_mut().find(|(kind, _)| *kind == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name, 1)),
        }
    }

    let mut out = String::new();
    let summary: Vec<String> = counts
        .iter()
        .map(|(kind, count)| format!("{count} {kind}"))
        .collect();
    let noun = if result.len() == 1 { "difference" } else { "differences" };
    let _ = writeln!(out, "{} {noun}: {}", result.len(), summary.join(", "));

    for change in result {
        let path = &change.path;
        let line = match &change.kind {
            ChangeKind::TypeChanged {
                expected_type,
                actual_type,
                expected,
                actual,
            } => format!(
                "type_changed at {path}: {expected_type} {} -> {actual_type} {}",
                short(expected),
                short(actual)
            ),
            ChangeKind::ValueChanged { expected, actual } => format!(
                "value_changed at {path}: {} -> {}",
                short(expected),
                short(actual)
            ),
            ChangeKind::DictItemAdded { actual } => {
                format!("dict_item_added at {path}: {}", short(actual))
            }
            ChangeKind::DictItemRemoved { expected } => {
                format!("dict_item_removed at {path}: {}", short(expected))
            }
            ChangeKind::IterableItemAdded { actual } => {
                format!("iterable_item_added at {path}: {}", short(actual))
            }
            ChangeKind::IterableItemRemoved { expected } => {
                format!("iterable_item_removed at {path}: {}", short(expected))
            }
            ChangeKind::RulesViolated {
                rule,
                expected,
                actual,
            } => format!(
                "rules_violated at {path} [{rule}]: expected {}, actual {}",
                short(expected),
                short(actual)
            ),
            ChangeKind::RulesUnapplied { rule, pattern } => {
                format!("rules_unapplied for '{pattern}': {rule} matched no path")
            }
        };
        let _ = writeln!(out, "  {line}");
    }
    out.truncate(out.trim_end().len());
    out
}

fn short(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= MAX_VALUE_CHARS {
        return rendered;
    }
    let mut cut: String = rendered.chars().take(MAX_VALUE_CHARS).collect();
    cut.push_str("...");
    cut
}
