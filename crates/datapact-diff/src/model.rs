use std::fmt;

use datapact_core::{ValuePath, ValueType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::report::render_report;

/// What diverged at a path, with the values involved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    TypeChanged {
        expected_type: ValueType,
        actual_type: ValueType,
        expected: Value,
        actual: Value,
    },
    ValueChanged {
        expected: Value,
        actual: Value,
    },
    DictItemAdded {
        actual: Value,
    },
    DictItemRemoved {
        expected: Value,
    },
    IterableItemAdded {
        actual: Value,
    },
    IterableItemRemoved {
        expected: Value,
    },
    RulesViolated {
        rule: String,
        expected: Value,
        actual: Value,
    },
    /// A registered rule matched no path of either tree.
    RulesUnapplied {
        rule: String,
        pattern: String,
    },
}

impl ChangeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChangeKind::TypeChanged { .. } => "type_changed",
            ChangeKind::ValueChanged { .. } => "value_changed",
            ChangeKind::DictItemAdded { .. } => "dict_item_added",
            ChangeKind::DictItemRemoved { .. } => "dict_item_removed",
            ChangeKind::IterableItemAdded { .. } => "iterable_item_added",
            ChangeKind::IterableItemRemoved { .. } => "iterable_item_removed",
            ChangeKind::RulesViolated { .. } => "rules_violated",
            ChangeKind::RulesUnapplied { .. } => "rules_unapplied",
        }
    }
}

/// One divergence between the expected and the actual tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub path: ValuePath,
    #[serde(flatten)]
    pub kind: ChangeKind,
}

impl Change {
    pub fn new(path: ValuePath, kind: ChangeKind) -> Self {
        Self { path, kind }
    }

    pub(crate) fn value_or_type(path: ValuePath, expected: &Value, actual: &Value) -> Self {
        let expected_type = ValueType::of(expected);
        let actual_type = ValueType::of(actual);
        let kind = if expected_type == actual_type {
            ChangeKind::ValueChanged {
                expected: expected.clone(),
                actual: actual.clone(),
            }
        } else {
            ChangeKind::TypeChanged {
                expected_type,
                actual_type,
                expected: expected.clone(),
                actual: actual.clone(),
            }
        };
        Self::new(path, kind)
    }

    pub fn expected(&self) -> Option<&Value> {
        match &self.kind {
            ChangeKind::TypeChanged { expected, .. }
            | ChangeKind::ValueChanged { expected, .. }
            | ChangeKind::DictItemRemoved { expected }
            | ChangeKind::IterableItemRemoved { expected }
            | ChangeKind::RulesViolated { expected, .. } => Some(expected),
            _ => None,
        }
    }

    pub fn actual(&self) -> Option<&Value> {
        match &self.kind {
            ChangeKind::TypeChanged { actual, .. }
            | ChangeKind::ValueChanged { actual, .. }
            | ChangeKind::DictItemAdded { actual }
            | ChangeKind::IterableItemAdded { actual }
            | ChangeKind::RulesViolated { actual, .. } => Some(actual),
            _ => None,
        }
    }
}

/// Ordered changes found by a comparison; empty when the trees match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffResult {
    changes: Vec<Change>,
}

impl DiffResult {
    pub fn new(changes: Vec<Change>) -> Self {
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    /// Changes of one kind, by [`ChangeKind::name`].
    pub fn of_kind<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Change> + 'a {
        self.changes
            .iter()
            .filter(move |change| change.kind.name() == name)
    }
}

impl<'a> IntoIterator for &'a DiffResult {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_report(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_kind_tag() {
        let change = Change::value_or_type(ValuePath::root().key("b"), &json!(1), &json!(3));
        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            json!({"path": ["b"], "kind": "value_changed", "expected": 1, "actual": 3})
        );

        let change = Change::value_or_type(ValuePath::root().key("b"), &json!(1), &json!("1"));
        let encoded = serde_json::to_value(&change).unwrap();
        assert_eq!(encoded["kind"], json!("type_changed"));
        assert_eq!(encoded["expected_type"], json!("integer"));
        assert_eq!(encoded["actual_type"], json!("string"));
    }

    #[test]
    fn exposes_both_sides() {
        let change = Change::new(
            ValuePath::root().key("a"),
            ChangeKind::DictItemAdded { actual: json!(2) },
        );
        assert_eq!(change.expected(), None);
        assert_eq!(change.actual(), Some(&json!(2)));
    }
}
