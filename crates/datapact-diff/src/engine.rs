use datapact_core::{DEFAULT_IDENTITY_KEY, ValuePath, normalize_refs};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::DiffError;
use crate::model::{Change, ChangeKind, DiffResult};
use crate::rules::RuleSet;

/// Comparison settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOptions {
    /// Align every pair of sequences by identity before comparing them.
    pub normalize: bool,
    /// Keys pairing mapping elements during normalization.
    pub identity_keys: Vec<String>,
    /// Report rules that matched no path of either tree.
    pub forbid_unapplied_rules: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            normalize: false,
            identity_keys: vec![DEFAULT_IDENTITY_KEY.to_string()],
            forbid_unapplied_rules: true,
        }
    }
}

impl DiffOptions {
    pub fn normalized() -> Self {
        Self {
            normalize: true,
            ..Self::default()
        }
    }

    pub fn with_identity_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identity_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn allow_unapplied_rules(mut self) -> Self {
        self.forbid_unapplied_rules = false;
        self
    }
}

/// Compare `actual` against `expected` and record every divergence.
pub fn compare(
    expected: &Value,
    actual: &Value,
    rules: &RuleSet,
    options: &DiffOptions,
) -> DiffResult {
    let mut walker = Walker {
        rules,
        options,
        applied: vec![false; rules.len()],
        changes: Vec::new(),
    };
    walker.walk(expected, actual, &ValuePath::root());
    walker.report_unapplied();

    let result = DiffResult::new(walker.changes);
    debug!(
        changes = result.len(),
        rules = rules.len(),
        normalize = options.normalize,
        "comparison finished"
    );
    result
}

/// Like [`compare`], but a non-empty result becomes [`DiffError::Mismatch`].
pub fn ensure_match(
    expected: &Value,
    actual: &Value,
    rules: &RuleSet,
    options: &DiffOptions,
) -> Result<(), DiffError> {
    let result = compare(expected, actual, rules, options);
    if result.is_empty() {
        Ok(())
    } else {
        Err(DiffError::Mismatch(result))
    }
}

struct Walker<'a> {
    rules: &'a RuleSet,
    options: &'a DiffOptions,
    applied: Vec<bool>,
    changes: Vec<Change>,
}

impl Walker<'_> {
    fn walk(&mut self, expected: &Value, actual: &Value, path: &ValuePath) {
        let rules = self.rules;
        if let Some((idx, rule)) = rules.find(path) {
            self.applied[idx] = true;
            if !rule.check(expected, actual) {
                self.changes.push(Change::new(
                    path.clone(),
                    ChangeKind::RulesViolated {
                        rule: rule.name(),
                        expected: expected.clone(),
                        actual: actual.clone(),
                    },
                ));
            }
            return;
        }

        match (expected, actual) {
            (Value::Object(expected), Value::Object(actual)) => {
                self.walk_mappings(expected, actual, path)
            }
            (Value::Array(expected), Value::Array(actual)) => {
                self.walk_sequences(expected, actual, path)
            }
            (expected, actual) if expected != actual => {
                self.changes
                    .push(Change::value_or_type(path.clone(), expected, actual));
            }
            _ => {}
        }
    }

    fn walk_mappings(
        &mut self,
        expected: &Map<String, Value>,
        actual: &Map<String, Value>,
        path: &ValuePath,
    ) {
        for (key, expected_value) in expected {
            let child = path.key(key);
            match actual.get(key) {
                Some(actual_value) => self.walk(expected_value, actual_value, &child),
                None => {
                    self.touch(expected_value, &child);
                    self.changes.push(Change::new(
                        child,
                        ChangeKind::DictItemRemoved {
                            expected: expected_value.clone(),
                        },
                    ));
                }
            }
        }
        for (key, actual_value) in actual {
            if expected.contains_key(key) {
                continue;
            }
            let child = path.key(key);
            self.touch(actual_value, &child);
            self.changes.push(Change::new(
                child,
                ChangeKind::DictItemAdded {
                    actual: actual_value.clone(),
                },
            ));
        }
    }

    fn walk_sequences(&mut self, expected: &[Value], actual: &[Value], path: &ValuePath) {
        let actual: Vec<&Value> = if self.options.normalize {
            normalize_refs(actual, expected, &self.options.identity_keys)
        } else {
            actual.iter().collect()
        };
        for idx in 0..expected.len().max(actual.len()) {
            let child = path.index(idx);
            match (expected.get(idx), actual.get(idx)) {
                (Some(expected_value), Some(actual_value)) => {
                    self.walk(expected_value, actual_value, &child)
                }
                (Some(expected_value), None) => {
                    self.touch(expected_value, &child);
                    self.changes.push(Change::new(
                        child,
                        ChangeKind::IterableItemRemoved {
                            expected: expected_value.clone(),
                        },
                    ));
                }
                (None, Some(actual_value)) => {
                    self.touch(actual_value, &child);
                    self.changes.push(Change::new(
                        child,
                        ChangeKind::IterableItemAdded {
                            actual: (*actual_value).clone(),
                        },
                    ));
                }
                (None, None) => {}
            }
        }
    }

    /// Marks rules for every path of a subtree present on one side only.
    fn touch(&mut self, value: &Value, path: &ValuePath) {
        if self.rules.is_empty() {
            return;
        }
        let rules = self.rules;
        for idx in rules.matching(path) {
            self.applied[idx] = true;
        }
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.touch(child, &path.key(key));
                }
            }
            Value::Array(items) => {
                for (idx, child) in items.iter().enumerate() {
                    self.touch(child, &path.index(idx));
                }
            }
            _ => {}
        }
    }

    fn report_unapplied(&mut self) {
        let rules = self.rules;
        for (idx, applied) in self.applied.iter().enumerate() {
            if *applied {
                continue;
            }
            let Some((pattern, rule)) = rules.entry(idx) else {
                continue;
            };
            if !self.options.forbid_unapplied_rules {
                debug!(pattern = %pattern, rule = %rule.name(), "rule matched no path");
                continue;
            }
            warn!(pattern = %pattern, rule = %rule.name(), "rule matched no path");
            self.changes.push(Change::new(
                pattern.literal_prefix(),
                ChangeKind::RulesUnapplied {
                    rule: rule.name(),
                    pattern: pattern.as_str().to_string(),
                },
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{NotNull, WithinTolerance};
    use serde_json::json;

    #[test]
    fn rules_on_one_sided_paths_count_as_applied() {
        let rules = RuleSet::new()
            .with("extra.code", NotNull)
            .unwrap();
        let result = compare(
            &json!({"a": 1}),
            &json!({"a": 1, "extra": {"code": 7}}),
            &rules,
            &DiffOptions::default(),
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result.changes()[0].kind.name(), "dict_item_added");
    }

    #[test]
    fn unapplied_rules_can_be_allowed() {
        let rules = RuleSet::new()
            .with("missing", WithinTolerance::new(1.0))
            .unwrap();
        let result = compare(
            &json!({"a": 1}),
            &json!({"a": 1}),
            &rules,
            &DiffOptions::default().allow_unapplied_rules(),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn root_rule_replaces_whole_comparison() {
        let rules = RuleSet::new().with("", NotNull).unwrap();
        let result = compare(
            &json!({"a": 1}),
            &json!([1, 2]),
            &rules,
            &DiffOptions::default(),
        );
        assert!(result.is_empty());
    }
}
