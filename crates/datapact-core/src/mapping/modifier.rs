use std::fmt;

use serde_json::Value;

use crate::error::{MappingError, Result};
use crate::kind::ValueType;
use crate::path::ValuePath;

/// Owned value transform.
pub type Transform = Box<dyn Fn(Value) -> Value + Send + Sync>;

enum KeyModifier {
    Apply(Transform),
    Each(Transform),
}

/// Per-key transforms, applied to the matching entries of a mapping.
#[derive(Default)]
pub struct KeyModifiers {
    entries: Vec<(String, KeyModifier)>,
}

impl KeyModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform the whole value stored under `key`.
    pub fn apply<F>(mut self, key: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.entries
            .push((key.into(), KeyModifier::Apply(Box::new(transform))));
        self
    }

    /// Transform every element of the sequence stored under `key`.
    pub fn each<F>(mut self, key: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.entries
            .push((key.into(), KeyModifier::Each(Box::new(transform))));
        self
    }
}

/// Modifier spec accepted by [`apply_modifier`].
pub enum Modifier {
    /// Receives and returns the entire subject.
    Whole(Transform),
    Keys(KeyModifiers),
}

impl Modifier {
    pub fn whole<F>(transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Modifier::Whole(Box::new(transform))
    }
}

impl From<KeyModifiers> for Modifier {
    fn from(value: KeyModifiers) -> Self {
        Modifier::Keys(value)
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Whole(_) => f.write_str("Modifier::Whole"),
            Modifier::Keys(keys) => f
                .debug_list()
                .entries(keys.entries.iter().map(|(key, _)| key))
                .finish(),
        }
    }
}

/// Apply `modifier` to a copy of `subject`.
///
/// Keys named by a [`KeyModifiers`] spec but absent from the subject are skipped.
pub fn apply_modifier(subject: &Value, modifier: &Modifier) -> Result<Value> {
    let keys = match modifier {
        Modifier::Whole(transform) => return Ok(transform(subject.clone())),
        Modifier::Keys(keys) => keys,
    };

    let Value::Object(map) = subject else {
        return Err(MappingError::NotAMapping {
            path: ValuePath::root(),
            found: ValueType::of(subject).as_str(),
        });
    };

    let mut map = map.clone();
    for (key, key_modifier) in &keys.entries {
        let Some(current) = map.get_mut(key) else {
            continue;
        };
        match key_modifier {
            KeyModifier::Apply(transform) => {
                *current = transform(current.take());
            }
            KeyModifier::Each(transform) => {
                let found = ValueType::of(current).as_str();
                let Value::Array(items) = current else {
                    return Err(MappingError::NotASequence {
                        key: key.clone(),
                        found,
                    });
                };
                for item in items.iter_mut() {
                    *item = transform(item.take());
                }
            }
        }
    }
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upper(value: Value) -> Value {
        match value {
            Value::String(text) => Value::String(text.to_uppercase()),
            other => other,
        }
    }

    #[test]
    fn whole_modifier_receives_subject() {
        let modifier = Modifier::whole(|value| json!({"wrapped": value}));
        let result = apply_modifier(&json!(1), &modifier).expect("modify");
        assert_eq!(result, json!({"wrapped": 1}));
    }

    #[test]
    fn per_key_and_element_wise_transforms() {
        let subject = json!({"name": "ana", "tags": ["a", "b"], "age": 3});
        let modifier: Modifier = KeyModifiers::new()
            .apply("name", upper)
            .each("tags", upper)
            .apply("missing", |_| json!("never"))
            .into();
        let result = apply_modifier(&subject, &modifier).expect("modify");
        assert_eq!(result, json!({"name": "ANA", "tags": ["A", "B"], "age": 3}));
    }

    #[test]
    fn element_wise_on_scalar_fails() {
        let modifier: Modifier = KeyModifiers::new().each("age", upper).into();
        let result = apply_modifier(&json!({"age": 3}), &modifier);
        assert!(matches!(
            result,
            Err(MappingError::NotASequence { ref key, found: "integer" }) if key == "age"
        ));
    }
}
