use std::fmt;

use serde_json::{Map, Value};

/// Entry filter for [`filter_dict`].
pub enum Filter {
    /// Drop entries equal to this value.
    Value(Value),
    /// Keep only entries satisfying the predicate.
    Keep(Box<dyn Fn(&Value) -> bool + Send + Sync>),
}

impl Filter {
    pub fn keep<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Filter::Keep(Box::new(predicate))
    }

    fn drops(&self, value: &Value) -> bool {
        match self {
            Filter::Value(unwanted) => unwanted == value,
            Filter::Keep(predicate) => !predicate(value),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Filter::Keep(_) => f.write_str("Keep(<predicate>)"),
        }
    }
}

/// Recursively drop mapping entries rejected by `filter`.
///
/// Descends into nested mappings, including mappings held inside sequences.
/// Sequence elements themselves are never dropped.
pub fn filter_dict(subject: &Value, filter: &Filter) -> Value {
    match subject {
        Value::Object(map) => {
            let mut kept = Map::new();
            for (key, value) in map {
                if filter.drops(value) {
                    continue;
                }
                kept.insert(key.clone(), filter_dict(value, filter));
            }
            Value::Object(kept)
        }
        Value::Array(items) => Value::Array(items.iter().map(|item| filter_dict(item, filter)).collect()),
        other => other.clone(),
    }
}

/// Recursively drop mapping entries whose value is null.
pub fn exclude_nulls(subject: &Value) -> Value {
    filter_dict(subject, &Filter::Value(Value::Null))
}
