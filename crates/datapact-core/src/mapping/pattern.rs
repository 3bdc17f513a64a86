use std::fmt;

use serde_json::{Map, Value};

type Predicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// Expectation for a single pattern key: equality or a predicate.
pub enum Matcher {
    Equals(Value),
    Satisfies(Predicate),
}

impl Matcher {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Matcher::Equals(expected) => expected == value,
            Matcher::Satisfies(predicate) => predicate(value),
        }
    }
}

impl From<Value> for Matcher {
    fn from(value: Value) -> Self {
        Matcher::Equals(value)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Equals(value) => f.debug_tuple("Equals").field(value).finish(),
            Matcher::Satisfies(_) => f.write_str("Satisfies(<predicate>)"),
        }
    }
}

/// Subset pattern over a mapping.
///
/// Every pattern key must exist in the subject and match; subject keys absent
/// from the pattern are ignored.
#[derive(Debug, Default)]
pub struct Pattern {
    entries: Vec<(String, Matcher)>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.push((key.into(), Matcher::Equals(value)));
        self
    }

    pub fn satisfies<F>(mut self, key: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.entries
            .push((key.into(), Matcher::Satisfies(Box::new(predicate))));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl From<&Map<String, Value>> for Pattern {
    fn from(map: &Map<String, Value>) -> Self {
        Self {
            entries: map
                .iter()
                .map(|(key, value)| (key.clone(), Matcher::Equals(value.clone())))
                .collect(),
        }
    }
}

/// Returns true when `subject` is a mapping satisfying every entry of `pattern`.
pub fn matches_pattern(subject: &Value, pattern: &Pattern) -> bool {
    let Value::Object(map) = subject else {
        return false;
    };
    pattern
        .entries
        .iter()
        .all(|(key, matcher)| map.get(key).is_some_and(|value| matcher.matches(value)))
}

/// Returns the elements of `items` matching `pattern`, in order.
pub fn select_matching<'a>(items: &'a [Value], pattern: &Pattern) -> Vec<&'a Value> {
    items
        .iter()
        .filter(|item| matches_pattern(item, pattern))
        .collect()
}
