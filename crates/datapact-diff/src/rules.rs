use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use datapact_core::{DEFAULT_IDENTITY_KEY, PathSegment, ValuePath, normalize_refs};
use regex::Regex;
use serde_json::Value;

use crate::errors::DiffError;

/// Named equivalence predicate over (expected, actual).
///
/// A rule registered for a path replaces the default comparison of the whole
/// subtree at that path.
pub trait Rule: Send + Sync {
    fn name(&self) -> String;
    fn check(&self, expected: &Value, actual: &Value) -> bool;
}

impl<R: Rule + ?Sized> Rule for Box<R> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn check(&self, expected: &Value, actual: &Value) -> bool {
        (**self).check(expected, actual)
    }
}

/// Both sides are non-null.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotNull;

impl Rule for NotNull {
    fn name(&self) -> String {
        "not_null".to_string()
    }

    fn check(&self, expected: &Value, actual: &Value) -> bool {
        !expected.is_null() && !actual.is_null()
    }
}

/// The two sides differ.
#[derive(Debug, Clone, Copy, Default)]
pub struct Changed;

impl Rule for Changed {
    fn name(&self) -> String {
        "changed".to_string()
    }

    fn check(&self, expected: &Value, actual: &Value) -> bool {
        expected != actual
    }
}

/// Both sides are canonical hyphenated UUID strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidShape;

fn uuid_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
            )
            .ok()
        })
        .as_ref()
}

impl Rule for UuidShape {
    fn name(&self) -> String {
        "uuid_shape".to_string()
    }

    fn check(&self, expected: &Value, actual: &Value) -> bool {
        let Some(pattern) = uuid_pattern() else {
            return false;
        };
        [expected, actual]
            .iter()
            .all(|value| value.as_str().is_some_and(|text| pattern.is_match(text)))
    }
}

/// Sequences hold the same elements in any order.
///
/// Mapping elements are paired by identity keys before comparison.
#[derive(Debug, Clone)]
pub struct UnorderedEq {
    identity_keys: Vec<String>,
}

impl Default for UnorderedEq {
    fn default() -> Self {
        Self {
            identity_keys: vec![DEFAULT_IDENTITY_KEY.to_string()],
        }
    }
}

impl UnorderedEq {
    pub fn by_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identity_keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Rule for UnorderedEq {
    fn name(&self) -> String {
        "unordered_eq".to_string()
    }

    fn check(&self, expected: &Value, actual: &Value) -> bool {
        match (expected, actual) {
            (Value::Array(expected), Value::Array(actual)) => {
                expected.len() == actual.len()
                    && normalize_refs(actual, expected, &self.identity_keys)
                        .into_iter()
                        .zip(expected)
                        .all(|(actual, expected)| actual == expected)
            }
            (expected, actual) => expected == actual,
        }
    }
}

/// Numbers equal after rounding to a fixed number of places.
///
/// Numeric strings are accepted on either side.
#[derive(Debug, Clone, Copy)]
pub struct DecimalEq {
    places: u32,
}

impl DecimalEq {
    pub fn new(places: u32) -> Self {
        Self { places }
    }
}

impl Rule for DecimalEq {
    fn name(&self) -> String {
        format!("decimal_eq({})", self.places)
    }

    fn check(&self, expected: &Value, actual: &Value) -> bool {
        let (Some(expected), Some(actual)) = (numeric(expected), numeric(actual)) else {
            return false;
        };
        let factor = 10_f64.powi(self.places as i32);
        (expected * factor).round() == (actual * factor).round()
    }
}

/// Numbers within an absolute tolerance of each other.
#[derive(Debug, Clone, Copy)]
pub struct WithinTolerance {
    tolerance: f64,
}

impl WithinTolerance {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }
}

impl Rule for WithinTolerance {
    fn name(&self) -> String {
        format!("within_tolerance({})", self.tolerance)
    }

    fn check(&self, expected: &Value, actual: &Value) -> bool {
        let (Some(expected), Some(actual)) = (numeric(expected), numeric(actual)) else {
            return false;
        };
        (expected - actual).abs() <= self.tolerance + f64::EPSILON * expected.abs().max(1.0)
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Timestamps at most `window` apart.
///
/// Accepts RFC 3339 strings and naive `YYYY-MM-DD[T ]HH:MM:SS[.f]` strings,
/// the latter read as UTC.
#[derive(Debug, Clone, Copy)]
pub struct TimestampWithin {
    window: Duration,
}

impl TimestampWithin {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn second() -> Self {
        Self::new(Duration::seconds(1))
    }

    pub fn minute() -> Self {
        Self::new(Duration::minutes(1))
    }

    pub fn hour() -> Self {
        Self::new(Duration::hours(1))
    }

    pub fn day() -> Self {
        Self::new(Duration::days(1))
    }
}

impl Rule for TimestampWithin {
    fn name(&self) -> String {
        format!("timestamp_within({}s)", self.window.num_seconds())
    }

    fn check(&self, expected: &Value, actual: &Value) -> bool {
        let (Some(expected), Some(actual)) = (parse_instant(expected), parse_instant(actual))
        else {
            return false;
        };
        (expected - actual).abs() <= self.window
    }
}

fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// Rule backed by a closure.
pub struct FnRule {
    name: String,
    predicate: Box<dyn Fn(&Value, &Value) -> bool + Send + Sync>,
}

impl FnRule {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }
}

impl fmt::Debug for FnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule").field("name", &self.name).finish()
    }
}

impl Rule for FnRule {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn check(&self, expected: &Value, actual: &Value) -> bool {
        (self.predicate)(expected, actual)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Key(String),
    Index(usize),
    AnyKey,
    AnyIndex,
}

/// Path selector for rules: `a.b[0].c`, with `*` for any key and `[*]` for
/// any index. Awkward keys are written as bracketed JSON strings
/// (`["a.b"]`, `["say \"hi\""]`), the way [`ValuePath`] renders them; the
/// empty pattern selects the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    pub fn parse(source: &str) -> Result<Self, DiffError> {
        let invalid = |message: &str| DiffError::InvalidPattern {
            pattern: source.to_string(),
            message: message.to_string(),
        };
        let chars: Vec<char> = source.chars().collect();
        let mut segments = Vec::new();
        let mut pos = 0;
        while pos < chars.len() {
            match chars[pos] {
                '[' if chars.get(pos + 1) == Some(&'"') => {
                    let end = quoted_end(&chars, pos + 1)
                        .ok_or_else(|| invalid("unterminated quoted key"))?;
                    if chars.get(end + 1) != Some(&']') {
                        return Err(invalid("quoted key must be followed by ']'"));
                    }
                    let literal: String = chars[pos + 1..=end].iter().collect();
                    let key = serde_json::from_str::<String>(&literal)
                        .map_err(|_| invalid("malformed quoted key"))?;
                    segments.push(PatternSegment::Key(key));
                    pos = end + 2;
                }
                '[' => {
                    let close = chars[pos..]
                        .iter()
                        .position(|ch| *ch == ']')
                        .map(|offset| pos + offset)
                        .ok_or_else(|| invalid("unclosed '['"))?;
                    let inner: String = chars[pos + 1..close].iter().collect();
                    let segment = if inner == "*" {
                        PatternSegment::AnyIndex
                    } else {
                        let index = inner
                            .parse::<usize>()
                            .map_err(|_| invalid("index must be a number or '*'"))?;
                        PatternSegment::Index(index)
                    };
                    segments.push(segment);
                    pos = close + 1;
                }
                '.' => {
                    if segments.is_empty() || pos + 1 >= chars.len() {
                        return Err(invalid("empty key"));
                    }
                    pos += 1;
                    if chars[pos] == '.' || chars[pos] == '[' {
                        return Err(invalid("empty key"));
                    }
                }
                _ => {
                    let end = chars[pos..]
                        .iter()
                        .position(|ch| *ch == '.' || *ch == '[')
                        .map_or(chars.len(), |offset| pos + offset);
                    let key: String = chars[pos..end].iter().collect();
                    segments.push(if key == "*" {
                        PatternSegment::AnyKey
                    } else {
                        PatternSegment::Key(key)
                    });
                    pos = end;
                }
            }
        }
        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &ValuePath) -> bool {
        path.len() == self.segments.len()
            && self
                .segments
                .iter()
                .zip(path.segments())
                .all(|(pattern, segment)| match (pattern, segment) {
                    (PatternSegment::AnyKey, PathSegment::Key(_)) => true,
                    (PatternSegment::AnyIndex, PathSegment::Index(_)) => true,
                    (PatternSegment::Key(wanted), PathSegment::Key(key)) => wanted == key,
                    (PatternSegment::Index(wanted), PathSegment::Index(index)) => wanted == index,
                    _ => false,
                })
    }

    /// Concrete path up to the first wildcard.
    pub fn literal_prefix(&self) -> ValuePath {
        let mut path = ValuePath::root();
        for segment in &self.segments {
            path = match segment {
                PatternSegment::Key(key) => path.key(key),
                PatternSegment::Index(index) => path.index(*index),
                PatternSegment::AnyKey | PatternSegment::AnyIndex => break,
            };
        }
        path
    }
}

/// Index of the closing quote of the JSON string literal opening at `open`.
fn quoted_end(chars: &[char], open: usize) -> Option<usize> {
    let mut escaped = false;
    for (idx, ch) in chars.iter().enumerate().skip(open + 1) {
        match *ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(idx),
            _ => {}
        }
    }
    None
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Rules registered for one comparison, in registration order.
///
/// When several patterns match a path, the first registered wins.
#[derive(Default)]
pub struct RuleSet {
    entries: Vec<(PathPattern, Box<dyn Rule>)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pattern: &str, rule: impl Rule + 'static) -> Result<Self, DiffError> {
        self.add(pattern, rule)?;
        Ok(self)
    }

    pub fn add(&mut self, pattern: &str, rule: impl Rule + 'static) -> Result<(), DiffError> {
        let pattern = PathPattern::parse(pattern)?;
        self.entries.push((pattern, Box::new(rule)));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn find(&self, path: &ValuePath) -> Option<(usize, &dyn Rule)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, (pattern, _))| pattern.matches(path))
            .map(|(idx, (_, rule))| (idx, rule.as_ref()))
    }

    pub(crate) fn matching<'a>(
        &'a self,
        path: &'a ValuePath,
    ) -> impl Iterator<Item = usize> + 'a {
        self.entries
            .iter()
            .enumerate()
            .filter(move |(_, (pattern, _))| pattern.matches(path))
            .map(|(idx, _)| idx)
    }

    pub(crate) fn entry(&self, idx: usize) -> Option<(&PathPattern, &dyn Rule)> {
        self.entries
            .get(idx)
            .map(|(pattern, rule)| (pattern, rule.as_ref()))
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .iter()
                    .map(|(pattern, rule)| format!("{pattern} => {}", rule.name())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patterns_match_literal_and_wildcard_paths() {
        let path = ValuePath::root().key("order").key("items").index(2).key("sku");
        for pattern in ["order.items[2].sku", "order.items[*].sku", "*.items[*].*"] {
            assert!(PathPattern::parse(pattern).unwrap().matches(&path), "{pattern}");
        }
        for pattern in ["order.items[1].sku", "order.items.sku", "order[*]", "order"] {
            assert!(!PathPattern::parse(pattern).unwrap().matches(&path), "{pattern}");
        }
        assert!(PathPattern::parse("").unwrap().matches(&ValuePath::root()));
        let dotted = ValuePath::root().key("a.b").key("c");
        assert!(PathPattern::parse("[\"a.b\"].c").unwrap().matches(&dotted));
    }

    #[test]
    fn rendered_paths_read_back_as_patterns() {
        let path = ValuePath::root()
            .key("say \"hi\"")
            .index(0)
            .key("c:\\tmp")
            .key("a]b")
            .key("*")
            .key("plain");
        let pattern = PathPattern::parse(&path.to_string()).unwrap();
        assert!(pattern.matches(&path), "{path}");
        assert_eq!(pattern.literal_prefix(), path);
        assert!(!pattern.matches(&path.key("x")));
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        for pattern in [
            "items[", "items[x]", "a..b", ".a", "a.", "[\"open", "[\"a\"x]", "[\"bad\\q\"]",
        ] {
            assert!(
                matches!(PathPattern::parse(pattern), Err(DiffError::InvalidPattern { .. })),
                "{pattern}"
            );
        }
    }

    #[test]
    fn literal_prefix_stops_at_wildcards() {
        let pattern = PathPattern::parse("items[*].sku").unwrap();
        assert_eq!(pattern.literal_prefix().to_string(), "items");
        let pattern = PathPattern::parse("missing").unwrap();
        assert_eq!(pattern.literal_prefix().to_string(), "missing");
    }

    #[test]
    fn builtin_rules() {
        assert!(NotNull.check(&json!(1), &json!("x")));
        assert!(!NotNull.check(&json!(1), &Value::Null));

        assert!(Changed.check(&json!("a"), &json!("b")));
        assert!(!Changed.check(&json!("a"), &json!("a")));

        assert!(UuidShape.check(
            &json!("5f1d7c2e-8a4b-4c3d-9e2f-0a1b2c3d4e5f"),
            &json!("00000000-0000-4000-8000-000000000000")
        ));
        assert!(!UuidShape.check(&json!("5f1d7c2e"), &json!("00000000-0000-4000-8000-000000000000")));

        assert!(DecimalEq::new(2).check(&json!(10.004), &json!("10.00")));
        assert!(!DecimalEq::new(2).check(&json!(10.004), &json!(10.01)));

        assert!(WithinTolerance::new(0.01).check(&json!(99.99), &json!(99.994)));
        assert!(!WithinTolerance::new(0.01).check(&json!(99.99), &json!(100.5)));
        assert!(!WithinTolerance::new(0.01).check(&json!(99.99), &json!(null)));
    }

    #[test]
    fn unordered_equality_pairs_by_identity() {
        let rule = UnorderedEq::default();
        assert!(rule.check(&json!([1, 2, 3]), &json!([3, 1, 2])));
        assert!(!rule.check(&json!([1, 2, 3]), &json!([3, 1])));
        assert!(rule.check(
            &json!([{"id": 1, "v": "a"}, {"id": 2, "v": "b"}]),
            &json!([{"id": 2, "v": "b"}, {"id": 1, "v": "a"}])
        ));
        assert!(!rule.check(
            &json!([{"id": 1, "v": "a"}, {"id": 2, "v": "b"}]),
            &json!([{"id": 2, "v": "b"}, {"id": 1, "v": "z"}])
        ));
    }

    #[test]
    fn unordered_equality_without_identity_keys() {
        let rule = UnorderedEq::default();
        assert!(rule.check(
            &json!([{"sku": "x"}, {"sku": "y"}]),
            &json!([{"sku": "y"}, {"sku": "x"}])
        ));
        assert!(rule.check(
            &json!([{"sku": "x"}, {"sku": "x"}, {"sku": "y"}]),
            &json!([{"sku": "y"}, {"sku": "x"}, {"sku": "x"}])
        ));
        assert!(!rule.check(
            &json!([{"sku": "x"}, {"sku": "x"}]),
            &json!([{"sku": "x"}, {"sku": "y"}])
        ));
    }

    #[test]
    fn timestamp_windows() {
        let expected = json!("2024-05-01T10:00:00.000+00:00");
        assert!(TimestampWithin::second().check(&expected, &json!("2024-05-01T07:00:00.400-03:00")));
        assert!(!TimestampWithin::second().check(&expected, &json!("2024-05-01T10:00:02Z")));
        assert!(TimestampWithin::minute().check(&expected, &json!("2024-05-01 10:00:45")));
        assert!(TimestampWithin::hour().check(&expected, &json!("2024-05-01T10:59:00Z")));
        assert!(TimestampWithin::day().check(&expected, &json!("2024-04-30T11:00:00Z")));
        assert!(!TimestampWithin::day().check(&expected, &json!("yesterday")));
    }
}
