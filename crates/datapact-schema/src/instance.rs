use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use datapact_core::{MergeOptions, merge_with_updates};
use serde_json::{Map, Value};

use crate::errors::SchemaError;
use crate::model::{Field, Mode, Schema};

/// Synthesized instant kept alongside its rendering rules.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampValue {
    instant: DateTime<Utc>,
    format: String,
    timezone: Tz,
}

impl TimestampValue {
    pub fn new(instant: DateTime<Utc>, format: impl Into<String>, timezone: Tz) -> Self {
        Self {
            instant,
            format: format.into(),
            timezone,
        }
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Renders in the declared timezone.
    pub fn render(&self) -> String {
        self.render_in(self.timezone)
    }

    /// Renders the same instant in another timezone; the stored value is unchanged.
    pub fn render_in(&self, timezone: Tz) -> String {
        let local = self.instant.with_timezone(&timezone);
        let mut rendered = String::new();
        if write!(rendered, "{}", local.format(&self.format)).is_err() {
            return local.to_rfc3339_opts(SecondsFormat::Millis, false);
        }
        rendered
    }
}

/// Value held by one field of a [`ContractInstance`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Plain(Value),
    Timestamp(TimestampValue),
    Nested(ContractInstance),
    Items(Vec<FieldValue>),
}

impl FieldValue {
    /// Emits only the fields holding a value.
    pub fn value(&self) -> Value {
        self.emit(false)
    }

    /// Emits every declared key, using `null` where nothing is held.
    pub fn full_value(&self) -> Value {
        self.emit(true)
    }

    pub(crate) fn emit(&self, full: bool) -> Value {
        match self {
            FieldValue::Plain(value) => value.clone(),
            FieldValue::Timestamp(timestamp) => Value::String(timestamp.render()),
            FieldValue::Nested(instance) => instance.emit(full),
            FieldValue::Items(items) => Value::Array(items.iter().map(|item| item.emit(full)).collect()),
        }
    }
}

/// A schema instantiated with its own field values.
///
/// Instances own their values exclusively; cloning copies the whole tree.
#[derive(Debug, Clone)]
pub struct ContractInstance {
    schema: Arc<Schema>,
    mode: Mode,
    pub(crate) values: Vec<Option<FieldValue>>,
}

impl PartialEq for ContractInstance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) && self.mode == other.mode && self.values == other.values
    }
}

impl ContractInstance {
    /// Instance where no field holds a value.
    pub fn empty(schema: Arc<Schema>, mode: Mode) -> Self {
        let values = vec![None; schema.fields.len()];
        Self {
            schema,
            mode,
            values,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        let (idx, _) = self.schema.field(key)?;
        self.values.get(idx)?.as_ref()
    }

    /// Emitted value of the field under `key`.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.get(key).map(|value| value.emit(false))
    }

    pub fn timestamp(&self, key: &str) -> Option<&TimestampValue> {
        match self.get(key)? {
            FieldValue::Timestamp(timestamp) => Some(timestamp),
            _ => None,
        }
    }

    pub fn nested(&self, key: &str) -> Option<&ContractInstance> {
        match self.get(key)? {
            FieldValue::Nested(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Fields paired with whatever they currently hold, in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&Field, Option<&FieldValue>)> {
        self.schema
            .fields
            .iter()
            .zip(self.values.iter().map(Option::as_ref))
    }

    /// Emits a mapping of every field holding a value.
    pub fn value(&self) -> Value {
        self.emit(false)
    }

    /// Emits every declared output key, with `null` for fields without a value.
    pub fn full_value(&self) -> Value {
        self.emit(true)
    }

    /// Emits [`value`](Self::value) extended with undeclared `extra` keys.
    ///
    /// Declared keys may appear in `extra` only with the value they already have.
    pub fn value_extended(&self, extra: &Value) -> Result<Value, SchemaError> {
        Ok(merge_with_updates(
            &self.value(),
            extra,
            MergeOptions::extend_only(),
        )?)
    }

    pub(crate) fn emit(&self, full: bool) -> Value {
        let mut map = Map::new();
        for (field, value) in self.entries() {
            let Some(key) = field.key() else {
                continue;
            };
            match value {
                Some(value) => {
                    map.insert(key.to_string(), value.emit(full));
                }
                None if full => {
                    map.insert(key.to_string(), Value::Null);
                }
                None => {}
            }
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn schema() -> Arc<Schema> {
        Schema::builder("Order")
            .field(Field::string("id"))
            .field(Field::string("note").nullable())
            .field(Field::string("secret").hidden())
            .build()
            .unwrap()
    }

    #[test]
    fn emits_only_held_values_unless_full() {
        let mut instance = ContractInstance::empty(schema(), Mode::Partial);
        instance.values[0] = Some(FieldValue::Plain(json!("o-1")));
        instance.values[2] = Some(FieldValue::Plain(json!("hush")));

        assert_eq!(instance.value(), json!({"id": "o-1"}));
        assert_eq!(instance.full_value(), json!({"id": "o-1", "note": null}));
        assert_eq!(instance.get_value("id"), Some(json!("o-1")));
        assert!(!instance.has_value("note"));
    }

    #[test]
    fn timestamp_renders_in_other_zones_without_mutation() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let timestamp = TimestampValue::new(instant, "%Y-%m-%d %H:%M %z", Tz::UTC);
        assert_eq!(timestamp.render(), "2024-03-01 12:00 +0000");
        assert_eq!(
            timestamp.render_in(chrono_tz::America::Sao_Paulo),
            "2024-03-01 09:00 -0300"
        );
        assert_eq!(timestamp.instant(), instant);
        assert_eq!(timestamp.render(), "2024-03-01 12:00 +0000");
    }

    #[test]
    fn extended_value_keeps_declared_keys() {
        let mut instance = ContractInstance::empty(schema(), Mode::Partial);
        instance.values[0] = Some(FieldValue::Plain(json!("o-1")));

        let extended = instance
            .value_extended(&json!({"trace": "abc", "id": "o-1"}))
            .unwrap();
        assert_eq!(extended, json!({"id": "o-1", "trace": "abc"}));

        let clash = instance.value_extended(&json!({"id": "other"}));
        assert!(matches!(clash, Err(SchemaError::Mapping(_))));
    }
}
