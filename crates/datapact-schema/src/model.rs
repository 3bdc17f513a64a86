use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SchemaError;
use crate::faker_rs::FakeCategory;
use crate::validate::validate_schema;

pub const DEFAULT_INT_MIN: i64 = 0;
pub const DEFAULT_INT_MAX: i64 = 9999;
pub const DEFAULT_TEXT_MIN: usize = 1;
pub const DEFAULT_TEXT_MAX: usize = 32;
pub const DEFAULT_DECIMAL_PLACES: u32 = 2;
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Generation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Only required, non-nullable fields.
    #[default]
    Partial,
    /// Every declared field.
    Full,
}

/// Zero-argument producer evaluated each time a field value is computed.
#[derive(Clone)]
pub struct DefaultProducer(Arc<dyn Fn() -> Value + Send + Sync>);

impl DefaultProducer {
    pub fn new<F>(producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(producer))
    }

    pub fn produce(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for DefaultProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultProducer(<fn>)")
    }
}

/// A single field declaration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Key under which the value is emitted; unset fields are not emitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,
    /// Included in partial generation.
    #[serde(default = "default_true")]
    pub required: bool,
    /// Excluded from partial generation.
    #[serde(default)]
    pub nullable: bool,
    /// Static value used instead of synthesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_source: Option<Value>,
    #[serde(skip)]
    #[schemars(skip)]
    pub producer: Option<DefaultProducer>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

fn default_true() -> bool {
    true
}

impl Field {
    pub fn new(output_key: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            output_key: Some(output_key.into()),
            required: true,
            nullable: false,
            default_source: None,
            producer: None,
            kind,
        }
    }

    /// Field without an output key, used as a collection element declaration.
    pub fn element(kind: FieldKind) -> Self {
        Self {
            output_key: None,
            ..Self::new(String::new(), kind)
        }
    }

    pub fn boolean(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Boolean)
    }

    pub fn integer(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Integer(IntSpec::default()))
    }

    pub fn integer_in(key: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(key, FieldKind::Integer(IntSpec::default().range(min, max)))
    }

    pub fn float(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Float(NumberSpec::default()))
    }

    /// Decimal with `integer_digits` digits before and `fractional_digits` after the point.
    pub fn decimal(key: impl Into<String>, integer_digits: u32, fractional_digits: u32) -> Self {
        Self::new(
            key,
            FieldKind::Decimal(NumberSpec::default().digits(integer_digits, fractional_digits)),
        )
    }

    pub fn string(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::String(StringSpec::default()))
    }

    pub fn uuid(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Uuid)
    }

    pub fn timestamp(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Timestamp(TimestampSpec::default()))
    }

    pub fn enumerated<I, V>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(key, FieldKind::Enumerated(EnumSpec::new(values)))
    }

    pub fn mapping(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Mapping)
    }

    pub fn nested(key: impl Into<String>, schema: Arc<Schema>) -> Self {
        Self::new(key, FieldKind::Schema(NestedSpec { schema }))
    }

    pub fn collection(key: impl Into<String>, element: FieldKind) -> Self {
        Self::new(key, FieldKind::Collection(CollectionSpec::of(element)))
    }

    pub fn unique_collection(key: impl Into<String>, element: FieldKind) -> Self {
        Self::new(key, FieldKind::UniqueCollection(CollectionSpec::of(element)))
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Keep the field in the declaration without emitting it.
    pub fn hidden(mut self) -> Self {
        self.output_key = None;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_source = Some(value.into());
        self
    }

    pub fn with_producer<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.producer = Some(DefaultProducer::new(producer));
        self
    }

    /// Replace the collection size bounds; no effect on other kinds.
    pub fn sized(mut self, min_len: usize, max_len: usize) -> Self {
        if let FieldKind::Collection(spec) | FieldKind::UniqueCollection(spec) = &mut self.kind {
            spec.min_len = min_len;
            spec.max_len = max_len;
        }
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.output_key.as_deref()
    }

    pub fn included_in(&self, mode: Mode) -> bool {
        match mode {
            Mode::Partial => self.required && !self.nullable,
            Mode::Full => true,
        }
    }

    pub fn has_default(&self) -> bool {
        self.producer.is_some() || self.default_source.is_some()
    }
}

/// Field kinds with their type-specific constraints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldKind {
    Boolean,
    Integer(IntSpec),
    Float(NumberSpec),
    Decimal(NumberSpec),
    String(StringSpec),
    Uuid,
    Timestamp(TimestampSpec),
    Enumerated(EnumSpec),
    /// Untyped mapping; overrides merge into it instead of replacing it.
    Mapping,
    Schema(NestedSpec),
    Collection(CollectionSpec),
    UniqueCollection(CollectionSpec),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Boolean => "boolean",
            FieldKind::Integer(_) => "integer",
            FieldKind::Float(_) => "float",
            FieldKind::Decimal(_) => "decimal",
            FieldKind::String(_) => "string",
            FieldKind::Uuid => "uuid",
            FieldKind::Timestamp(_) => "timestamp",
            FieldKind::Enumerated(_) => "enumerated",
            FieldKind::Mapping => "mapping",
            FieldKind::Schema(_) => "schema",
            FieldKind::Collection(_) => "collection",
            FieldKind::UniqueCollection(_) => "uniqueCollection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntSpec {
    #[serde(default = "default_int_min")]
    pub min_val: i64,
    #[serde(default = "default_int_max")]
    pub max_val: i64,
    #[serde(default)]
    pub positive_only: bool,
}

fn default_int_min() -> i64 {
    DEFAULT_INT_MIN
}

fn default_int_max() -> i64 {
    DEFAULT_INT_MAX
}

impl Default for IntSpec {
    fn default() -> Self {
        Self {
            min_val: DEFAULT_INT_MIN,
            max_val: DEFAULT_INT_MAX,
            positive_only: false,
        }
    }
}

impl IntSpec {
    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.min_val = min;
        self.max_val = max;
        self
    }

    pub fn positive(mut self) -> Self {
        self.positive_only = true;
        self
    }
}

/// Constraints shared by `float` and `decimal` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NumberSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integer_digits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fractional_digits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_val: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_val: Option<f64>,
    #[serde(default)]
    pub positive_only: bool,
}

impl NumberSpec {
    pub fn digits(mut self, integer_digits: u32, fractional_digits: u32) -> Self {
        self.integer_digits = Some(integer_digits);
        self.fractional_digits = Some(fractional_digits);
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min_val = Some(min);
        self.max_val = Some(max);
        self
    }

    pub fn positive(mut self) -> Self {
        self.positive_only = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StringSpec {
    #[serde(default = "default_text_min")]
    pub min_len: usize,
    #[serde(default = "default_text_max")]
    pub max_len: usize,
    /// Realistic-data category; inferred from the output key when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fake_provider_name: Option<FakeCategory>,
}

fn default_text_min() -> usize {
    DEFAULT_TEXT_MIN
}

fn default_text_max() -> usize {
    DEFAULT_TEXT_MAX
}

impl Default for StringSpec {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_TEXT_MIN,
            max_len: DEFAULT_TEXT_MAX,
            fake_provider_name: None,
        }
    }
}

impl StringSpec {
    pub fn length(mut self, min_len: usize, max_len: usize) -> Self {
        self.min_len = min_len;
        self.max_len = max_len;
        self
    }

    pub fn provider(mut self, category: FakeCategory) -> Self {
        self.fake_provider_name = Some(category);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimestampSpec {
    /// strftime pattern used to render the instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_pattern: Option<String>,
    /// IANA timezone name; UTC when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl TimestampSpec {
    pub fn format(mut self, pattern: impl Into<String>) -> Self {
        self.format_pattern = Some(pattern.into());
        self
    }

    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn pattern(&self) -> &str {
        self.format_pattern
            .as_deref()
            .unwrap_or(DEFAULT_TIMESTAMP_FORMAT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnumSpec {
    pub values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_values: Vec<Value>,
}

impl EnumSpec {
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            excluded_values: Vec::new(),
        }
    }

    pub fn excluding<I, V>(mut self, excluded: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.excluded_values
            .extend(excluded.into_iter().map(Into::into));
        self
    }

    /// Declared values minus the excluded ones, in declaration order.
    pub fn candidates(&self) -> Vec<&Value> {
        self.values
            .iter()
            .filter(|value| !self.excluded_values.contains(value))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NestedSpec {
    pub schema: Arc<Schema>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSpec {
    pub element_field_kind: Box<Field>,
    #[serde(default = "default_collection_len")]
    pub min_len: usize,
    #[serde(default = "default_collection_len")]
    pub max_len: usize,
}

fn default_collection_len() -> usize {
    1
}

impl CollectionSpec {
    pub fn of(element: FieldKind) -> Self {
        Self {
            element_field_kind: Box::new(Field::element(element)),
            min_len: 1,
            max_len: 1,
        }
    }
}

/// Named, ordered set of field declarations.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Position and declaration of the field emitted under `key`.
    pub fn field(&self, key: &str) -> Option<(usize, &Field)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, field)| field.key() == Some(key))
    }

    pub fn output_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(Field::key)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        validate_schema(self)
    }
}

/// Registers field declarations in order and validates the result.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn build(self) -> Result<Arc<Schema>, SchemaError> {
        let schema = Schema {
            name: self.name,
            fields: self.fields,
        };
        schema.validate()?;
        Ok(Arc::new(schema))
    }
}
