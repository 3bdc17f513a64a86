//! Value synthesis for declared schemas.

pub(crate) mod primitives;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use datapact_core::ValuePath;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::errors::SchemaError;
use crate::faker_rs::{FakeCategory, FakeProvider, FakeRsProvider, LocaleKey};
use crate::instance::{ContractInstance, FieldValue, TimestampValue};
use crate::model::{CollectionSpec, Field, FieldKind, Mode, Schema};

pub const DEFAULT_UNIQUE_RETRIES: u32 = 100;
pub const DEFAULT_TIMESTAMP_WINDOW_DAYS: i64 = 30;

/// Knobs for a [`Synthesizer`].
#[derive(Debug, Clone)]
pub struct SynthOptions {
    /// Fixed RNG seed; drawn from OS entropy when unset.
    pub seed: Option<u64>,
    pub locale: LocaleKey,
    /// Infer a fake-data category from string output keys.
    pub infer_providers: bool,
    /// Attempts per element before a unique collection gives up.
    pub unique_retries: u32,
    pub timestamp_window: Duration,
    /// Upper end of the timestamp window; the creation time when unset.
    pub reference_time: Option<DateTime<Utc>>,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            seed: None,
            locale: LocaleKey::default(),
            infer_providers: true,
            unique_retries: DEFAULT_UNIQUE_RETRIES,
            timestamp_window: Duration::days(DEFAULT_TIMESTAMP_WINDOW_DAYS),
            reference_time: None,
        }
    }
}

/// Produces and regenerates [`ContractInstance`]s.
pub struct Synthesizer {
    rng: ChaCha8Rng,
    provider: Box<dyn FakeProvider>,
    options: SynthOptions,
    reference_time: DateTime<Utc>,
}

impl Synthesizer {
    pub fn new(options: SynthOptions) -> Self {
        let seed = options.seed.unwrap_or_else(rand::random::<u64>);
        let reference_time = options.reference_time.unwrap_or_else(Utc::now);
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            provider: Box::new(FakeRsProvider),
            options,
            reference_time,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(SynthOptions {
            seed: Some(seed),
            ..SynthOptions::default()
        })
    }

    pub fn with_provider(mut self, provider: impl FakeProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    pub fn options(&self) -> &SynthOptions {
        &self.options
    }

    /// New instance of `schema` with every field included in `mode` synthesized.
    pub fn instantiate(
        &mut self,
        schema: &Arc<Schema>,
        mode: Mode,
    ) -> Result<ContractInstance, SchemaError> {
        let mut instance = ContractInstance::empty(Arc::clone(schema), mode);
        self.generate(&mut instance, mode)?;
        Ok(instance)
    }

    /// Resets every field: included fields get fresh values, excluded ones none.
    ///
    /// On error the instance is left as it was.
    pub fn generate(
        &mut self,
        instance: &mut ContractInstance,
        mode: Mode,
    ) -> Result<(), SchemaError> {
        let schema = Arc::clone(instance.schema());
        debug!(schema = %schema.name, ?mode, fields = schema.fields.len(), "generating instance");
        let values = self.synthesize_fields(&schema, mode, &ValuePath::root())?;
        instance.values = values;
        instance.set_mode(mode);
        Ok(())
    }

    /// Replaces the value of a single field, synthesizing it in the instance's mode.
    pub fn regenerate_field(
        &mut self,
        instance: &mut ContractInstance,
        key: &str,
    ) -> Result<(), SchemaError> {
        let schema = Arc::clone(instance.schema());
        let Some((idx, field)) = schema.field(key) else {
            return Err(unknown_field(&schema, ValuePath::root().key(key)));
        };
        let value = self.synthesize(field, instance.mode(), &ValuePath::root().key(key))?;
        instance.values[idx] = Some(value);
        Ok(())
    }

    pub(crate) fn synthesize_fields(
        &mut self,
        schema: &Schema,
        mode: Mode,
        path: &ValuePath,
    ) -> Result<Vec<Option<FieldValue>>, SchemaError> {
        schema
            .fields
            .iter()
            .map(|field| {
                if !field.included_in(mode) {
                    return Ok(None);
                }
                let field_path = match field.key() {
                    Some(key) => path.key(key),
                    None => path.clone(),
                };
                self.synthesize(field, mode, &field_path).map(Some)
            })
            .collect()
    }

    pub(crate) fn synthesize(
        &mut self,
        field: &Field,
        mode: Mode,
        path: &ValuePath,
    ) -> Result<FieldValue, SchemaError> {
        if let Some(producer) = &field.producer {
            return Ok(FieldValue::Plain(producer.produce()));
        }
        if let Some(value) = &field.default_source {
            return Ok(FieldValue::Plain(value.clone()));
        }

        let ctx = path.to_string();
        let rng = &mut self.rng;
        let value = match &field.kind {
            FieldKind::Boolean => FieldValue::Plain(primitives::boolean(rng)),
            FieldKind::Integer(spec) => FieldValue::Plain(primitives::integer(spec, rng, &ctx)?),
            FieldKind::Float(spec) => {
                FieldValue::Plain(primitives::number(spec, false, rng, &ctx)?)
            }
            FieldKind::Decimal(spec) => {
                FieldValue::Plain(primitives::number(spec, true, rng, &ctx)?)
            }
            FieldKind::String(spec) => {
                let category = spec.fake_provider_name.or_else(|| {
                    if self.options.infer_providers {
                        field.key().and_then(FakeCategory::infer)
                    } else {
                        None
                    }
                });
                FieldValue::Plain(primitives::string(
                    spec,
                    category,
                    self.provider.as_ref(),
                    self.options.locale,
                    rng,
                    &ctx,
                )?)
            }
            FieldKind::Uuid => FieldValue::Plain(primitives::uuid(rng)),
            FieldKind::Timestamp(spec) => {
                let timezone = primitives::resolve_timezone(spec, &ctx)?;
                let instant =
                    primitives::instant(self.reference_time, self.options.timestamp_window, rng);
                FieldValue::Timestamp(TimestampValue::new(instant, spec.pattern(), timezone))
            }
            FieldKind::Enumerated(spec) => {
                FieldValue::Plain(primitives::enumerated(spec, rng, &ctx)?)
            }
            FieldKind::Mapping => FieldValue::Plain(primitives::mapping()),
            FieldKind::Schema(spec) => {
                FieldValue::Nested(self.nested(&spec.schema, mode, path)?)
            }
            FieldKind::Collection(spec) => {
                FieldValue::Items(self.collection(spec, false, mode, path)?)
            }
            FieldKind::UniqueCollection(spec) => {
                FieldValue::Items(self.collection(spec, true, mode, path)?)
            }
        };
        Ok(value)
    }

    pub(crate) fn nested(
        &mut self,
        schema: &Arc<Schema>,
        mode: Mode,
        path: &ValuePath,
    ) -> Result<ContractInstance, SchemaError> {
        let mut instance = ContractInstance::empty(Arc::clone(schema), mode);
        instance.values = self.synthesize_fields(schema, mode, path)?;
        Ok(instance)
    }

    fn collection(
        &mut self,
        spec: &CollectionSpec,
        unique: bool,
        mode: Mode,
        path: &ValuePath,
    ) -> Result<Vec<FieldValue>, SchemaError> {
        if spec.min_len > spec.max_len {
            return Err(SchemaError::declaration(
                path.to_string(),
                "minLen must be <= maxLen",
            ));
        }
        let len = self.rng.random_range(spec.min_len..=spec.max_len);
        let mut items = Vec::with_capacity(len);
        let mut emitted = Vec::with_capacity(if unique { len } else { 0 });
        for idx in 0..len {
            let item_path = path.index(idx);
            if !unique {
                items.push(self.synthesize(&spec.element_field_kind, mode, &item_path)?);
                continue;
            }
            let attempts = self.options.unique_retries.max(1);
            let mut accepted = None;
            for _ in 0..attempts {
                let candidate = self.synthesize(&spec.element_field_kind, mode, &item_path)?;
                let value = candidate.emit(mode == Mode::Full);
                if !emitted.contains(&value) {
                    emitted.push(value);
                    accepted = Some(candidate);
                    break;
                }
            }
            match accepted {
                Some(item) => items.push(item),
                None => {
                    warn!(path = %item_path, attempts, "unique collection exhausted");
                    return Err(SchemaError::UniqueExhausted {
                        path: item_path,
                        attempts,
                    });
                }
            }
        }
        Ok(items)
    }
}

pub(crate) fn unknown_field(schema: &Schema, path: ValuePath) -> SchemaError {
    SchemaError::UnknownField {
        schema: schema.name.clone(),
        path,
        declared: schema.output_keys().collect::<Vec<_>>().join(", "),
    }
}
