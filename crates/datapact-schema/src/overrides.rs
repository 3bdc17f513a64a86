use datapact_core::{ValuePath, ValueType};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::SchemaError;
use crate::instance::{ContractInstance, FieldValue};
use crate::model::{Field, FieldKind, Mode};
use crate::synth::{Synthesizer, unknown_field};

impl Synthesizer {
    /// Returns a copy of `instance` with `overrides` applied on top of it.
    ///
    /// Keys must name declared output keys at every level. Nested schemas take
    /// mappings recursively, collections take sequences positionally, untyped
    /// mappings shallow-merge; any other value replaces the field. The
    /// original instance is never modified.
    pub fn with_values(
        &mut self,
        instance: &ContractInstance,
        overrides: &Value,
    ) -> Result<ContractInstance, SchemaError> {
        let Value::Object(overrides) = overrides else {
            return Err(SchemaError::InvalidOverride {
                path: ValuePath::root(),
                found: ValueType::of(overrides).as_str(),
            });
        };
        debug!(schema = %instance.name(), keys = overrides.len(), "applying overrides");
        let mut updated = instance.clone();
        self.apply_overrides(&mut updated, overrides, &ValuePath::root())?;
        Ok(updated)
    }

    fn apply_overrides(
        &mut self,
        instance: &mut ContractInstance,
        overrides: &Map<String, Value>,
        path: &ValuePath,
    ) -> Result<(), SchemaError> {
        let schema = std::sync::Arc::clone(instance.schema());
        let mode = instance.mode();
        for (key, incoming) in overrides {
            let field_path = path.key(key);
            let Some((idx, field)) = schema.field(key) else {
                return Err(unknown_field(&schema, field_path));
            };
            let current = instance.values[idx].take();
            let value = self.override_field(field, current, incoming, mode, &field_path)?;
            instance.values[idx] = Some(value);
        }
        Ok(())
    }

    fn override_field(
        &mut self,
        field: &Field,
        current: Option<FieldValue>,
        incoming: &Value,
        mode: Mode,
        path: &ValuePath,
    ) -> Result<FieldValue, SchemaError> {
        match (&field.kind, incoming) {
            (FieldKind::Mapping, Value::Object(incoming)) => {
                let mut merged = match current {
                    Some(FieldValue::Plain(Value::Object(existing))) => existing,
                    _ => Map::new(),
                };
                for (key, value) in incoming {
                    merged.insert(key.clone(), value.clone());
                }
                Ok(FieldValue::Plain(Value::Object(merged)))
            }
            (FieldKind::Schema(spec), Value::Object(incoming)) => {
                let mut nested = match current {
                    Some(FieldValue::Nested(nested)) => nested,
                    _ => self.nested(&spec.schema, mode, path)?,
                };
                self.apply_overrides(&mut nested, incoming, path)?;
                Ok(FieldValue::Nested(nested))
            }
            (
                FieldKind::Collection(spec) | FieldKind::UniqueCollection(spec),
                Value::Array(incoming),
            ) => {
                let mut existing = match current {
                    Some(FieldValue::Items(items)) => items.into_iter(),
                    _ => Vec::new().into_iter(),
                };
                let mut items = Vec::with_capacity(incoming.len());
                for (idx, item) in incoming.iter().enumerate() {
                    let element = self.override_field(
                        &spec.element_field_kind,
                        existing.next(),
                        item,
                        mode,
                        &path.index(idx),
                    )?;
                    items.push(element);
                }
                Ok(FieldValue::Items(items))
            }
            (_, other) => Ok(FieldValue::Plain(other.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Schema;
    use serde_json::json;
    use std::sync::Arc;

    fn address() -> Arc<Schema> {
        Schema::builder("Address")
            .field(Field::string("street"))
            .field(Field::string("zip"))
            .build()
            .unwrap()
    }

    fn customer() -> Arc<Schema> {
        Schema::builder("Customer")
            .field(Field::uuid("id"))
            .field(Field::string("name"))
            .field(Field::nested("address", address()))
            .field(Field::mapping("meta").with_default(json!({"source": "web"})))
            .field(Field::collection("tags", FieldKind::String(Default::default())).sized(2, 2))
            .build()
            .unwrap()
    }

    #[test]
    fn replaces_only_named_fields() {
        let mut synth = Synthesizer::seeded(1);
        let instance = synth.instantiate(&customer(), Mode::Partial).unwrap();
        let before = instance.value();

        let updated = synth
            .with_values(&instance, &json!({"name": "Ada"}))
            .unwrap();
        let after = updated.value();

        assert_eq!(after["name"], json!("Ada"));
        for key in ["id", "address", "meta", "tags"] {
            assert_eq!(after[key], before[key], "{key} changed");
        }
        assert_eq!(instance.value(), before);
    }

    #[test]
    fn nested_overrides_recurse() {
        let mut synth = Synthesizer::seeded(2);
        let instance = synth.instantiate(&customer(), Mode::Partial).unwrap();
        let street = instance.value()["address"]["street"].clone();

        let updated = synth
            .with_values(&instance, &json!({"address": {"zip": "01001-000"}}))
            .unwrap();
        let address = &updated.value()["address"];
        assert_eq!(address["zip"], json!("01001-000"));
        assert_eq!(address["street"], street);
    }

    #[test]
    fn mapping_overrides_shallow_merge() {
        let mut synth = Synthesizer::seeded(3);
        let instance = synth.instantiate(&customer(), Mode::Partial).unwrap();
        let updated = synth
            .with_values(&instance, &json!({"meta": {"campaign": "spring"}}))
            .unwrap();
        assert_eq!(
            updated.value()["meta"],
            json!({"source": "web", "campaign": "spring"})
        );
    }

    #[test]
    fn collection_overrides_are_positional() {
        let mut synth = Synthesizer::seeded(4);
        let instance = synth.instantiate(&customer(), Mode::Partial).unwrap();
        let updated = synth
            .with_values(&instance, &json!({"tags": ["vip", "beta", "late"]}))
            .unwrap();
        assert_eq!(updated.value()["tags"], json!(["vip", "beta", "late"]));
    }

    #[test]
    fn unknown_keys_are_rejected_with_their_path() {
        let mut synth = Synthesizer::seeded(5);
        let instance = synth.instantiate(&customer(), Mode::Partial).unwrap();

        let err = synth
            .with_values(&instance, &json!({"address": {"country": "BR"}}))
            .unwrap_err();
        match err {
            SchemaError::UnknownField { schema, path, .. } => {
                assert_eq!(schema, "Address");
                assert_eq!(path.to_string(), "address.country");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = synth.with_values(&instance, &json!(["name"])).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidOverride { .. }));
    }
}
