use std::collections::HashSet;

use chrono::format::{Item, StrftimeItems};

use crate::errors::SchemaError;
use crate::model::{CollectionSpec, Field, FieldKind, Schema, StringSpec, TimestampSpec};
use crate::synth::primitives::{int_bounds, number_bounds, resolve_timezone, string_bounds};

/// Validate a declaration tree before it is used for synthesis.
///
/// Checks duplicate output keys, inverted bounds, empty enumerations and
/// unusable timestamp formats or timezones, recursing into nested schemas and
/// collection elements.
pub fn validate_schema(schema: &Schema) -> Result<(), SchemaError> {
    validate_fields(schema, &schema.name)
}

fn validate_fields(schema: &Schema, ctx: &str) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in &schema.fields {
        let field_ctx = format!("{ctx}.{}", field.key().unwrap_or("<hidden>"));
        if let Some(key) = field.key() {
            if key.is_empty() {
                return Err(SchemaError::declaration(field_ctx, "outputKey must not be empty"));
            }
            if !seen.insert(key) {
                return Err(SchemaError::declaration(
                    field_ctx,
                    format!("duplicate outputKey '{key}'"),
                ));
            }
        }
        validate_field(field, &field_ctx)?;
    }
    Ok(())
}

fn validate_field(field: &Field, ctx: &str) -> Result<(), SchemaError> {
    match &field.kind {
        FieldKind::Boolean | FieldKind::Uuid | FieldKind::Mapping => Ok(()),
        FieldKind::Integer(spec) => int_bounds(spec, ctx).map(|_| ()),
        FieldKind::Float(spec) => number_bounds(spec, false, ctx).map(|_| ()),
        FieldKind::Decimal(spec) => number_bounds(spec, true, ctx).map(|_| ()),
        FieldKind::String(spec) => validate_string(spec, ctx),
        FieldKind::Timestamp(spec) => validate_timestamp(spec, ctx),
        FieldKind::Enumerated(spec) => {
            if spec.candidates().is_empty() && !field.has_default() {
                return Err(SchemaError::declaration(
                    ctx,
                    "enumeration has no values left after exclusions",
                ));
            }
            Ok(())
        }
        FieldKind::Schema(spec) => validate_fields(&spec.schema, ctx),
        FieldKind::Collection(spec) | FieldKind::UniqueCollection(spec) => {
            validate_collection(spec, ctx)
        }
    }
}

fn validate_string(spec: &StringSpec, ctx: &str) -> Result<(), SchemaError> {
    string_bounds(spec, ctx).map(|_| ())
}

fn validate_timestamp(spec: &TimestampSpec, ctx: &str) -> Result<(), SchemaError> {
    if StrftimeItems::new(spec.pattern()).any(|item| matches!(item, Item::Error)) {
        return Err(SchemaError::declaration(
            ctx,
            format!("invalid formatPattern '{}'", spec.pattern()),
        ));
    }
    resolve_timezone(spec, ctx).map(|_| ())
}

fn validate_collection(spec: &CollectionSpec, ctx: &str) -> Result<(), SchemaError> {
    if spec.min_len > spec.max_len {
        return Err(SchemaError::declaration(ctx, "minLen must be <= maxLen"));
    }
    validate_field(&spec.element_field_kind, &format!("{ctx}[]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EnumSpec, IntSpec, NumberSpec};

    fn expect_invalid(result: Result<std::sync::Arc<Schema>, SchemaError>, needle: &str) {
        match result {
            Err(SchemaError::InvalidDeclaration { context, message }) => {
                assert!(
                    message.contains(needle) || context.contains(needle),
                    "unexpected error: {context}: {message}"
                );
            }
            other => panic!("expected invalid declaration, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_output_keys_are_rejected() {
        let result = Schema::builder("User")
            .field(Field::string("name"))
            .field(Field::integer("name"))
            .build();
        expect_invalid(result, "duplicate outputKey");
    }

    #[test]
    fn inverted_integer_bounds_are_rejected() {
        let result = Schema::builder("Item")
            .field(Field::new("qty", FieldKind::Integer(IntSpec::default().range(10, 1))))
            .build();
        expect_invalid(result, "Item.qty");
    }

    #[test]
    fn decimal_bounds_outside_digit_cap_are_rejected() {
        let spec = NumberSpec::default().digits(2, 2).range(500.0, 900.0);
        let result = Schema::builder("Price")
            .field(Field::new("amount", FieldKind::Decimal(spec)))
            .build();
        expect_invalid(result, "minVal");
    }

    #[test]
    fn fully_excluded_enumeration_is_rejected() {
        let spec = EnumSpec::new(["a", "b"]).excluding(["a", "b"]);
        let result = Schema::builder("Order")
            .field(Field::new("status", FieldKind::Enumerated(spec)))
            .build();
        expect_invalid(result, "no values left");
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let spec = TimestampSpec::default().timezone("Mars/Olympus");
        let result = Schema::builder("Event")
            .field(Field::new("at", FieldKind::Timestamp(spec)))
            .build();
        expect_invalid(result, "Mars/Olympus");
    }

    #[test]
    fn nested_and_element_declarations_are_checked() {
        let inner = Schema {
            name: "Inner".to_string(),
            fields: vec![Field::new(
                "code",
                FieldKind::String(StringSpec::default().length(5, 2)),
            )],
        };
        let result = Schema::builder("Outer")
            .field(Field::nested("inner", std::sync::Arc::new(inner)))
            .build();
        expect_invalid(result, "Outer.inner.code");

        let result = Schema::builder("Outer")
            .field(Field::collection("tags", FieldKind::String(StringSpec::default())).sized(3, 1))
            .build();
        expect_invalid(result, "minLen");
    }
}
