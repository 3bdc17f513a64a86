use std::sync::Arc;

use datapact_diff::{ChangeKind, DiffOptions, RuleSet, UuidShape, compare};
use datapact_schema::{Field, FieldKind, Mode, NestedSpec, Schema, Synthesizer};
use serde_json::json;

fn order() -> Arc<Schema> {
    let line = Schema::builder("Line")
        .field(Field::uuid("id"))
        .field(Field::integer_in("qty", 1, 9))
        .build()
        .unwrap();
    Schema::builder("Order")
        .field(Field::uuid("id"))
        .field(Field::string("reference"))
        .field(
            Field::collection("lines", FieldKind::Schema(NestedSpec { schema: line })).sized(3, 3),
        )
        .build()
        .unwrap()
}

#[test]
fn override_shows_up_as_single_change() {
    let mut synth = Synthesizer::seeded(11);
    let instance = synth.instantiate(&order(), Mode::Partial).unwrap();
    let updated = synth
        .with_values(&instance, &json!({"reference": "ORD-1"}))
        .unwrap();

    let result = compare(
        &instance.value(),
        &updated.value(),
        &RuleSet::new(),
        &DiffOptions::default(),
    );
    assert_eq!(result.len(), 1);
    let change = &result.changes()[0];
    assert_eq!(change.path.to_string(), "reference");
    assert!(matches!(change.kind, ChangeKind::ValueChanged { .. }));
}

#[test]
fn regenerated_ids_pass_shape_rules() {
    let mut synth = Synthesizer::seeded(12);
    let schema = order();
    let first = synth.instantiate(&schema, Mode::Partial).unwrap();
    let mut second = first.clone();
    synth.regenerate_field(&mut second, "id").unwrap();

    let rules = RuleSet::new().with("id", UuidShape).unwrap();
    let result = compare(&first.value(), &second.value(), &rules, &DiffOptions::default());
    assert!(result.is_empty(), "{result}");
}

#[test]
fn shuffled_lines_match_after_normalization() {
    let mut synth = Synthesizer::seeded(13);
    let instance = synth.instantiate(&order(), Mode::Partial).unwrap();
    let expected = instance.value();
    let mut actual = expected.clone();
    if let Some(lines) = actual["lines"].as_array_mut() {
        lines.reverse();
    }

    let plain = compare(&expected, &actual, &RuleSet::new(), &DiffOptions::default());
    assert!(!plain.is_empty());

    let normalized = compare(&expected, &actual, &RuleSet::new(), &DiffOptions::normalized());
    assert!(normalized.is_empty(), "{normalized}");
}
