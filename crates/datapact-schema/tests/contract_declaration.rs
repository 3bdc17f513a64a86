use std::fs;
use std::path::Path;

use serde_json::{Value, json};

use datapact_schema::{
    FakeCategory, Field, FieldKind, Mode, Schema, SchemaError, Synthesizer, contract_json_schema,
    load_contract, validate_contract_json,
};

fn load_json(path: &Path) -> Value {
    let contents =
        fs::read_to_string(path).unwrap_or_else(|_| panic!("missing json at {}", path.display()));
    serde_json::from_str(&contents).expect("parse json")
}

fn order_contract() -> Value {
    load_json(&Path::new(env!("CARGO_MANIFEST_DIR")).join("../../contracts/order.contract.json"))
}

#[test]
fn sample_contract_validates_and_loads() {
    let contract = order_contract();
    validate_contract_json(&contract).expect("contract matches json schema");

    let schema = load_contract(&contract).expect("load contract");
    assert_eq!(schema.name, "Order");
    assert_eq!(
        schema.output_keys().collect::<Vec<_>>(),
        vec![
            "id", "status", "total", "createdAt", "note", "customer", "items", "tags", "channel",
            "extra"
        ]
    );
    match &schema.field("note").expect("note").1.kind {
        FieldKind::String(spec) => {
            assert_eq!(spec.max_len, 80);
            assert_eq!(spec.min_len, 1);
            assert_eq!(spec.fake_provider_name, Some(FakeCategory::Sentence));
        }
        other => panic!("unexpected kind {}", other.name()),
    }
}

#[test]
fn sample_contract_generates_a_plausible_order() {
    let schema = load_contract(&order_contract()).expect("load contract");
    let mut synth = Synthesizer::seeded(21);
    let value = synth.instantiate(&schema, Mode::Partial).expect("instantiate").value();

    assert!(value.get("note").is_none());
    assert!(value.get("extra").is_none());
    assert_eq!(value["channel"], json!("web"));
    assert_ne!(value["status"], json!("void"));
    assert!(value["total"].as_f64().expect("number") > 0.0);
    assert!(value["customer"].get("vip").is_none());
    let items = value["items"].as_array().expect("items");
    assert!((1..=3).contains(&items.len()));
    for item in items {
        assert_eq!(item["sku"].as_str().map(str::len), Some(8));
        assert!((1..=5).contains(&item["qty"].as_i64().expect("qty")));
    }
    let tags = value["tags"].as_array().expect("tags");
    assert_eq!(tags.len(), 2);
    assert_ne!(tags[0], tags[1]);
}

#[test]
fn malformed_contracts_are_reported() {
    let contract = json!({
        "name": "Broken",
        "fields": [{ "outputKey": "when", "kind": "sundial" }]
    });
    let err = validate_contract_json(&contract).unwrap_err();
    assert!(matches!(err, SchemaError::ContractFormat(_)));

    let contract = json!({
        "name": "Broken",
        "fields": [{ "outputKey": "qty", "kind": "integer", "minVal": 9, "maxVal": 1 }]
    });
    let err = load_contract(&contract).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidDeclaration { .. }));
}

#[test]
fn declarations_round_trip_through_the_catalog_format() {
    let schema = Schema::builder("Ticket")
        .field(Field::integer_in("seat", 1, 40))
        .field(Field::decimal("price", 4, 2).optional())
        .field(Field::enumerated("class", ["economy", "business"]))
        .build()
        .expect("valid schema");

    let encoded = serde_json::to_value(schema.as_ref()).expect("serialize");
    assert_eq!(
        encoded["fields"][0],
        json!({
            "outputKey": "seat",
            "required": true,
            "nullable": false,
            "kind": "integer",
            "minVal": 1,
            "maxVal": 40,
            "positiveOnly": false
        })
    );
    assert_eq!(encoded["fields"][1]["kind"], json!("decimal"));
    assert_eq!(encoded["fields"][1]["integerDigits"], json!(4));
    validate_contract_json(&encoded).expect("builder output matches json schema");

    let decoded = load_contract(&encoded).expect("reload");
    assert_eq!(decoded.fields.len(), 3);
    assert!(!decoded.fields[1].required);
}

#[test]
fn json_schema_names_every_field_kind() {
    let schema = serde_json::to_string(&contract_json_schema()).expect("serialize schema");
    for kind in [
        "boolean",
        "integer",
        "float",
        "decimal",
        "string",
        "uuid",
        "timestamp",
        "enumerated",
        "mapping",
        "schema",
        "collection",
        "uniqueCollection",
    ] {
        assert!(schema.contains(&format!("\"{kind}\"")), "missing kind {kind}");
    }
}
