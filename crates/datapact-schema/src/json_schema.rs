use std::sync::Arc;

use jsonschema::JSONSchema;
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde_json::Value;

use crate::errors::SchemaError;
use crate::model::Schema;

/// Emit the JSON Schema for hand-authored contract declarations.
pub fn contract_json_schema() -> RootSchema {
    schema_for!(Schema)
}

/// Check a contract document against [`contract_json_schema`].
///
/// Every violation is reported, each prefixed with its JSON pointer.
pub fn validate_contract_json(contract: &Value) -> Result<(), SchemaError> {
    let schema = serde_json::to_value(contract_json_schema())?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| SchemaError::ContractFormat(err.to_string()))?;

    if let Err(errors) = compiled.validate(contract) {
        let issues: Vec<String> = errors
            .map(|error| {
                let pointer = error.instance_path.to_string();
                let pointer = if pointer.is_empty() { "/".to_string() } else { pointer };
                format!("{pointer}: {error}")
            })
            .collect();
        return Err(SchemaError::ContractFormat(issues.join("; ")));
    }
    Ok(())
}

/// Parse and validate a contract document into a shareable declaration.
pub fn load_contract(contract: &Value) -> Result<Arc<Schema>, SchemaError> {
    validate_contract_json(contract)?;
    let schema: Schema = serde_json::from_value(contract.clone())?;
    schema.validate()?;
    Ok(Arc::new(schema))
}
