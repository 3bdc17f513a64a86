//! Contract declaration and value synthesis for datapact.
//!
//! A [`Schema`] declares the shape of a data structure once. A
//! [`Synthesizer`] turns it into [`ContractInstance`]s holding realistic
//! values, regenerates them, and applies override trees on top of them.

pub mod errors;
pub mod faker_rs;
pub mod instance;
pub mod json_schema;
pub mod model;
pub mod synth;
pub mod validate;

mod overrides;

pub use errors::SchemaError;
pub use faker_rs::{FakeCategory, FakeProvider, FakeRsProvider, LocaleKey};
pub use instance::{ContractInstance, FieldValue, TimestampValue};
pub use json_schema::{contract_json_schema, load_contract, validate_contract_json};
pub use model::{
    CollectionSpec, DefaultProducer, EnumSpec, Field, FieldKind, IntSpec, Mode, NestedSpec,
    NumberSpec, Schema, SchemaBuilder, StringSpec, TimestampSpec,
};
pub use synth::{SynthOptions, Synthesizer};
