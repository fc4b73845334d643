//! The `SCHEMA` rule: whole-response structure checks.
//!
//! `SCHEMA:json_schema` validates the full response against the item's
//! schema; the per-leaf fan-out lives in [`crate::schema`]. `SCHEMA:list`
//! only requires a JSON array.

use serde_json::Value;

use super::Input;
use crate::language::Language;
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs, SchemaMode};
use crate::schema;
use crate::types::{Verdict, SCHEMA_RULE_PREFIX};

pub fn register(builder: &mut RegistryBuilder) {
    builder.add_whole_response(SCHEMA_RULE_PREFIX, Language::Generic, ArgShape::Schema, schema_rule);
}

pub fn schema_rule(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let data = match schema::parse_response(input.response) {
        Ok(data) => data,
        Err(e) => return Ok(Verdict::fail(format!("JSON parse failed: {}", e))),
    };
    match args.schema_mode()? {
        SchemaMode::List => Ok(match data {
            Value::Array(items) => Verdict::pass(format!("response is a JSON list of {} items", items.len())),
            other => Verdict::fail(format!("response is JSON but not a list ({})", json_kind(&other))),
        }),
        SchemaMode::JsonSchema => {
            let schema = input
                .schema
                .ok_or_else(|| PredicateError::Schema("item has no json_schema".to_string()))?;
            let data = schema::coerce_to_schema(data, schema);
            let errors = schema::conformance_errors(schema, &data)
                .map_err(|e| PredicateError::Schema(e.to_string()))?;
            if errors.is_empty() {
                Ok(Verdict::pass("response conforms to the JSON schema"))
            } else {
                Ok(Verdict::fail(format!(
                    "response does not conform to the JSON schema: {}",
                    errors.join("; ")
                )))
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
