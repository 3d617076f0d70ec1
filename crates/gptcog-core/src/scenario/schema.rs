//! JSON Schema for scenario documents.
//!
//! The schema pins the exact document shape: four top-level keys, a single
//! `tokens.test` mapping, and two-key steps whose `data` holds only the
//! step-order number. Unknown keys are rejected at every level.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded scenario schema (loaded at compile time).
const SCENARIO_SCHEMA_JSON: &str = include_str!("../../schema/scenario.schema.json");

/// The scenario schema, compiled on first use.
static SCENARIO_VALIDATOR: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Scenario schema unavailable: {0}")]
    Unavailable(String),
}

fn compile_scenario_schema() -> Result<jsonschema::Validator, String> {
    let schema: serde_json::Value = serde_json::from_str(SCENARIO_SCHEMA_JSON)
        .map_err(|e| format!("invalid schema JSON: {}", e))?;
    jsonschema::options()
        .build(&schema)
        .map_err(|e| format!("schema does not compile: {}", e))
}

/// Every call after the first reuses the same compiled validator, including
/// a failed compilation.
fn scenario_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    SCENARIO_VALIDATOR
        .get_or_init(compile_scenario_schema)
        .as_ref()
        .map_err(|e| SchemaError::Unavailable(e.clone()))
}

/// Validate a scenario, as JSON, against the schema.
///
/// Returns every violation found, each formatted with its instance path.
pub fn validate_scenario_schema(scenario_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = scenario_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(scenario_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
