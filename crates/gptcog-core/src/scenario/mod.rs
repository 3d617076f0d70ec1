//! Scenario parsing and shape validation.
//!
//! Scenarios are YAML documents. Parsing happens in two stages: YAML text
//! to an untyped document (well-formedness only), then document to a typed
//! [`Scenario`] after checking it against the embedded JSON Schema.

mod parser;
mod schema;

pub use parser::{
    parse_document, render_number, Scalar, Scenario, Step, StepData, TokenValue, Tokens,
    STEP_ORDER_KEY,
};
pub use schema::{validate_scenario_schema, SchemaError};
