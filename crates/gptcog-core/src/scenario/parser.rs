//! Scenario parsing from YAML.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml::{Number, Value};

use super::schema::validate_scenario_schema;
use crate::ValidationError;

/// The step-order key, compared case-insensitively.
pub const STEP_ORDER_KEY: &str = "__stepOrder";

/// A scalar inside a token record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(Number),
    Flag(bool),
}

impl Scalar {
    /// Render the scalar the way it is substituted into step text.
    pub fn render(&self) -> String {
        match self {
            Scalar::Text(s) => s.clone(),
            Scalar::Number(n) => render_number(n),
            Scalar::Flag(b) => b.to_string(),
        }
    }
}

/// The value of a declared token.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Text(String),
    Number(Number),
    Flag(bool),
    Records(Vec<BTreeMap<String, Scalar>>),
}

impl TokenValue {
    /// Render the value the way it is substituted into step text.
    ///
    /// Records render as `key: value` pairs joined by `, `, one record
    /// after another joined by `; `.
    pub fn render(&self) -> String {
        match self {
            TokenValue::Text(s) => s.clone(),
            TokenValue::Number(n) => render_number(n),
            TokenValue::Flag(b) => b.to_string(),
            TokenValue::Records(records) => records
                .iter()
                .map(|record| {
                    record
                        .iter()
                        .map(|(k, v)| format!("{}: {}", k, v.render()))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Format a YAML number: integers in decimal, integral floats without a
/// fractional part, other floats in shortest form.
pub fn render_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Declared variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tokens {
    /// Variables available to steps as `{{test.<name>}}`
    pub test: BTreeMap<String, TokenValue>,
}

/// Step metadata: the step-order key as written, and its value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, Number>")]
pub struct StepData {
    key: String,
    order: Number,
}

impl StepData {
    /// The step-order key exactly as it appears in the document.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The raw step-order number.
    pub fn order(&self) -> &Number {
        &self.order
    }

    /// The step-order value as a whole position, if it is one.
    pub fn position(&self) -> Option<u64> {
        if let Some(u) = self.order.as_u64() {
            return Some(u);
        }
        match self.order.as_f64() {
            Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Some(f as u64),
            _ => None,
        }
    }
}

impl TryFrom<BTreeMap<String, Number>> for StepData {
    type Error = String;

    fn try_from(map: BTreeMap<String, Number>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!("step data must hold exactly one key, found {}", map.len()));
        }
        let (key, order) = map
            .into_iter()
            .next()
            .ok_or_else(|| "step data is empty".to_string())?;
        if !key.eq_ignore_ascii_case(STEP_ORDER_KEY) {
            return Err(format!("unexpected step data key '{}'", key));
        }
        Ok(Self { key, order })
    }
}

/// One assertion within a scenario.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Sentence template with `{{test.<name>}}` placeholders
    pub step: String,

    /// Step-order metadata
    pub data: StepData,
}

/// A GPT assertion scenario.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Short title
    pub scenario: String,

    /// Free-text description
    pub description: String,

    /// Declared variables
    pub tokens: Tokens,

    /// Ordered assertion steps
    pub steps: Vec<Step>,
}

/// Parse YAML text into an untyped document.
///
/// Only well-formedness is checked here; an empty document parses to null.
pub fn parse_document(yaml: &str) -> Result<Value, ValidationError> {
    serde_yaml::from_str(yaml).map_err(|e| ValidationError::Parse(e.to_string()))
}

impl Scenario {
    /// Build a typed scenario from a parsed document.
    ///
    /// The document must satisfy the scenario schema exactly; the first
    /// schema violation is reported.
    pub fn from_document(document: &Value) -> Result<Self, ValidationError> {
        let json = serde_json::to_value(document)
            .map_err(|e| ValidationError::Format(format!("document is not JSON-compatible: {}", e)))?;

        validate_scenario_schema(&json).map_err(|errors| {
            ValidationError::Format(
                errors
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| "schema validation failed".to_string()),
            )
        })?;

        serde_yaml::from_value(document.clone()).map_err(|e| ValidationError::Format(e.to_string()))
    }

    /// Parse a scenario from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ValidationError> {
        let document = parse_document(yaml)?;
        Self::from_document(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_SCENARIO: &str = r#"
scenario: Greeting
description: >
  Model answers a greeting.
tokens:
  test:
    model: gpt-4
    prompt: hi
    operator: be
    expectation: hello
    threshold: 0.15
    retries: 3
steps:
  - step: OpenAI model {{test.model}} response to "{{test.prompt}}" should {{test.operator}} {{test.expectation}}
    data:
      __stepOrder: 1
"#;

    #[test]
    fn test_parse_valid_scenario() {
        let scenario = Scenario::from_yaml(VALID_SCENARIO).unwrap();
        assert_eq!(scenario.scenario, "Greeting");
        assert_eq!(scenario.steps.len(), 1);
        assert_eq!(scenario.steps[0].data.position(), Some(1));
        let tokens = &scenario.tokens.test;
        assert_eq!(tokens.get("model"), Some(&TokenValue::Text("gpt-4".to_string())));
        assert_eq!(tokens["threshold"].render(), "0.15");
        assert_eq!(tokens["retries"].render(), "3");
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let result = Scenario::from_yaml("scenario: [unclosed");
        assert!(matches!(result, Err(ValidationError::Parse(_))));
    }

    #[test]
    fn test_extra_key_is_format_error() {
        let yaml = format!("{}extra: 1\n", VALID_SCENARIO);
        let result = Scenario::from_yaml(&yaml);
        assert!(matches!(result, Err(ValidationError::Format(_))));
    }

    #[test]
    fn test_empty_document_is_format_error() {
        assert!(matches!(Scenario::from_yaml(""), Err(ValidationError::Format(_))));
    }

    #[test]
    fn test_uppercase_step_order_key() {
        let yaml = VALID_SCENARIO.replace("__stepOrder", "__StepOrder");
        let scenario = Scenario::from_yaml(&yaml).unwrap();
        assert_eq!(scenario.steps[0].data.key(), "__StepOrder");
        assert_eq!(scenario.steps[0].data.position(), Some(1));
    }

    #[test]
    fn test_non_numeric_step_order_is_format_error() {
        let yaml = VALID_SCENARIO.replace("__stepOrder: 1", "__stepOrder: first");
        assert!(matches!(Scenario::from_yaml(&yaml), Err(ValidationError::Format(_))));
    }

    #[test]
    fn test_fractional_step_order_has_no_position() {
        let yaml = VALID_SCENARIO.replace("__stepOrder: 1", "__stepOrder: 1.5");
        let scenario = Scenario::from_yaml(&yaml).unwrap();
        assert_eq!(scenario.steps[0].data.position(), None);
    }

    #[test]
    fn test_render_values() {
        assert_eq!(render_number(&Number::from(1.0)), "1");
        assert_eq!(render_number(&Number::from(0.2)), "0.2");
        assert_eq!(render_number(&Number::from(-4)), "-4");
        assert_eq!(TokenValue::Flag(true).render(), "true");

        let mut record = BTreeMap::new();
        record.insert("label".to_string(), Scalar::Text("a".to_string()));
        record.insert("weight".to_string(), Scalar::Number(Number::from(2)));
        let records = TokenValue::Records(vec![record.clone(), record]);
        assert_eq!(records.render(), "label: a, weight: 2; label: a, weight: 2");
    }

    #[test]
    fn test_record_tokens_parse() {
        let yaml = VALID_SCENARIO.replace(
            "    retries: 3\n",
            "    retries: 3\n    choices:\n      - label: a\n        weight: 1\n",
        );
        let scenario = Scenario::from_yaml(&yaml).unwrap();
        assert!(matches!(
            scenario.tokens.test.get("choices"),
            Some(TokenValue::Records(r)) if r.len() == 1
        ));
    }
}
