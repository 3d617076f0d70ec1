//! Validation verdicts and step outcomes.

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Message returned when every check passes.
pub const PASS_MESSAGE: &str = "All checks passed";

const FAILURE_PREFIX: &str = "Error: YAML Validation failed.";

/// The pass/fail verdict of a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultOutput {
    pub valid: bool,
    pub message: String,
}

impl ResultOutput {
    /// The terminal verdict of a chain that found nothing wrong.
    pub fn passed() -> Self {
        Self {
            valid: true,
            message: PASS_MESSAGE.to_string(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

impl From<&ValidationError> for ResultOutput {
    fn from(error: &ValidationError) -> Self {
        let message = match error {
            ValidationError::Parse(_) => format!("{} Could not parse YAML.", FAILURE_PREFIX),
            ValidationError::Format(_) => format!("{} Invalid YAML Format.", FAILURE_PREFIX),
            ValidationError::StepOrder { .. } => format!("{} Invalid step order.", FAILURE_PREFIX),
            ValidationError::UndeclaredToken { step, key } => format!(
                "{} Step {}: key {} not found in the test tokens.",
                FAILURE_PREFIX, step, key
            ),
            ValidationError::UnmatchedExpression { step, .. } => format!(
                "{} Invalid expression found at step {}.",
                FAILURE_PREFIX, step
            ),
        };
        Self::failed(message)
    }
}

impl From<ValidationError> for ResultOutput {
    fn from(error: ValidationError) -> Self {
        Self::from(&error)
    }
}

/// Outcome of a step that runs the validator, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum StepOutcome {
    /// The scenario is valid
    Pass(String),

    /// The scenario was read but is not valid
    Fail(String),

    /// The step could not run (bad input file, provider failure)
    Error(String),
}

impl StepOutcome {
    pub fn message(&self) -> &str {
        match self {
            StepOutcome::Pass(m) | StepOutcome::Fail(m) | StepOutcome::Error(m) => m,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, StepOutcome::Pass(_))
    }
}

impl From<ResultOutput> for StepOutcome {
    fn from(result: ResultOutput) -> Self {
        if result.valid {
            StepOutcome::Pass(result.message)
        } else {
            StepOutcome::Fail(result.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages() {
        let parse = ResultOutput::from(ValidationError::Parse("bad".into()));
        assert!(!parse.valid);
        assert_eq!(parse.message, "Error: YAML Validation failed. Could not parse YAML.");

        let format = ResultOutput::from(ValidationError::Format("extra".into()));
        assert!(format.message.contains("Format"));

        let order = ResultOutput::from(ValidationError::StepOrder {
            step: 1,
            found: "2".into(),
        });
        assert!(order.message.contains("step order"));

        let token = ResultOutput::from(ValidationError::UndeclaredToken {
            step: 2,
            key: "unknownVar".into(),
        });
        assert!(token.message.contains("Step 2"));
        assert!(token.message.contains("unknownVar"));
    }

    #[test]
    fn test_step_outcome_from_result() {
        assert_eq!(
            StepOutcome::from(ResultOutput::passed()),
            StepOutcome::Pass(PASS_MESSAGE.to_string())
        );
        let fail = StepOutcome::from(ResultOutput::failed("nope"));
        assert!(!fail.is_pass());
        assert_eq!(fail.message(), "nope");
    }

    #[test]
    fn test_result_serializes() {
        let json = serde_json::to_value(ResultOutput::passed()).unwrap();
        assert_eq!(json["valid"], true);
        assert_eq!(json["message"], PASS_MESSAGE);
    }
}
