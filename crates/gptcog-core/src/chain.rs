//! The validation chain.
//!
//! Validation runs the checks in a fixed order and stops at the first
//! failure:
//!
//! ```text
//! YAML text ──parse──▶ Format ──▶ StepOrder ──▶ Variables ──▶ "All checks passed"
//!                │          │            │             │
//!                └──────────┴────────────┴─────────────┴──▶ first failure
//! ```
//!
//! Format builds the typed [`Scenario`]; every later check is a
//! [`ScenarioCheck`] over that value.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::checks::{CheckKind, FormatCheck, ScenarioCheck, StepOrderCheck, VariableCheck};
use crate::observer::{NoopObserver, TracingObserver, ValidationObserver};
use crate::result::ResultOutput;
use crate::scenario::{parse_document, Scenario};
use crate::ValidationError;

/// Checks run after Format, in order.
const SCENARIO_CHECKS: &[&dyn ScenarioCheck] = &[&StepOrderCheck, &VariableCheck];

/// Runs the validation chain and reports progress to an observer.
#[derive(Clone)]
pub struct Validator {
    observer: Arc<dyn ValidationObserver>,
}

impl Validator {
    /// A validator that logs through `tracing`.
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }

    /// A validator that reports nothing.
    pub fn silent() -> Self {
        Self::with_observer(Arc::new(NoopObserver))
    }

    pub fn with_observer(observer: Arc<dyn ValidationObserver>) -> Self {
        Self { observer }
    }

    /// Validate YAML text, returning the typed scenario on success.
    pub fn validate(&self, yaml: &str) -> Result<Scenario, ValidationError> {
        let document = parse_document(yaml)?;
        self.validate_document(&document)
    }

    /// Validate an already parsed document.
    pub fn validate_document(
        &self,
        document: &serde_yaml::Value,
    ) -> Result<Scenario, ValidationError> {
        let format = FormatCheck::new();
        let scenario = self.run_stage(format.kind(), || format.build(document))?;

        SCENARIO_CHECKS.iter().try_for_each(|check| {
            self.run_stage(check.kind(), || check.check(&scenario, self.observer.as_ref()))
        })?;

        Ok(scenario)
    }

    /// Validate YAML text and fold the outcome into a [`ResultOutput`].
    ///
    /// Never panics: a panic inside the chain is reported as a parse
    /// failure.
    pub fn process(&self, yaml: &str) -> ResultOutput {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.validate(yaml)));

        let result = match outcome {
            Ok(Ok(_)) => ResultOutput::passed(),
            Ok(Err(error)) => ResultOutput::from(&error),
            Err(_) => {
                tracing::error!("Scenario validation panicked");
                ResultOutput::from(&ValidationError::Parse(
                    "validation aborted unexpectedly".to_string(),
                ))
            }
        };

        self.observer.finished(&result);
        result
    }

    fn run_stage<T>(
        &self,
        kind: CheckKind,
        stage: impl FnOnce() -> Result<T, ValidationError>,
    ) -> Result<T, ValidationError> {
        self.observer.check_started(kind);
        match stage() {
            Ok(value) => {
                self.observer.check_passed(kind);
                Ok(value)
            }
            Err(error) => {
                self.observer.check_failed(kind, &error);
                Err(error)
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
