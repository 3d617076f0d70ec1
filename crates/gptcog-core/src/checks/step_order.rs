//! Step-order check.

use super::{CheckKind, ScenarioCheck};
use crate::observer::ValidationObserver;
use crate::scenario::{render_number, Scenario};
use crate::ValidationError;

/// Steps must declare orders 1, 2, ... N, in array order.
///
/// Gaps, duplicates, fractions and reordering are all reported at the first
/// position where the declared order differs from the expected one.
pub struct StepOrderCheck;

impl StepOrderCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StepOrderCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioCheck for StepOrderCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::StepOrder
    }

    fn check(
        &self,
        scenario: &Scenario,
        _observer: &dyn ValidationObserver,
    ) -> Result<(), ValidationError> {
        for (index, step) in scenario.steps.iter().enumerate() {
            let expected = index as u64 + 1;
            if step.data.position() != Some(expected) {
                return Err(ValidationError::StepOrder {
                    step: index + 1,
                    found: render_number(step.data.order()),
                });
            }
        }
        Ok(())
    }
}
