//! Scenario checks.
//!
//! Each check answers one question about a typed [`Scenario`]:
//!
//! - **Format**: does the document have exactly the scenario shape?
//! - **StepOrder**: are steps numbered 1..N in array order?
//! - **Variables**: does every placeholder resolve, and does every resolved
//!   sentence match the expression catalog?
//!
//! Checks are independent of each other; the [`crate::chain`] module
//! decides their order.

mod format;
mod step_order;
mod variables;

pub use format::FormatCheck;
pub use step_order::StepOrderCheck;
pub use variables::{substitute, ResolvedStep, VariableCheck};

use std::fmt;

use serde::Serialize;

use crate::observer::ValidationObserver;
use crate::scenario::Scenario;
use crate::ValidationError;

/// The checks that make up the validation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Format,
    StepOrder,
    Variables,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Format => "format",
            CheckKind::StepOrder => "step_order",
            CheckKind::Variables => "variables",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common interface for checks over a typed scenario.
pub trait ScenarioCheck: Send + Sync {
    /// Which check this is.
    fn kind(&self) -> CheckKind;

    /// Inspect the scenario, reporting the first problem found.
    fn check(
        &self,
        scenario: &Scenario,
        observer: &dyn ValidationObserver,
    ) -> Result<(), ValidationError>;
}
