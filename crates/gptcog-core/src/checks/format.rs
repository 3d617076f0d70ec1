//! Format check: turns the raw document into a typed scenario.

use serde_yaml::Value;

use super::CheckKind;
use crate::scenario::Scenario;
use crate::ValidationError;

/// The first check of the chain.
///
/// Unlike the other checks it consumes the untyped document and produces
/// the [`Scenario`] the rest of the chain works on.
pub struct FormatCheck;

impl FormatCheck {
    pub fn new() -> Self {
        Self
    }

    pub fn kind(&self) -> CheckKind {
        CheckKind::Format
    }

    /// Build the typed scenario, or report the shape violation.
    pub fn build(&self, document: &Value) -> Result<Scenario, ValidationError> {
        Scenario::from_document(document)
    }
}

impl Default for FormatCheck {
    fn default() -> Self {
        Self::new()
    }
}
