//! # gptcog-core
//!
//! Deterministic validation of GPT assertion scenarios.
//!
//! A scenario is a YAML document declaring variables under `tokens.test`
//! and an ordered list of natural-language assertion steps. This crate
//! answers one question: is the scenario well-formed enough to run?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same YAML always produces the same result
//! 2. **Fail-fast**: The first failing check ends validation
//! 3. **Never panics outward**: [`process_yaml`] always returns a result
//! 4. **Thread-safe**: [`Validator`] is `Send + Sync` and holds no mutable state
//!
//! ## Example
//!
//! ```rust,ignore
//! use gptcog_core::process_yaml;
//!
//! let result = process_yaml(&std::fs::read_to_string("greeting.crank.yml")?);
//! if result.valid {
//!     println!("OK: {}", result.message);
//! } else {
//!     eprintln!("{}", result.message);
//! }
//! ```

pub mod catalog;
pub mod chain;
pub mod checks;
pub mod config;
pub mod observer;
pub mod report;
pub mod result;
pub mod scenario;
pub mod steps;

// Re-export main types at crate root
pub use catalog::{CatalogEntry, ExpressionId, ExpressionMatch, Operator};
pub use chain::Validator;
pub use checks::{CheckKind, ResolvedStep, ScenarioCheck};
pub use config::{CogConfig, ConfigError};
pub use observer::{NoopObserver, TracingObserver, ValidationObserver};
pub use report::{write_crank_yaml, ReportError, ResultLog, ResultRecord};
pub use result::{ResultOutput, StepOutcome, PASS_MESSAGE};
pub use scenario::{Scenario, Step, StepData, TokenValue, Tokens};
pub use steps::FileValidationStep;

use thiserror::Error;

/// Reasons a scenario fails validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Could not parse YAML: {0}")]
    Parse(String),

    #[error("Invalid scenario format: {0}")]
    Format(String),

    #[error("Step {step} declares order {found}")]
    StepOrder { step: usize, found: String },

    #[error("Step {step} references undeclared token '{key}'")]
    UndeclaredToken { step: usize, key: String },

    #[error("Step {step} matches no known expression: {sentence}")]
    UnmatchedExpression { step: usize, sentence: String },
}

/// Validate scenario YAML with the default validator.
///
/// This is the main entry point. Failures are folded into the returned
/// [`ResultOutput`]; nothing is raised to the caller.
pub fn process_yaml(yaml: &str) -> ResultOutput {
    Validator::default().process(yaml)
}
