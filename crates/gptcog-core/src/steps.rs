//! The file validation step.

use std::fs;
use std::path::{Path, PathBuf};

use crate::chain::Validator;
use crate::config::CogConfig;
use crate::report::{write_crank_yaml, ResultLog, ResultRecord};
use crate::result::{ResultOutput, StepOutcome};

/// Scenario files must carry this extension.
pub const CRANK_EXTENSION: &str = ".crank.yml";

const FILE_PROMPT: &str = "Local file input";
const FILE_MODEL: &str = "N/A";

/// Validates a `.crank.yml` scenario file.
///
/// Optionally appends the result to a CSV log and, for valid scenarios,
/// writes a normalized copy. Neither side effect can change the outcome.
#[derive(Clone, Default)]
pub struct FileValidationStep {
    validator: Validator,
    result_log: Option<ResultLog>,
    crank_output: Option<PathBuf>,
}

impl FileValidationStep {
    pub fn new(validator: Validator) -> Self {
        Self {
            validator,
            result_log: None,
            crank_output: None,
        }
    }

    /// Build a step with the outputs named in `config`.
    pub fn from_config(validator: Validator, config: &CogConfig) -> Self {
        Self {
            validator,
            result_log: config.result_log.clone().map(ResultLog::new),
            crank_output: config.crank_output.clone(),
        }
    }

    pub fn with_result_log(mut self, log: ResultLog) -> Self {
        self.result_log = Some(log);
        self
    }

    pub fn with_crank_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.crank_output = Some(path.into());
        self
    }

    /// Validate the scenario file at `path`.
    pub fn execute(&self, path: impl AsRef<Path>) -> StepOutcome {
        let path = path.as_ref();

        if !path.to_string_lossy().ends_with(CRANK_EXTENSION) {
            return StepOutcome::Error(
                "File format is not correct. Please provide a .crank.yml file".to_string(),
            );
        }

        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => return StepOutcome::Error(format!("Error: {}", e)),
        };

        tracing::info!(path = %path.display(), "Validating scenario file");
        self.execute_text(&contents)
    }

    /// Validate scenario text that was already read, with the same
    /// reporting as [`execute`](Self::execute) but no extension rule.
    pub fn execute_text(&self, contents: &str) -> StepOutcome {
        if contents.trim().is_empty() {
            return StepOutcome::Error("File is empty. Please provide a valid file".to_string());
        }

        let result = self.validator.process(contents);
        self.record(&result, contents);
        StepOutcome::from(result)
    }

    fn record(&self, result: &ResultOutput, contents: &str) {
        if let Some(log) = &self.result_log {
            let record = ResultRecord::new(result, FILE_PROMPT, FILE_MODEL, contents);
            if let Err(e) = log.append(&record) {
                tracing::warn!(path = %log.path().display(), error = %e, "Failed to append result log");
            }
        }

        if result.valid {
            if let Some(output) = &self.crank_output {
                if let Err(e) = write_crank_yaml(output, contents) {
                    tracing::warn!(path = %output.display(), error = %e, "Failed to write scenario output");
                }
            }
        }
    }
}
