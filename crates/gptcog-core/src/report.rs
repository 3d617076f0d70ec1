//! Result reporting: the CSV result log and normalized scenario output.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::result::ResultOutput;
use crate::scenario::parse_document;

const CSV_HEADER: [&str; 5] = ["RESULT", "RESULT_MESSAGE", "PROMPT", "MODEL", "SCENARIO_CONTENT"];

/// Errors from writing reports.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// One row of the result log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub result: bool,
    pub message: String,
    pub prompt: String,
    pub model: String,
    pub scenario: String,
}

impl ResultRecord {
    pub fn new(
        result: &ResultOutput,
        prompt: impl Into<String>,
        model: impl Into<String>,
        scenario: impl Into<String>,
    ) -> Self {
        Self {
            result: result.valid,
            message: result.message.clone(),
            prompt: prompt.into(),
            model: model.into(),
            scenario: scenario.into(),
        }
    }

    fn fields(&self) -> Result<[String; 5], ReportError> {
        let content =
            serde_json::to_string(&self.scenario).map_err(|e| ReportError::Serialize(e.to_string()))?;
        Ok([
            self.result.to_string(),
            self.message.clone(),
            self.prompt.clone(),
            self.model.clone(),
            content,
        ])
    }
}

/// Append-only CSV log of validation results.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. The header is written only when the file is
    /// created; missing parent directories are created.
    pub fn append(&self, record: &ResultRecord) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let is_new = !self.path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        let mut buf = String::new();
        if is_new {
            buf.push_str(&csv_row(CSV_HEADER.iter().copied()));
        }
        let fields = record.fields()?;
        buf.push_str(&csv_row(fields.iter().map(String::as_str)));

        file.write_all(buf.as_bytes())?;
        tracing::debug!(path = %self.path.display(), result = record.result, "Appended result record");
        Ok(())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    let mut row = fields.map(csv_field).collect::<Vec<_>>().join(",");
    row.push('\n');
    row
}

/// Write the scenario, re-serialized from its parsed form, to `path`.
pub fn write_crank_yaml(path: impl AsRef<Path>, yaml: &str) -> Result<(), ReportError> {
    let path = path.as_ref();
    let document = parse_document(yaml).map_err(|e| ReportError::Serialize(e.to_string()))?;
    let normalized =
        serde_yaml::to_string(&document).map_err(|e| ReportError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, normalized)?;
    tracing::debug!(path = %path.display(), "Wrote normalized scenario");
    Ok(())
}
