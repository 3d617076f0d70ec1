//! Subcommand implementations.

use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};

use gptcog_core::{catalog, CogConfig, FileValidationStep, StepOutcome, Validator};

use crate::cli::{OutputFormat, ValidateArgs};

/// Exit status for a validation outcome: 0 pass, 1 fail, 2 error.
pub fn exit_code(outcome: &StepOutcome) -> u8 {
    match outcome {
        StepOutcome::Pass(_) => 0,
        StepOutcome::Fail(_) => 1,
        StepOutcome::Error(_) => 2,
    }
}

pub fn render_outcome(outcome: &StepOutcome, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(outcome)?,
        OutputFormat::Text => {
            let label = match outcome {
                StepOutcome::Pass(_) => "PASS",
                StepOutcome::Fail(_) => "FAIL",
                StepOutcome::Error(_) => "ERROR",
            };
            format!("{}: {}", label, outcome.message())
        }
    })
}

pub fn render_catalog(format: OutputFormat) -> Result<String> {
    let entries = catalog::entries();
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&entries)?,
        OutputFormat::Text => entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                format!("{}. {} ({})\n   {}", i + 1, entry.title, entry.id, entry.pattern)
            })
            .collect::<Vec<_>>()
            .join("\n"),
    })
}

fn load_config(args: &ValidateArgs) -> Result<CogConfig> {
    let config = match &args.config {
        Some(path) => CogConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CogConfig::default(),
    };
    let config = config.merge(args.result_log.clone(), args.crank_output.clone());
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

pub fn validate(args: ValidateArgs) -> Result<ExitCode> {
    let config = load_config(&args)?;
    let step = FileValidationStep::from_config(Validator::new(), &config);

    let outcome = match &args.path {
        Some(path) => step.execute(path),
        None => {
            let mut contents = String::new();
            io::stdin()
                .read_to_string(&mut contents)
                .context("Failed to read scenario from stdin")?;
            step.execute_text(&contents)
        }
    };

    println!("{}", render_outcome(&outcome, args.format)?);
    Ok(ExitCode::from(exit_code(&outcome)))
}

pub fn list_catalog(format: OutputFormat) -> Result<ExitCode> {
    println!("{}", render_catalog(format)?);
    Ok(ExitCode::SUCCESS)
}
