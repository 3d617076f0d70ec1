//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Validate GPT assertion scenarios
#[derive(Parser, Debug)]
#[command(name = "gptcog", version, about = "Validate GPT assertion scenarios")]
pub struct Cli {
    /// Log each check and resolved step to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a .crank.yml scenario file, or YAML read from stdin
    Validate(ValidateArgs),

    /// List the accepted step expressions
    Catalog {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Scenario file; reads stdin when omitted
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Append the result to this CSV file
    #[arg(long, env = "GPTCOG_RESULT_LOG")]
    pub result_log: Option<PathBuf>,

    /// Write the normalized scenario here when it is valid
    #[arg(long, env = "GPTCOG_CRANK_OUTPUT")]
    pub crank_output: Option<PathBuf>,

    /// YAML config file with result_log and crank_output
    #[arg(long, env = "GPTCOG_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
