//! gptcog binary entry point.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use cli::{Cli, Command};

/// Initialize logging on stderr.
///
/// `RUST_LOG` overrides the default filter; `--verbose` raises the
/// default from `warn` to `debug` for the gptcog crates.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,gptcog_core=debug,gptcog_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Validate(args) => commands::validate(args),
        Command::Catalog { format } => commands::list_catalog(format),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
