//! Command line interface for the compiler.
//!
//! This module provides argument parsing, command dispatch, and the
//! terminal presenter for workflow steps.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig};
pub use output::OutputManager;

use crate::error::{CliError, Result};

/// Main CLI entry point
///
/// Returns the process exit code. Build failures are reported here with
/// their recovery suggestions; only presenter IO failures bubble up.
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let runtime = RuntimeConfig::from(&args);

    let outcome = match args.validate() {
        Ok(()) => execute(&args, &runtime).await,
        Err(reason) => Err(CliError::InvalidArguments { reason }.into()),
    };

    match outcome {
        Ok(()) => Ok(0),
        Err(e) => {
            log::debug!("Command failed: {:?}", e);
            runtime.output().error(&e.to_string())?;
            for suggestion in e.recovery_suggestions() {
                runtime.output().hint(&suggestion)?;
            }
            Ok(e.exit_code())
        }
    }
}

async fn execute(args: &Args, runtime: &RuntimeConfig) -> Result<()> {
    match &args.command {
        Command::Compile { no_pack } => commands::compile(args, runtime, !no_pack).await,
        Command::Pack => commands::pack(args, runtime).await,
        Command::Init { force } => commands::init(args, runtime, *force).await,
    }
}
