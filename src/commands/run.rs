//! # Run Command Implementation
//!
//! Runs an arbitrary shell command in the working copy of every selected
//! repository, one after another.

use anyhow::Result;
use clap::Args;

use polyrepo::orchestrator::Orchestrator;

use crate::cli::Context;
use crate::commands::finish;

/// Run a shell command in every selected repo
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Command to run; joined with spaces and passed to the shell
    #[arg(value_name = "CMD", required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Execute the `run` command.
pub fn execute(args: RunArgs, context: &Context) -> Result<bool> {
    let workspace = context.workspace()?;
    let runner = context.runner();
    let report = Orchestrator::new(&workspace, &runner, &context.console)
        .run_command(&args.command.join(" "));
    Ok(finish(&context.console, report.all_succeeded()))
}
