//! # Install Command Implementation
//!
//! Runs each selected repository's own dependency installer.

use anyhow::Result;
use clap::Args;

use polyrepo::orchestrator::Orchestrator;

use crate::cli::Context;
use crate::commands::finish;

/// Default install command run in every repository.
pub const DEFAULT_INSTALL_COMMAND: &str = "yarn install";

/// Install dependencies of every selected repo
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Install command to run in each repository
    #[arg(long, value_name = "CMD", default_value = DEFAULT_INSTALL_COMMAND)]
    pub command: String,
}

/// Execute the `install` command.
pub fn execute(args: InstallArgs, context: &Context) -> Result<bool> {
    let workspace = context.workspace()?;
    let runner = context.runner();
    let report = Orchestrator::new(&workspace, &runner, &context.console)
        .install_dependencies(&args.command);
    Ok(finish(&context.console, report.all_succeeded()))
}
