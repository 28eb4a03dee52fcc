//! # Update-Yarn Command Implementation
//!
//! Replaces `.yarn/` and `.yarnrc.yml` in every selected repository with the
//! copies from a template directory.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use polyrepo::orchestrator::Orchestrator;
use polyrepo::suggestions;

use crate::cli::Context;
use crate::commands::finish;

/// Replace yarn files of every selected repo with a template
#[derive(Args, Debug)]
pub struct UpdateYarnArgs {
    /// Directory holding the `.yarn/` directory and `.yarnrc.yml` to copy
    #[arg(long, value_name = "DIR", env = "POLYREPO_YARN_TEMPLATE")]
    pub template: PathBuf,
}

/// Execute the `update-yarn` command.
pub fn execute(args: UpdateYarnArgs, context: &Context) -> Result<bool> {
    if !args.template.is_dir() {
        return Err(suggestions::template_not_found(&args.template));
    }

    let workspace = context.workspace()?;
    let runner = context.runner();
    let report = Orchestrator::new(&workspace, &runner, &context.console).update_yarn(&args.template);
    Ok(finish(&context.console, report.all_succeeded()))
}
