//! # Setup Command Implementation
//!
//! Clone, then install, then link. A stage only starts when the previous one
//! succeeded for every repository.

use anyhow::Result;
use clap::Args;

use polyrepo::orchestrator::Orchestrator;
use polyrepo::root;

use crate::cli::Context;
use crate::commands::finish;
use crate::commands::install::DEFAULT_INSTALL_COMMAND;

/// Clone, install and link
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Install command to run in each repository
    #[arg(long, value_name = "CMD", default_value = DEFAULT_INSTALL_COMMAND)]
    pub command: String,
}

/// Execute the `setup` command.
pub fn execute(args: SetupArgs, context: &Context) -> Result<bool> {
    let (root, marked) = root::find_or_mark_root(&context.path)?;
    if marked {
        context
            .console
            .success_title(&format!("Marked as project root: {}", root.display()));
    }

    let workspace = context.workspace_at(root)?;
    let runner = context.runner();
    let succeeded = Orchestrator::new(&workspace, &runner, &context.console)
        .setup(context.branch.as_deref(), &args.command);
    Ok(finish(&context.console, succeeded))
}
