//! # Link Command Implementation
//!
//! Symlinks the shared modules each selected repository requires into its
//! `node_modules`. Requirements are looked up in the whole catalog, so a
//! dependency outside the `--only` selection is still linked.

use anyhow::Result;

use polyrepo::exec::SystemRunner;
use polyrepo::orchestrator::Orchestrator;

use crate::cli::Context;
use crate::commands::finish;

/// Execute the `link` command.
pub fn execute(context: &Context) -> Result<bool> {
    let workspace = context.workspace()?;
    // linking never spawns processes
    let runner = SystemRunner::new(false);
    let result = Orchestrator::new(&workspace, &runner, &context.console).link_repos();
    Ok(finish(&context.console, result.succeeded()))
}
