//! # Clone Command Implementation
//!
//! Clones every selected repository into `<root>/<side>/<scope>/<name>`.
//! When no project root exists above `--path`, that directory is marked as
//! the root first, so `clone` can bootstrap a fresh workspace.

use anyhow::Result;
use log::info;

use polyrepo::orchestrator::Orchestrator;
use polyrepo::root;

use crate::cli::Context;
use crate::commands::finish;

/// Execute the `clone` command.
pub fn execute(context: &Context) -> Result<bool> {
    let (root, marked) = root::find_or_mark_root(&context.path)?;
    if marked {
        context
            .console
            .success_title(&format!("Marked as project root: {}", root.display()));
    }
    info!("Project root: {}", root.display());

    let workspace = context.workspace_at(root)?;
    let runner = context.runner();
    let report = Orchestrator::new(&workspace, &runner, &context.console)
        .clone_repos(context.branch.as_deref());
    Ok(finish(&context.console, report.all_succeeded()))
}
