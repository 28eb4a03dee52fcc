//! # Mark Command Implementation
//!
//! Writes the `.polyrepo` marker into the `--path` directory, making it the
//! project root every other command resolves repositories against.

use anyhow::Result;

use polyrepo::root;

use crate::cli::Context;

/// Execute the `mark` command.
pub fn execute(context: &Context) -> Result<bool> {
    let dir = root::mark_root(&context.path)?;
    context
        .console
        .success_title(&format!("Marked as project root: {}", dir.display()));
    Ok(true)
}
