//! # Update Command Implementation
//!
//! Reinstalls the `polyrepo` binary itself from its git repository with
//! `cargo install --git <url> --force`. The repository defaults to the
//! official one and can be overridden with `POLYREPO_CLI_URL`.

use anyhow::Result;
use clap::Args;

use polyrepo::defaults::CLI_REPO_URL;
use polyrepo::exec::{CommandRunner, ShellCommand, SystemRunner};

use crate::cli::Context;

/// Reinstall polyrepo from its repository
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Git repository to install from
    #[arg(long, value_name = "URL", env = "POLYREPO_CLI_URL", default_value = CLI_REPO_URL)]
    pub url: String,
}

/// The reinstall command for `url`.
pub fn install_command(url: &str) -> ShellCommand {
    ShellCommand::new("cargo").args(["install", "--git", url, "--force"])
}

/// Execute the `update` command.
pub fn execute(args: UpdateArgs, context: &Context) -> Result<bool> {
    context.console.info_title("Updating polyrepo");

    let cwd = std::env::current_dir()?;
    // installer output is always shown
    let runner = SystemRunner::new(true);
    match runner.run(&install_command(&args.url), &cwd) {
        Ok(()) => {
            context.console.success("Successfully updated polyrepo");
            Ok(true)
        }
        Err(e) => {
            context.console.error_title("Failed updating polyrepo");
            context.console.error(&e.to_string());
            Ok(false)
        }
    }
}
