//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `polyrepo`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`, when the command has any.
//! - An `execute` function that takes the parsed `Args` and the global
//!   [`Context`](crate::cli::Context) and returns whether every step
//!   succeeded.
//!
//! Fatal configuration problems (no project root, unreadable catalog) are
//! returned as errors; per-repository failures are reported on the console and
//! turn the result to `false`.

pub mod clone;
pub mod install;
pub mod link;
pub mod mark;
pub mod pkg;
pub mod run;
pub mod setup;
pub mod tree;
pub mod update;
pub mod update_yarn;

use polyrepo::output::Console;

/// Prints the closing line of a multi-repository command.
pub(crate) fn finish(console: &Console, succeeded: bool) -> bool {
    if succeeded {
        console.success_title("Done");
    } else {
        console.error_title("Finished with errors");
    }
    succeeded
}
