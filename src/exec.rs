//! External command execution.
//!
//! Orchestrator steps (clone, install, arbitrary commands) and package
//! preparation shell out through the [`CommandRunner`] trait so tests can
//! substitute a recording mock. [`SystemRunner`] is the real implementation:
//! it either passes the child's output straight through, or captures it and
//! shows a spinner while the command runs.

use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use crate::error::{Error, Result};

/// A program invocation, independent of where it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// A command line interpreted by the platform shell.
    pub fn shell(line: &str) -> Self {
        if cfg!(windows) {
            Self::new("cmd").arg("/C").arg(line)
        } else {
            Self::new("sh").arg("-c").arg(line)
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Builds a `std::process::Command` running in `cwd`.
    pub fn to_command(&self, cwd: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(cwd);
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        command
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Runs commands to completion.
pub trait CommandRunner: Send + Sync {
    /// Runs `command` in `cwd`; a non-zero exit is an error.
    fn run(&self, command: &ShellCommand, cwd: &Path) -> Result<()>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner {
    /// Inherit stdio instead of capturing it.
    pub passthrough: bool,
}

impl SystemRunner {
    pub fn new(passthrough: bool) -> Self {
        Self { passthrough }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ShellCommand, cwd: &Path) -> Result<()> {
        debug!("{} $ {}", cwd.display(), command);
        let failed = |message: String| Error::CommandFailed {
            command: command.to_string(),
            cwd: cwd.to_path_buf(),
            message,
        };

        let mut child = command.to_command(cwd);
        if self.passthrough {
            let status = child.status().map_err(|e| failed(e.to_string()))?;
            if !status.success() {
                return Err(failed(status.to_string()));
            }
            return Ok(());
        }

        let spinner = spinner(&command.to_string());
        let output = child
            .stdin(Stdio::null())
            .output()
            .map_err(|e| failed(e.to_string()));
        spinner.finish_and_clear();
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => output.status.to_string(),
                stderr => format!("{}: {}", output.status, stderr),
            };
            return Err(failed(message));
        }
        Ok(())
    }
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
