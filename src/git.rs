use std::path::Path;
use std::process::Command;

use crate::defaults::GIT_SSH_COMMAND;
use crate::error::{Error, Result};
use crate::exec::ShellCommand;

/// A `git` invocation that never prompts for credentials.
///
/// This uses the system git command, which automatically handles:
/// - SSH keys from ~/.ssh/
/// - Git credential helpers
/// - Any authentication configured in ~/.gitconfig
///
/// `GIT_SSH_COMMAND` forces batch mode so a missing key fails fast.
pub fn git() -> ShellCommand {
    ShellCommand::new("git").env("GIT_SSH_COMMAND", GIT_SSH_COMMAND)
}

/// `git clone <url> <dest> [--branch <branch>]`
pub fn clone_command(url: &str, dest: &Path, branch: Option<&str>) -> ShellCommand {
    let command = git()
        .arg("clone")
        .arg(url)
        .arg(dest.to_string_lossy().into_owned());
    match branch {
        Some(branch) => command.arg("--branch").arg(branch),
        None => command,
    }
}

/// `git archive <ref> --remote <remote> --format tar.gz --output <output>`
pub fn archive_command(git_ref: &str, remote: &str, output: &str) -> ShellCommand {
    git().args([
        "archive", git_ref, "--remote", remote, "--format", "tar.gz", "--output", output,
    ])
}

/// Returns the branch checked out in `dir`.
pub fn current_branch(dir: &Path) -> Result<String> {
    let command = "rev-parse --abbrev-ref HEAD";
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(dir)
        .output()
        .map_err(|e| Error::GitCommand {
            command: command.to_string(),
            cwd: dir.to_path_buf(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::GitCommand {
            command: command.to_string(),
            cwd: dir.to_path_buf(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Returns true if `dir` already holds a git checkout.
pub fn is_checkout(dir: &Path) -> bool {
    dir.join(".git").exists()
}

/// Suggests a fix when git output looks like an authentication failure.
pub fn auth_hint(stderr: &str) -> Option<String> {
    let auth_failure = stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
        || stderr.contains("Host key verification failed");

    auth_failure.then(|| {
        "Make sure you have access to the repository. Outside CI, add your SSH key to \
         ssh-agent; inside CI, provide CI_JOB_TOKEN."
            .to_string()
    })
}
