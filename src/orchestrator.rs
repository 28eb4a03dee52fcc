//! # Workspace Orchestration
//!
//! The operations behind `clone`, `run`, `install`, `link`, `setup` and
//! `update-yarn`. Each one walks the selected repositories in catalog order,
//! one at a time, waiting for every step before starting the next. A failing
//! repository is reported on the console and recorded; the remaining
//! repositories are still attempted and the returned report tells whether
//! everything succeeded.

use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::catalog::RepositoryDescriptor;
use crate::error::Result;
use crate::exec::{CommandRunner, ShellCommand};
use crate::git;
use crate::link::{self, LinkResult};
use crate::outcome::{RunReport, StepRecord};
use crate::output::Console;
use crate::workspace::Workspace;

/// Files that `update-yarn` replaces in every repository.
pub const YARN_FILES: [&str; 2] = [".yarn", ".yarnrc.yml"];

/// Drives per-repository steps over a workspace.
pub struct Orchestrator<'a> {
    workspace: &'a Workspace,
    runner: &'a dyn CommandRunner,
    console: &'a Console,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        workspace: &'a Workspace,
        runner: &'a dyn CommandRunner,
        console: &'a Console,
    ) -> Self {
        Self {
            workspace,
            runner,
            console,
        }
    }

    /// Clones every selected repository into `<root>/<uri>`.
    ///
    /// A destination that already holds a checkout counts as cloned.
    pub fn clone_repos(&self, branch: Option<&str>) -> RunReport {
        let root = self.workspace.root();
        self.console
            .info_title(&format!("Cloning repos into {}", root.display()));

        self.each_repo(
            |repo| {
                let dest = self.workspace.repo_path(repo);
                if git::is_checkout(&dest) {
                    self.console
                        .info(&format!("Already cloned {} into {}", repo.url, repo.uri));
                    return Ok(());
                }
                self.runner
                    .run(&git::clone_command(&repo.url, &dest, branch), root)?;
                self.console
                    .success(&format!("Cloned {} into {}", repo.url, repo.uri));
                Ok(())
            },
            |repo| format!("Failed cloning {} into {}", repo.url, repo.uri),
        )
    }

    /// Runs `command_line` through the shell in every selected repository.
    pub fn run_command(&self, command_line: &str) -> RunReport {
        self.console.info_title(&format!("Running {}", command_line));
        let command = ShellCommand::shell(command_line);

        self.each_repo(
            |repo| {
                self.console
                    .info(&format!("{} $ {}", repo.uri, command_line));
                self.run_in(repo, &command)?;
                self.console.success(&format!(
                    "Success running command {} for {}",
                    command_line, repo.uri
                ));
                Ok(())
            },
            |repo| format!("Failed running command {} for {}", command_line, repo.uri),
        )
    }

    /// Runs the install command in every selected repository.
    pub fn install_dependencies(&self, command_line: &str) -> RunReport {
        self.console.info_title("Installing dependencies");
        let command = ShellCommand::shell(command_line);

        self.each_repo(
            |repo| {
                self.run_in(repo, &command)?;
                self.console.success(&format!(
                    "Successfully installed dependencies for {}",
                    repo.uri
                ));
                Ok(())
            },
            |repo| format!("Failed installing dependencies for {}", repo.uri),
        )
    }

    /// Links the required shared modules of every selected repository.
    pub fn link_repos(&self) -> LinkResult {
        self.console.info_title("Linking shared modules");
        let selected = self.workspace.selected();
        let result = link::link(
            self.workspace.root(),
            &selected,
            self.workspace.catalog().repos(),
        );

        for record in &result.records {
            match (&record.outcome, &record.package) {
                (Ok(()), Some(package)) => self
                    .console
                    .success(&format!("Linked in {} module {}", record.dependent, package)),
                (Ok(()), None) => {}
                (Err(message), _) => self.console.error_title(&format!(
                    "Failed linking {} in {}: {}",
                    record.dependency, record.dependent, message
                )),
            }
        }
        result
    }

    /// Clone, install and link, stopping after the first failing stage.
    pub fn setup(&self, branch: Option<&str>, install_command: &str) -> bool {
        if !self.clone_repos(branch).all_succeeded() {
            return false;
        }
        if !self.install_dependencies(install_command).all_succeeded() {
            return false;
        }
        self.link_repos().succeeded()
    }

    /// Replaces `.yarn/` and `.yarnrc.yml` of every selected repository
    /// with the copies found in `template`.
    pub fn update_yarn(&self, template: &Path) -> RunReport {
        self.console.info_title("Updating yarn files");

        self.each_repo(
            |repo| {
                let repo_path = self.workspace.repo_path(repo);
                for name in YARN_FILES {
                    remove_path(&repo_path.join(name))?;
                }
                self.console.success(&format!(
                    "Successfully removed old yarn files for {}",
                    repo.uri
                ));

                for name in YARN_FILES {
                    copy_path(&template.join(name), &repo_path.join(name))?;
                }
                self.console
                    .success(&format!("Successfully updated yarn for {}", repo.uri));
                Ok(())
            },
            |repo| format!("Failed updating yarn for {}", repo.uri),
        )
    }

    fn run_in(&self, repo: &RepositoryDescriptor, command: &ShellCommand) -> Result<()> {
        let path = self.workspace.repo_path(repo);
        if !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Does not exist: {}", path.display()),
            )
            .into());
        }
        self.runner.run(command, &path)
    }

    fn each_repo<F, M>(&self, mut step: F, failure_title: M) -> RunReport
    where
        F: FnMut(&RepositoryDescriptor) -> Result<()>,
        M: Fn(&RepositoryDescriptor) -> String,
    {
        let mut report = RunReport::new();
        for repo in self.workspace.selected() {
            match step(repo) {
                Ok(()) => report.push(StepRecord::success(&repo.uri)),
                Err(e) => {
                    debug!("{}: {}", repo.uri, e);
                    self.console.error_title(&failure_title(repo));
                    self.console.error(&e.to_string());
                    report.push(StepRecord::failure(&repo.uri, e.to_string()));
                }
            }
        }
        report
    }
}

fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Copies a file or a directory tree.
fn copy_path(from: &Path, to: &Path) -> io::Result<()> {
    if from.is_file() {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(from, to)?;
        return Ok(());
    }

    for entry in WalkDir::new(from) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
