//! # Link Materialization
//!
//! Shared modules are made resolvable by symlinking each required repository
//! into the dependent repository's `node_modules`:
//!
//! ```text
//! <root>/front/modules/ui-admin/node_modules/@shared -> <root>/front/shared/shared-ui
//! ```
//!
//! Linking happens in two steps:
//!
//! 1. [`plan`] resolves every `requires` selector of the selected repositories
//!    against the *whole* catalog, so a shared module is linkable even when it
//!    is outside the operator's `--only`/`--exclude` selection. A selector
//!    matching several repositories fans out to one link per match; a
//!    selector matching none yields a single failed task. A repository
//!    matched by several selectors of the same dependent is linked once.
//! 2. [`materialize`] checks that both working copies exist, replaces whatever
//!    is at the link path and creates the symlink.
//!
//! Every task is attempted; [`LinkResult::succeeded`] is true only when all
//! of them succeeded. Running [`link`] twice with the same inputs leaves the
//! same filesystem state.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::catalog::{check_package, RepositoryDescriptor};
use crate::error::{Error, Result};
use crate::labels::{self, LabelExpression};
use crate::outcome::all_succeeded;

/// Directory inside a repository where linked modules are placed.
pub const MODULES_DIR: &str = "node_modules";

/// One dependent/dependency pairing to link.
#[derive(Debug, Clone, Copy)]
pub struct LinkTask<'a> {
    pub dependent: &'a RepositoryDescriptor,
    /// The `requires` entry this task came from.
    pub selector: &'a str,
    /// `None` when the selector matched no repository.
    pub target: Option<&'a RepositoryDescriptor>,
}

/// Outcome of one link task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// `uri` of the dependent repository.
    pub dependent: String,
    /// Name of the required repository, or the selector when unresolved.
    pub dependency: String,
    /// Package name the dependency is linked under.
    pub package: Option<String>,
    pub link_path: Option<PathBuf>,
    pub target_path: Option<PathBuf>,
    pub outcome: std::result::Result<(), String>,
}

impl LinkRecord {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// All link records of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkResult {
    pub records: Vec<LinkRecord>,
}

impl LinkResult {
    pub fn succeeded(&self) -> bool {
        all_succeeded(self.records.iter().map(LinkRecord::is_success))
    }

    pub fn failures(&self) -> impl Iterator<Item = &LinkRecord> {
        self.records.iter().filter(|r| !r.is_success())
    }

    pub fn linked(&self) -> impl Iterator<Item = &LinkRecord> {
        self.records.iter().filter(|r| r.is_success())
    }
}

/// Resolves the `requires` selectors of `selected` against `catalog`.
pub fn plan<'a>(
    selected: &[&'a RepositoryDescriptor],
    catalog: &'a [RepositoryDescriptor],
) -> Vec<LinkTask<'a>> {
    let nothing = LabelExpression::default();
    let mut tasks = Vec::new();

    for &dependent in selected {
        let mut linked = HashSet::new();
        for (selector, group) in dependent.requirements() {
            let targets = labels::filter(catalog, &LabelExpression::from(group), &nothing);
            if targets.is_empty() {
                tasks.push(LinkTask {
                    dependent,
                    selector,
                    target: None,
                });
            }
            for target in targets {
                if !linked.insert(target.uri.as_str()) {
                    continue;
                }
                tasks.push(LinkTask {
                    dependent,
                    selector,
                    target: Some(target),
                });
            }
        }
    }

    tasks
}

/// Path of the symlink for `target` inside `dependent`'s working copy.
pub fn link_path(root: &Path, dependent: &RepositoryDescriptor, package: &str) -> PathBuf {
    // scoped packages nest as node_modules/@scope/name
    package
        .split('/')
        .fold(dependent.local_path(root).join(MODULES_DIR), |path, part| path.join(part))
}

/// Carries out one link task.
pub fn materialize(root: &Path, task: &LinkTask<'_>) -> LinkRecord {
    let mut record = LinkRecord {
        dependent: task.dependent.uri.clone(),
        dependency: task.selector.to_string(),
        package: None,
        link_path: None,
        target_path: None,
        outcome: Ok(()),
    };

    let Some(target) = task.target else {
        record.outcome = Err(format!("No repository matches `{}`", task.selector));
        return record;
    };
    record.dependency = target.name.clone();

    let Some(package) = target.package_name.as_deref() else {
        record.outcome = Err(format!("Repository {} has no package name to link as", target.name));
        return record;
    };

    if let Err(e) = check_package(package) {
        record.outcome = Err(e.to_string());
        return record;
    }

    let repo_path = task.dependent.local_path(root);
    let target_path = target.local_path(root);
    let path = link_path(root, task.dependent, package);
    record.package = Some(package.to_string());
    record.link_path = Some(path.clone());
    record.target_path = Some(target_path.clone());

    for dir in [&repo_path, &target_path] {
        if !dir.exists() {
            record.outcome = Err(format!("Does not exist: {}", dir.display()));
            return record;
        }
    }

    if let Err(e) = replace_with_symlink(&target_path, &path) {
        record.outcome = Err(e.to_string());
    }
    record
}

/// Plans and materializes every link for `selected`.
pub fn link(
    root: &Path,
    selected: &[&RepositoryDescriptor],
    catalog: &[RepositoryDescriptor],
) -> LinkResult {
    let records = plan(selected, catalog)
        .iter()
        .map(|task| materialize(root, task))
        .collect();
    LinkResult { records }
}

/// Removes any entry at `link` and points a fresh symlink at `target`.
pub fn replace_with_symlink(target: &Path, link: &Path) -> Result<()> {
    let wrap = |e: io::Error| Error::Link {
        path: link.to_path_buf(),
        message: e.to_string(),
    };

    remove_entry(link).map_err(wrap)?;
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    symlink_dir(target, link).map_err(wrap)
}

fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if metadata.file_type().is_symlink() {
        // directory symlinks on Windows need remove_dir
        fs::remove_file(path).or_else(|_| fs::remove_dir(path))
    } else if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}
