//! Workspace root discovery.
//!
//! The workspace root is the directory holding the `.polyrepo` marker file.
//! Every repository `uri` is resolved relative to it. Discovery walks from a
//! starting path up through its ancestors; the first directory with the marker
//! wins.

use std::fs;
use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::defaults::{ROOT_FILE_CONTENT, ROOT_FILE_NAME};
use crate::error::{Error, Result};

/// Returns true if `dir` directly contains the root marker.
pub fn is_root(dir: &Path) -> bool {
    dir.join(ROOT_FILE_NAME).is_file()
}

/// Finds the closest ancestor of `start` (inclusive) holding the root marker.
///
/// Relative paths are resolved against the current directory first.
pub fn find_root(start: &Path) -> Result<PathBuf> {
    let start = resolve(start)?;

    for dir in start.ancestors() {
        debug!("Looking for {} in {}", ROOT_FILE_NAME, dir.display());
        if is_root(dir) {
            return Ok(dir.to_path_buf());
        }
    }

    Err(Error::RootNotFound { start })
}

/// Writes the root marker into `dir`, creating the directory if needed.
///
/// Returns the absolute path of the marked directory.
pub fn mark_root(dir: &Path) -> Result<PathBuf> {
    let dir = resolve(dir)?;
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(ROOT_FILE_NAME), ROOT_FILE_CONTENT)?;
    Ok(dir)
}

/// Absolute form of `path` with `.` and `..` collapsed lexically.
pub fn resolve(path: &Path) -> Result<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}

/// Finds the root above `start`, marking `start` itself when there is none.
///
/// The boolean is true when a new marker was written.
pub fn find_or_mark_root(start: &Path) -> Result<(PathBuf, bool)> {
    match find_root(start) {
        Ok(root) => Ok((root, false)),
        Err(Error::RootNotFound { .. }) => Ok((mark_root(start)?, true)),
        Err(e) => Err(e),
    }
}
