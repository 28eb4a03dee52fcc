//! # Package Cache
//!
//! Fetched packages are stored as `<ident slug>-<key>.tgz` in a single cache
//! directory, where the key is derived from the normalised reference. A
//! lookup either hits an existing file or runs the loader, which writes a
//! fresh archive into a temporary file that is then atomically moved into
//! place. Lookups for the same entry are serialised; different entries
//! proceed independently.
//!
//! Every entry hit or written during a run is marked. After an install,
//! [`PackageCache::prune`] removes unmarked entries owned by this plugin
//! (recognised by filename prefix), which belong to branches or packages no
//! longer depended upon.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::package::locator::Locator;

/// Whether a lookup was served from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

/// Hex digest identifying a reference in cache file names.
pub fn cache_key(reference: &str) -> String {
    let digest = Sha256::digest(reference.as_bytes());
    hex::encode(digest)[..16].to_string()
}

fn lock<'a, T>(mutex: &'a Mutex<T>, context: &str) -> Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|_| Error::LockPoisoned {
        context: context.to_string(),
    })
}

pub struct PackageCache {
    dir: PathBuf,
    marked: Mutex<HashSet<PathBuf>>,
    entry_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PackageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            marked: Mutex::new(HashSet::new()),
            entry_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the entry for an already normalised locator.
    pub fn entry_path(&self, locator: &Locator) -> PathBuf {
        self.dir.join(format!(
            "{}-{}.tgz",
            locator.ident.slug(),
            cache_key(&locator.reference)
        ))
    }

    /// Returns the entry for `locator`, running `loader` to create it if
    /// missing. `on_miss` runs before the loader.
    pub fn fetch<L, M>(&self, locator: &Locator, on_miss: M, loader: L) -> Result<(PathBuf, CacheStatus)>
    where
        L: FnOnce(&mut File) -> Result<()>,
        M: FnOnce(),
    {
        let path = self.entry_path(locator);
        let entry_lock = self.entry_lock(&path)?;
        let _guard = lock(&entry_lock, "cache entry")?;

        if path.is_file() {
            self.mark(&path)?;
            return Ok((path, CacheStatus::Hit));
        }

        on_miss();
        fs::create_dir_all(&self.dir)?;
        let mut temp = NamedTempFile::new_in(&self.dir)?;
        loader(temp.as_file_mut())?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| Error::Cache {
            message: format!("failed to store {}: {}", path.display(), e.error),
        })?;

        self.mark(&path)?;
        Ok((path, CacheStatus::Miss))
    }

    pub fn mark(&self, path: &Path) -> Result<()> {
        lock(&self.marked, "cache marks")?.insert(path.to_path_buf());
        Ok(())
    }

    pub fn is_marked(&self, path: &Path) -> Result<bool> {
        Ok(lock(&self.marked, "cache marks")?.contains(path))
    }

    /// Deletes unmarked entries whose name starts with one of `prefixes`.
    ///
    /// Returns the removed paths.
    pub fn prune<S: AsRef<str>>(&self, prefixes: &[S]) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let marked = lock(&self.marked, "cache marks")?;
        let mut removed = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();

            let owned = prefixes.iter().any(|p| name.starts_with(p.as_ref()));
            if owned && entry.file_type()?.is_file() && !marked.contains(&path) {
                fs::remove_file(&path)?;
                removed.push(path);
            }
        }
        removed.sort();
        Ok(removed)
    }

    fn entry_lock(&self, path: &Path) -> Result<Arc<Mutex<()>>> {
        let mut locks = lock(&self.entry_locks, "cache entry locks")?;
        Ok(locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }
}
