//! Turns a git-reference locator into a package archive in the cache.
//!
//! On a cache miss the reference is cloned into a fresh temporary directory
//! (gated by the clone limiter), prepared, and packed under the package's
//! vendor path. A failed clone is reported as `Repository clone failed: ...`
//! and surfaced to the caller without retry.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::exec::{CommandRunner, ShellCommand};
use crate::package::archive;
use crate::package::cache::{CacheStatus, PackageCache};
use crate::package::limiter::CloneLimiter;
use crate::package::locator::{supports_range, AmbientBranch, GitReference, Locator};
use crate::package::manifest::Manifest;
use crate::package::report::Reporter;
use crate::package::transport::{ArchiveTransport, RemoteProject};

/// Script that triggers project preparation when declared.
pub const PREPARE_SCRIPT: &str = "prepack";

/// A fetched package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// The locator with its ref filled in.
    pub locator: Locator,
    /// The cache entry holding the package archive.
    pub archive: PathBuf,
    /// Directory inside the archive where the package lives.
    pub prefix: PathBuf,
    pub status: CacheStatus,
}

impl FetchResult {
    /// Path of `file` within the archive.
    pub fn entry(&self, file: &str) -> PathBuf {
        self.prefix.join(file)
    }
}

pub struct GitFetcher {
    cache: Arc<PackageCache>,
    transport: Box<dyn ArchiveTransport>,
    runner: Arc<dyn CommandRunner>,
    limiter: CloneLimiter,
    reporter: Arc<dyn Reporter>,
    ambient: AmbientBranch,
    package_manager: String,
    compression_level: u32,
    fetched: Mutex<HashMap<Locator, FetchResult>>,
}

impl GitFetcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cache: Arc<PackageCache>,
        transport: Box<dyn ArchiveTransport>,
        runner: Arc<dyn CommandRunner>,
        limiter: CloneLimiter,
        reporter: Arc<dyn Reporter>,
        ambient: AmbientBranch,
        package_manager: impl Into<String>,
        compression_level: u32,
    ) -> Self {
        Self {
            cache,
            transport,
            runner,
            limiter,
            reporter,
            ambient,
            package_manager: package_manager.into(),
            compression_level,
            fetched: Mutex::new(HashMap::new()),
        }
    }

    pub fn supports(&self, locator: &Locator) -> bool {
        supports_range(&locator.reference)
    }

    pub fn ambient(&self) -> &AmbientBranch {
        &self.ambient
    }

    /// Fetches `locator`, cache first.
    ///
    /// Results are remembered per locator for the lifetime of the fetcher,
    /// so resolving and then fetching the same package does the work once.
    pub fn fetch(&self, locator: &Locator) -> Result<FetchResult> {
        let normalized = locator.normalize(&self.ambient)?;

        if let Some(done) = self.remembered(&normalized)? {
            return Ok(done);
        }

        let (archive, status) = self.cache.fetch(
            &normalized,
            || {
                self.reporter.cache_miss(
                    &normalized,
                    "can't be found in the cache and will be fetched from the remote repository",
                )
            },
            |out| self.clone_from_remote(&normalized, out),
        )?;
        if status == CacheStatus::Hit {
            self.reporter.cache_hit(&normalized);
        }

        let result = FetchResult {
            locator: normalized.clone(),
            archive,
            prefix: normalized.ident.vendor_path(),
            status,
        };
        self.fetched
            .lock()
            .map_err(|_| Error::LockPoisoned {
                context: "fetch results".to_string(),
            })?
            .insert(normalized, result.clone());
        Ok(result)
    }

    fn remembered(&self, locator: &Locator) -> Result<Option<FetchResult>> {
        let fetched = self.fetched.lock().map_err(|_| Error::LockPoisoned {
            context: "fetch results".to_string(),
        })?;
        Ok(fetched.get(locator).cloned())
    }

    /// Clones, prepares and packs `locator` into `out`.
    fn clone_from_remote(&self, locator: &Locator, out: &mut File) -> Result<()> {
        let reference = locator.git_reference()?;
        let git_ref = reference.resolve_ref(&self.ambient)?;

        let scratch = self
            .limiter
            .run(|| self.clone(&reference, &git_ref))
            .map_err(|e| Error::clone_failed(&reference.url, &git_ref, e))?;

        let project = archive::project_root(scratch.path())?;
        self.prepare(locator, &project)?;
        archive::pack(
            &project,
            &locator.ident.vendor_path(),
            out,
            self.compression_level,
        )?;
        Ok(())
    }

    /// Downloads and extracts the reference into a new temporary directory.
    fn clone(&self, reference: &GitReference, git_ref: &str) -> Result<TempDir> {
        let project = RemoteProject::parse(&reference.url)?;
        let scratch = TempDir::new()?;
        self.reporter.info(&format!(
            "{} $ {}",
            scratch.path().display(),
            self.transport.describe(&project, git_ref)
        ));

        let archive_path = self.transport.download(&project, git_ref, scratch.path())?;
        archive::extract(&archive_path, scratch.path())?;
        fs::remove_file(&archive_path)?;
        Ok(scratch)
    }

    /// Runs the package manager's install and `prepack` when declared.
    fn prepare(&self, locator: &Locator, project: &Path) -> Result<()> {
        let Some(manifest) = Manifest::find(project, &locator.ident.to_string())? else {
            return Ok(());
        };
        if !manifest.has_script(PREPARE_SCRIPT) {
            return Ok(());
        }

        let pm = self.package_manager.as_str();
        for command in [
            ShellCommand::new(pm).arg("install"),
            ShellCommand::new(pm).args(["run", PREPARE_SCRIPT]),
        ] {
            self.reporter
                .info(&format!("{} $ {}", project.display(), command));
            self.runner.run(&command, project)?;
        }
        Ok(())
    }
}
