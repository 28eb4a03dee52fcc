//! # Git-Reference Packages
//!
//! A dependency whose range reads `polyrepo+<git-url>[#<ref>]` is served
//! straight from version control instead of a registry. The pieces:
//!
//! - [`locator`]: parsing descriptors, locators and git references, plus the
//!   ambient branch used when a reference names no ref.
//! - [`resolver`]: single-candidate resolution; metadata is read from the
//!   fetched manifest.
//! - [`fetcher`]: cache-first fetch, cloning through a [`transport`] under
//!   the [`limiter`], then packing the tree with [`archive`].
//! - [`cache`]: content-keyed archive store with marking and pruning.
//!
//! [`PolyrepoPlugin`] wires them together from a [`PluginConfig`] and exposes
//! the hooks an installer calls around a run.

pub mod archive;
pub mod cache;
pub mod fetcher;
pub mod limiter;
pub mod locator;
pub mod manifest;
pub mod report;
pub mod resolver;
pub mod transport;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use rayon::prelude::*;

use crate::defaults;
use crate::error::{Error, Result};
use crate::exec::{CommandRunner, SystemRunner};
use crate::git;
use cache::PackageCache;
use fetcher::{FetchResult, GitFetcher};
use limiter::CloneLimiter;
use locator::{pick_branch, AmbientBranch, Descriptor, Locator};
use report::Reporter;
use resolver::{GitResolver, ResolvedPackage};
use transport::{select_transport, ArchiveTransport};

/// Settings for the package plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    pub cache_dir: PathBuf,
    pub clone_concurrency: usize,
    pub compression_level: u32,
    /// Cache file prefixes owned by this plugin.
    pub prune_prefixes: Vec<String>,
    /// CI job token; selects the HTTP archive transport when set.
    pub job_token: Option<String>,
    /// Checkout whose current branch is the last ambient-branch fallback.
    pub checkout_dir: PathBuf,
    pub package_manager: String,
    pub default_language: String,
}

impl PluginConfig {
    pub fn new(cache_dir: impl Into<PathBuf>, checkout_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            clone_concurrency: defaults::CLONE_CONCURRENCY,
            compression_level: defaults::COMPRESSION_LEVEL,
            prune_prefixes: defaults::PRUNE_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            job_token: None,
            checkout_dir: checkout_dir.into(),
            package_manager: defaults::PACKAGE_MANAGER.to_string(),
            default_language: defaults::LANGUAGE_NAME.to_string(),
        }
    }

    /// Defaults plus the CI job token from the environment.
    pub fn from_env(cache_dir: Option<PathBuf>, checkout_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::new(
            cache_dir.unwrap_or_else(defaults::default_cache_dir),
            checkout_dir,
        );
        config.job_token = std::env::var(defaults::ENV_CI_JOB_TOKEN)
            .ok()
            .filter(|token| !token.is_empty());
        config
    }
}

pub struct PolyrepoPlugin {
    cache: Arc<PackageCache>,
    fetcher: Arc<GitFetcher>,
    resolver: GitResolver,
    reporter: Arc<dyn Reporter>,
    config: PluginConfig,
}

impl PolyrepoPlugin {
    /// Builds the plugin against the system `git` and the transport the
    /// environment selects. The ambient branch is resolved here, once.
    pub fn new(config: PluginConfig, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new(false));
        let transport = select_transport(config.job_token.as_deref(), runner.clone())?;
        let ambient = AmbientBranch::from_env(&config.checkout_dir);
        debug!(
            "Package transport: {}, ambient branch: {:?}",
            transport.name(),
            ambient.get()
        );
        Self::with_parts(config, transport, runner, ambient, reporter)
    }

    pub fn with_parts(
        config: PluginConfig,
        transport: Box<dyn ArchiveTransport>,
        runner: Arc<dyn CommandRunner>,
        ambient: AmbientBranch,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self> {
        let cache = Arc::new(PackageCache::new(&config.cache_dir));
        let fetcher = Arc::new(GitFetcher::new(
            cache.clone(),
            transport,
            runner,
            CloneLimiter::new(config.clone_concurrency),
            reporter.clone(),
            ambient,
            config.package_manager.clone(),
            config.compression_level,
        ));
        let resolver = GitResolver::new(fetcher.clone(), config.default_language.clone());
        Ok(Self {
            cache,
            fetcher,
            resolver,
            reporter,
            config,
        })
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn cache_dir(&self) -> &Path {
        self.cache.dir()
    }

    pub fn resolver(&self) -> &GitResolver {
        &self.resolver
    }

    pub fn fetcher(&self) -> &GitFetcher {
        &self.fetcher
    }

    /// Resolves `descriptor` to its single candidate and reads its metadata.
    pub fn resolve(&self, descriptor: &Descriptor) -> Result<ResolvedPackage> {
        let candidate = self
            .resolver
            .get_candidates(descriptor)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidLocator {
                locator: descriptor.to_string(),
                message: "no candidate".to_string(),
            })?;
        self.resolver.resolve(&candidate)
    }

    /// Fetches every descriptor in parallel, in input order.
    pub fn fetch_all(&self, descriptors: &[Descriptor]) -> Vec<Result<FetchResult>> {
        descriptors
            .par_iter()
            .map(|d| self.fetcher.fetch(&Locator::from_descriptor(d)))
            .collect()
    }

    /// Adds `BRANCH` to a child script environment.
    ///
    /// The value follows the ambient-branch priority. Each variable is taken
    /// from `env` when set there, otherwise from the process environment.
    /// Nothing is added when no branch is known.
    pub fn setup_script_environment(&self, env: &mut BTreeMap<String, String>) {
        let lookup = |key: &str| {
            env.get(key)
                .filter(|value| !value.is_empty())
                .cloned()
                .or_else(|| std::env::var(key).ok())
        };
        let branch = pick_branch(
            lookup(defaults::ENV_BRANCH),
            lookup(defaults::ENV_CI_REF),
            || git::current_branch(&self.config.checkout_dir).ok(),
        );
        if let Some(branch) = branch {
            env.insert(defaults::ENV_BRANCH.to_string(), branch);
        }
    }

    /// Removes cache entries owned by this plugin that the run never touched.
    pub fn after_all_installed(&self) -> Result<Vec<PathBuf>> {
        let removed = self.cache.prune(&self.config.prune_prefixes)?;
        for path in &removed {
            self.reporter.unused_cache_entry(path);
        }
        Ok(removed)
    }

    /// Resolves every descriptor in parallel, then prunes the cache.
    ///
    /// Cleanup is skipped when any package fails to resolve.
    pub fn install(&self, descriptors: &[Descriptor]) -> Result<Vec<ResolvedPackage>> {
        let resolved = descriptors
            .par_iter()
            .map(|d| self.resolve(d))
            .collect::<Result<Vec<_>>>()?;
        self.after_all_installed()?;
        Ok(resolved)
    }
}
