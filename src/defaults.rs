//! Default values for polyrepo configuration.
//!
//! This module provides centralized default values used across commands and
//! the package plugin, ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Name of the marker file identifying the workspace root.
pub const ROOT_FILE_NAME: &str = ".polyrepo";

/// Informational content written into a freshly created root marker.
pub const ROOT_FILE_CONTENT: &str = "This directory marked as project root";

/// Scheme prefix of git-reference package ranges.
pub const PACKAGE_SCHEME: &str = "polyrepo+";

/// Cache filename prefixes owned by the package plugin.
pub const PRUNE_PREFIXES: &[&str] = &["@polyrepo-", "@shared"];

/// Maximum number of simultaneous clone operations.
pub const CLONE_CONCURRENCY: usize = 2;

/// Gzip level used when packing fetched repositories.
pub const COMPRESSION_LEVEL: u32 = 6;

/// Package manager used for project preparation and `install`.
pub const PACKAGE_MANAGER: &str = "yarn";

/// Language name reported for packages whose manifest does not declare one.
pub const LANGUAGE_NAME: &str = "node";

/// Archive file name produced by both clone transports.
pub const ARCHIVE_FILE_NAME: &str = "archive.tar.gz";

/// Git repository the CLI reinstalls itself from.
pub const CLI_REPO_URL: &str = "ssh://git@gitlab.com/polyrepo/cli.git";

/// Environment variable holding an explicit branch override.
pub const ENV_BRANCH: &str = "BRANCH";

/// Environment variable holding the CI-provided ref name.
pub const ENV_CI_REF: &str = "CI_COMMIT_REF_NAME";

/// Environment variable holding the CI job access token.
pub const ENV_CI_JOB_TOKEN: &str = "CI_JOB_TOKEN";

/// SSH command forced on git so missing keys fail instead of prompting.
pub const GIT_SSH_COMMAND: &str = "ssh -o BatchMode=yes";

/// Returns the default package cache directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/polyrepo`
/// - macOS: `~/Library/Caches/polyrepo`
/// - Windows: `{FOLDERID_LocalAppData}\polyrepo`
///
/// Falls back to `.polyrepo-cache` in the current directory if the platform
/// cache directory cannot be determined. Overridden by `--cache-dir` or the
/// `POLYREPO_CACHE` environment variable.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".polyrepo-cache"))
        .join("polyrepo")
}
