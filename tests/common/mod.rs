//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_root().with_catalog(catalogs::LINKED);
//!     fixture.command().arg("tree").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::catalogs;
    pub use super::TestFixture;
}

/// Catalog YAML snippets for testing.
#[allow(dead_code)]
pub mod catalogs {
    /// `app` requires `lib`; `api` has no requirements.
    pub const LINKED: &str = r#"
front:
  modules:
    app:
      package: "@org/app"
      url: https://git.example.com/org/app.git
      requires: ["name:lib"]
  shared:
    lib:
      package: "@org/lib"
      url: https://git.example.com/org/lib.git
back:
  modules:
    api:
      package: "@org/api"
      url: https://git.example.com/org/api.git
"#;

    /// A requirement that matches nothing.
    pub const DANGLING: &str = r#"
front:
  modules:
    app:
      package: "@org/app"
      url: https://git.example.com/org/app.git
      requires: ["name:ghost"]
"#;

    /// Invalid catalog: repository without a url.
    pub const MISSING_URL: &str = r#"
front:
  modules:
    app:
      package: "@org/app"
"#;
}

/// Name of the catalog file written by [`TestFixture::with_catalog`].
pub const CATALOG_FILE: &str = "catalog.yaml";

/// A temporary workspace directory.
///
/// Commands created with [`TestFixture::command`] run inside it and use its
/// catalog file when one was written.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
    catalog: Option<PathBuf>,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
            catalog: None,
        }
    }

    /// Mark the directory as project root.
    pub fn with_root(self) -> Self {
        self.temp_dir
            .child(".polyrepo")
            .write_str("This directory marked as project root")
            .expect("Failed to write root marker");
        self
    }

    /// Write a catalog file and pass it to every command.
    pub fn with_catalog(mut self, content: &str) -> Self {
        let child = self.temp_dir.child(CATALOG_FILE);
        child.write_str(content).expect("Failed to write catalog");
        self.catalog = Some(child.path().to_path_buf());
        self
    }

    /// Create a repository working copy at `uri` (`side/scope/name`).
    pub fn with_repo(self, uri: &str) -> Self {
        self.temp_dir
            .child(uri)
            .create_dir_all()
            .expect("Failed to create repository directory");
        self
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command running in this fixture's directory, without color
    /// and with the fixture's catalog.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("polyrepo");
        cmd.current_dir(self.path())
            .env_remove("POLYREPO_CATALOG")
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never");
        if let Some(catalog) = &self.catalog {
            cmd.arg("--catalog").arg(catalog);
        }
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_root_and_catalog() {
        let fixture = TestFixture::new().with_root().with_catalog(catalogs::LINKED);
        assert!(fixture.path().join(".polyrepo").is_file());
        assert!(fixture.path().join(CATALOG_FILE).is_file());
    }

    #[test]
    fn test_catalogs_are_valid_yaml() {
        for catalog in [catalogs::LINKED, catalogs::DANGLING, catalogs::MISSING_URL] {
            let parsed: Result<serde_yaml::Value, _> = serde_yaml::from_str(catalog);
            assert!(parsed.is_ok(), "invalid YAML: {}", catalog);
        }
    }
}
