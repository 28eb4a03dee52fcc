//! # Error Handling
//!
//! This module defines the centralized error type for the `polyrepo` library.
//! It uses `thiserror` to derive a single `Error` enum covering every failure
//! mode the workspace orchestrator and the package fetcher can surface.
//!
//! Errors fall into three groups:
//!
//! - **Configuration errors** such as a missing workspace root or a malformed
//!   catalog. Commands that need a root treat these as fatal.
//! - **Per-repository errors** such as a failed clone, install or link. The
//!   orchestrator records them against the repository and carries on.
//! - **Fetch errors** raised while turning a git reference into a package
//!   archive. They are wrapped with the failed stage and handed back to the
//!   caller, which owns the retry policy.
//!
//! The `Result<T>` alias is used throughout the library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for polyrepo operations
#[derive(Error, Debug)]
pub enum Error {
    /// No directory containing the root marker was found.
    #[error("Project root is not found in {} and above", start.display())]
    RootNotFound { start: PathBuf },

    /// The repository catalog could not be parsed.
    #[error("Catalog parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    CatalogParse {
        message: String,
        /// Optional hint for how to fix the catalog
        hint: Option<String>,
    },

    /// Fetching a git reference into a package failed.
    ///
    /// The display form is the one surfaced to the installer, so it always
    /// starts with the failed stage.
    #[error("Repository clone failed: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        r#ref: String,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// A git command exited unsuccessfully.
    #[error("Git command failed in {}: {command} - {stderr}", cwd.display())]
    GitCommand {
        command: String,
        cwd: PathBuf,
        stderr: String,
    },

    /// An external command could not be started or exited unsuccessfully.
    #[error("Command `{command}` failed in {}: {message}", cwd.display())]
    CommandFailed {
        command: String,
        cwd: PathBuf,
        message: String,
    },

    /// An HTTP request failed or returned an error status.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// A package archive could not be read, extracted or written.
    #[error("Archive error for {}: {message}", path.display())]
    Archive { path: PathBuf, message: String },

    /// A package manifest is missing or invalid.
    #[error("Manifest error for {package}: {message}")]
    Manifest { package: String, message: String },

    /// A package reference does not follow the `polyrepo+<url>[#<ref>]` grammar.
    #[error("Invalid package locator `{locator}`: {message}")]
    InvalidLocator { locator: String, message: String },

    /// A symlink could not be materialized.
    #[error("Link error at {}: {message}", path.display())]
    Link { path: PathBuf, message: String },

    /// A package cache operation failed.
    #[error("Cache operation error: {message}")]
    Cache { message: String },

    /// A mutex guarding shared state has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An HTTP client error, wrapped from `reqwest::Error`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Wraps any error raised while fetching a git reference so the failed
    /// stage is visible to the caller.
    ///
    /// Errors that are already `GitClone` are returned untouched.
    pub fn clone_failed(url: &str, git_ref: &str, source: Error) -> Self {
        match source {
            Error::GitClone { .. } => source,
            other => Error::GitClone {
                url: url.to_string(),
                r#ref: git_ref.to_string(),
                message: other.to_string(),
                hint: None,
            },
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
