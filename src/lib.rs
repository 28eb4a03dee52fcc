//! # Polyrepo Library
//!
//! This library provides the core functionality behind the `polyrepo`
//! command-line tool: managing a workspace of related repositories that are
//! cloned side by side and linked to each other as if they were published
//! packages, plus a package fetcher that installs sibling repositories
//! straight from git.
//!
//! ## Quick Example
//!
//! ```
//! use polyrepo::catalog::{Catalog, CatalogTree};
//! use polyrepo::labels::LabelExpression;
//!
//! let tree = CatalogTree::from_yaml(r#"
//! front:
//!   modules:
//!     ui-admin:
//!       package: "@polyrepo/ui-admin"
//!       url: git@gitlab.com:polyrepo/ui-admin.git
//!       requires: ["name:ui-shared"]
//!   shared:
//!     ui-shared:
//!       package: "@shared"
//!       url: git@gitlab.com:polyrepo/ui-shared.git
//! "#).unwrap();
//! let catalog = Catalog::from_tree(tree);
//!
//! let only = LabelExpression::parse(["front+shared"]);
//! let selected = catalog.filter(&only, &LabelExpression::default());
//! assert_eq!(selected.len(), 1);
//! assert_eq!(selected[0].uri, "front/shared/ui-shared");
//! ```
//!
//! ## Core Concepts
//!
//! - **Catalog (`catalog`)**: the `side -> scope -> name` tree of known
//!   repositories, flattened into addressable descriptors.
//! - **Labels (`labels`)**: `--only` / `--exclude` expressions, an OR of
//!   AND-groups over name, side, scope and package.
//! - **Root (`root`)**: the directory holding the `.polyrepo` marker, which
//!   anchors every repository path.
//! - **Linking (`link`)**: symlinks from a dependent's `node_modules` to the
//!   working copies of the repositories it requires.
//! - **Orchestration (`orchestrator`, `workspace`)**: clone, run, install,
//!   link and setup over the selected repositories, continuing past failures.
//! - **Packages (`package`)**: resolution and cached fetching of
//!   `polyrepo+<git-url>[#<ref>]` dependencies.

pub mod catalog;
pub mod defaults;
pub mod error;
pub mod exec;
pub mod git;
pub mod labels;
pub mod link;
pub mod orchestrator;
pub mod outcome;
pub mod output;
pub mod package;
pub mod root;
pub mod suggestions;
pub mod workspace;

#[cfg(test)]
mod labels_proptest;
