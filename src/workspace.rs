//! The explicit context every orchestrator operation receives.

use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, RepositoryDescriptor};
use crate::labels::LabelExpression;

/// Workspace root, catalog and the operator's selection.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    catalog: Catalog,
    only: LabelExpression,
    exclude: LabelExpression,
}

impl Workspace {
    pub fn new(
        root: PathBuf,
        catalog: Catalog,
        only: LabelExpression,
        exclude: LabelExpression,
    ) -> Self {
        Self {
            root,
            catalog,
            only,
            exclude,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Repositories selected by `--only` and not excluded by `--exclude`.
    pub fn selected(&self) -> Vec<&RepositoryDescriptor> {
        self.catalog.filter(&self.only, &self.exclude)
    }

    /// Working copy location of `repo`.
    pub fn repo_path(&self, repo: &RepositoryDescriptor) -> PathBuf {
        repo.local_path(&self.root)
    }
}
