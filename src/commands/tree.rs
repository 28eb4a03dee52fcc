//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays the project
//! root and the repository catalog as a `side -> scope -> name` hierarchy.
//!
//! ## Functionality
//!
//! - **Catalog Visualization**: Displays every repository with its package
//!   name, remote and requirements
//! - **JSON Output**: `--json` prints the root and the catalog tree as JSON
//!
//! This command is a safe, read-only operation that does not modify any files.
//! A missing project root is reported, not treated as an error.

use std::borrow::Cow;
use std::io::Write;

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, Style, TreeItem};

use polyrepo::catalog::{CatalogTree, RepoSpec};

use crate::cli::Context;

/// Display the project root and the repos tree
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs, context: &Context) -> Result<bool> {
    let root = context.find_root().ok();
    let catalog = context.load_catalog()?;

    if args.json {
        let output = serde_json::json!({
            "root": root,
            "repos": catalog.tree(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(true);
    }

    context.console.info_title("Repos tree");
    match &root {
        Some(root) => println!("Project root: {}", root.display()),
        None => println!("Project root: not found above {}", context.path.display()),
    }
    print_tree(&build_tree(catalog.tree()))
        .map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(true)
}

/// Build the display tree for a catalog.
fn build_tree(tree: &CatalogTree) -> TreeNode {
    let sides = tree
        .sides()
        .iter()
        .map(|side| TreeNode {
            label: side.name.clone(),
            children: side
                .scopes
                .iter()
                .map(|scope| TreeNode {
                    label: scope.name.clone(),
                    children: scope
                        .repos
                        .iter()
                        .map(|(name, spec)| repo_node(name, spec))
                        .collect(),
                })
                .collect(),
        })
        .collect();

    TreeNode {
        label: "repos".to_string(),
        children: sides,
    }
}

fn repo_node(name: &str, spec: &RepoSpec) -> TreeNode {
    let label = match &spec.package {
        Some(package) => format!("{} ({}) {}", name, package, spec.url),
        None => format!("{} {}", name, spec.url),
    };
    let children = spec
        .requires
        .iter()
        .map(|selector| TreeNode {
            label: format!("requires {}", selector),
            children: vec![],
        })
        .collect();
    TreeNode { label, children }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: Write>(&self, f: &mut W, _style: &Style) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}
