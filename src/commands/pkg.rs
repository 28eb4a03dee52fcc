//! # Pkg Command Implementation
//!
//! Exposes the git-reference package plugin on the command line. Packages are
//! given as descriptors, `<name>@polyrepo+<git-url>[#<ref>]`.
//!
//! ## Subcommands
//!
//! - **`resolve`**: resolve one descriptor and print its metadata as JSON
//! - **`fetch`**: fetch descriptors in parallel and print their cache entries
//! - **`install`**: resolve every descriptor, then prune stale cache entries
//! - **`env`**: print the variables added to child script environments

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Subcommand};

use polyrepo::package::locator::Descriptor;
use polyrepo::package::report::LogReporter;
use polyrepo::package::{PluginConfig, PolyrepoPlugin};
use polyrepo::suggestions;

use crate::cli::Context;

/// Resolve and fetch git-reference packages
#[derive(Args, Debug)]
pub struct PkgArgs {
    /// The package cache directory.
    ///
    /// If not provided, it defaults to the system's cache directory
    /// (e.g., `~/.cache/polyrepo` on Linux).
    /// Can also be set with the `POLYREPO_CACHE` environment variable.
    #[arg(long, value_name = "DIR", env = "POLYREPO_CACHE")]
    pub cache_dir: Option<PathBuf>,

    /// Maximum number of simultaneous clones
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: PkgSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum PkgSubcommand {
    /// Resolve a package and print its metadata
    Resolve {
        #[arg(value_name = "DESCRIPTOR")]
        descriptor: String,
    },
    /// Fetch packages into the cache
    Fetch {
        #[arg(value_name = "DESCRIPTOR", required = true)]
        descriptors: Vec<String>,
    },
    /// Resolve packages, then remove cache entries no longer used
    Install {
        #[arg(value_name = "DESCRIPTOR", required = true)]
        descriptors: Vec<String>,
    },
    /// Print the script environment additions
    Env,
}

/// Execute the `pkg` command.
pub fn execute(args: PkgArgs, context: &Context) -> Result<bool> {
    // the workspace checkout provides the fallback branch
    let checkout = context.find_root().unwrap_or_else(|_| context.path.clone());
    let mut config = PluginConfig::from_env(args.cache_dir, checkout);
    if let Some(concurrency) = args.concurrency {
        config.clone_concurrency = concurrency;
    }
    let plugin = PolyrepoPlugin::new(config, Arc::new(LogReporter))?;

    match args.command {
        PkgSubcommand::Resolve { descriptor } => {
            let descriptor = parse_descriptor(&descriptor)?;
            let resolved = plugin.resolve(&descriptor)?;
            println!("{}", serde_json::to_string_pretty(&resolved)?);
            Ok(true)
        }
        PkgSubcommand::Fetch { descriptors } => fetch(&plugin, &descriptors, context),
        PkgSubcommand::Install { descriptors } => {
            let descriptors = parse_descriptors(&descriptors)?;
            for package in plugin.install(&descriptors)? {
                context.console.success(&format!(
                    "{}@{} {}",
                    package.name, package.reference, package.version
                ));
            }
            Ok(true)
        }
        PkgSubcommand::Env => {
            let mut env = BTreeMap::new();
            plugin.setup_script_environment(&mut env);
            for (key, value) in env {
                println!("{}={}", key, value);
            }
            Ok(true)
        }
    }
}

/// Fetches all descriptors, reporting each failure without stopping.
fn fetch(plugin: &PolyrepoPlugin, descriptors: &[String], context: &Context) -> Result<bool> {
    let descriptors = parse_descriptors(descriptors)?;
    let mut succeeded = true;
    for (descriptor, result) in descriptors.iter().zip(plugin.fetch_all(&descriptors)) {
        match result {
            Ok(fetched) => println!("{} {}", fetched.locator, fetched.archive.display()),
            Err(e) => {
                context
                    .console
                    .error_title(&format!("Failed fetching {}", descriptor));
                context.console.error(&e.to_string());
                succeeded = false;
            }
        }
    }
    Ok(succeeded)
}

fn parse_descriptor(text: &str) -> Result<Descriptor> {
    Descriptor::parse(text).map_err(|e| suggestions::invalid_descriptor(text, &e))
}

fn parse_descriptors(texts: &[String]) -> Result<Vec<Descriptor>> {
    texts.iter().map(|text| parse_descriptor(text)).collect()
}
