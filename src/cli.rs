//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::warn;

use polyrepo::catalog::Catalog;
use polyrepo::error::Error;
use polyrepo::exec::SystemRunner;
use polyrepo::labels::LabelExpression;
use polyrepo::output::{Console, OutputConfig};
use polyrepo::root;
use polyrepo::suggestions;
use polyrepo::workspace::Workspace;

use crate::commands;

/// Polyrepo - Clone, install and link a workspace of related repositories
#[derive(Parser, Debug)]
#[command(name = "polyrepo")]
#[command(version, about, long_about = None)]
#[command(after_help = "\
Label expressions for --only and --exclude:
  polyrepo clone -o ui-client         clone only repos named ui-client
  polyrepo clone -o back              clone all repos from the back side
  polyrepo clone -o back+shared       clone the shared scope of the back side
  polyrepo clone -o front -e ui-client
Prefix a value with name:, side:, scope: or package: to match one attribute only.")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Path to the working directory; the project root is searched from here
    #[arg(
        short = 'p',
        long = "path",
        visible_alias = "root",
        global = true,
        value_name = "DIR",
        default_value = "."
    )]
    path: PathBuf,

    /// Do not pass child process output through
    #[arg(long, global = true)]
    no_logs: bool,

    /// Target git branch for repos clone
    #[arg(short, long, global = true, value_name = "BRANCH")]
    branch: Option<String>,

    /// Run only for the listed repos, scopes or sides (repeatable)
    #[arg(short, long, global = true, value_name = "LABELS")]
    only: Vec<String>,

    /// Exclude repos, scopes or sides (repeatable)
    #[arg(short, long, global = true, value_name = "LABELS")]
    exclude: Vec<String>,

    /// Catalog file to use instead of the built-in catalog
    #[arg(long, global = true, value_name = "FILE", env = "POLYREPO_CATALOG")]
    catalog: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mark the --path directory as project root
    Mark,
    /// Show the project root and the repos tree
    #[command(visible_alias = "repos")]
    Tree(commands::tree::TreeArgs),
    /// Clone the selected repos into the project root
    Clone,
    /// Run a shell command in every selected repo
    Run(commands::run::RunArgs),
    /// Link shared modules between the selected repos
    #[command(visible_alias = "l")]
    Link,
    /// Install dependencies of every selected repo
    #[command(visible_alias = "i")]
    Install(commands::install::InstallArgs),
    /// Clone, install and link
    Setup(commands::setup::SetupArgs),
    /// Reinstall polyrepo from its repository
    Update(commands::update::UpdateArgs),
    /// Replace yarn files of every selected repo with a template
    UpdateYarn(commands::update_yarn::UpdateYarnArgs),
    /// Resolve and fetch git-reference packages
    Pkg(commands::pkg::PkgArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// Returns whether every step succeeded. Errors are fatal configuration
    /// problems.
    pub fn execute(self) -> Result<bool> {
        init_logging(&self.log_level);

        let context = Context {
            path: self.path,
            no_logs: self.no_logs,
            branch: self.branch,
            only: self.only,
            exclude: self.exclude,
            catalog: self.catalog,
            console: Console::new(OutputConfig::from_env_and_flag(&self.color)),
        };

        match self.command {
            Commands::Mark => commands::mark::execute(&context),
            Commands::Tree(args) => commands::tree::execute(args, &context),
            Commands::Clone => commands::clone::execute(&context),
            Commands::Run(args) => commands::run::execute(args, &context),
            Commands::Link => commands::link::execute(&context),
            Commands::Install(args) => commands::install::execute(args, &context),
            Commands::Setup(args) => commands::setup::execute(args, &context),
            Commands::Update(args) => commands::update::execute(args, &context),
            Commands::UpdateYarn(args) => commands::update_yarn::execute(args, &context),
            Commands::Pkg(args) => commands::pkg::execute(args, &context),
        }
    }
}

/// `RUST_LOG` wins over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

/// Global flags, shared by every command.
pub struct Context {
    pub path: PathBuf,
    pub no_logs: bool,
    pub branch: Option<String>,
    pub only: Vec<String>,
    pub exclude: Vec<String>,
    pub catalog: Option<PathBuf>,
    pub console: Console,
}

impl Context {
    /// Runner for child processes, passing output through unless `--no-logs`.
    pub fn runner(&self) -> SystemRunner {
        SystemRunner::new(!self.no_logs)
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        Catalog::load(self.catalog.as_deref()).map_err(|e| match &self.catalog {
            Some(path) => suggestions::catalog_unreadable(path, &e),
            None => anyhow::Error::new(e),
        })
    }

    /// Finds the project root above `--path`.
    pub fn find_root(&self) -> Result<PathBuf> {
        root::find_root(&self.path).map_err(|e| match e {
            Error::RootNotFound { start } => suggestions::root_not_found(&start),
            other => other.into(),
        })
    }

    /// Workspace over an existing project root.
    pub fn workspace(&self) -> Result<Workspace> {
        let root = self.find_root()?;
        self.workspace_at(root)
    }

    /// Workspace rooted at `root`.
    pub fn workspace_at(&self, root: PathBuf) -> Result<Workspace> {
        let workspace = Workspace::new(
            root,
            self.load_catalog()?,
            LabelExpression::parse(&self.only),
            LabelExpression::parse(&self.exclude),
        );
        if !self.only.is_empty() && workspace.selected().is_empty() {
            let names: Vec<&str> = workspace
                .catalog()
                .repos()
                .iter()
                .map(|r| r.name.as_str())
                .collect();
            warn!("{}", suggestions::nothing_selected(&self.only, &names));
        }
        Ok(workspace)
    }
}
