//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hierarchical test runner for declarative test plans
#[derive(Parser, Debug)]
#[command(name = "nestrun")]
#[command(author = "hephaex@gmail.com")]
#[command(version = "0.1.0")]
#[command(about = "Run nested test suites with fixtures and an event pump")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to the first standard location found)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a test plan
    Run(RunArgs),

    /// Print the suite tree a plan builds
    Tree(TreeArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Test plan file (YAML or JSON)
    pub plan: PathBuf,

    /// Output format (progress, jsonl, quiet)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Run only the test or suite with this full name
    #[arg(short, long)]
    pub select: Option<String>,

    /// Sort suites and tests by name before running
    #[arg(long)]
    pub sort: bool,

    /// Stop the event pump once every started test has finished
    #[arg(long)]
    pub autostop: bool,

    /// Do not print output written by tests
    #[arg(long)]
    pub no_output: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for tree command
#[derive(Parser, Debug)]
pub struct TreeArgs {
    /// Test plan file (YAML or JSON)
    pub plan: PathBuf,

    /// Sort suites and tests by name
    #[arg(long)]
    pub sort: bool,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./nestrun.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Show environment variable overrides
    Env,

    /// Validate a configuration file
    Validate {
        /// Configuration file to check
        file: Option<PathBuf>,
    },
}
