//! nestrun - hierarchical test runner
//!
//! A CLI tool that builds a suite tree from a declarative test plan and
//! runs it, streaming results while the tests execute.
//!
//! ## Features
//!
//! - Fixtures grouped into namespace suites by their dotted names
//! - Setup fixtures that wrap a whole namespace
//! - One-time and per-test setup/teardown with guaranteed teardown
//! - Ignored, explicit and not-runnable tests
//! - Progress, JSON lines and quiet output
//!
//! ## Usage
//!
//! ```bash
//! # Run a plan
//! nestrun run plan.yaml
//!
//! # Run one fixture, streaming JSON lines
//! nestrun run plan.yaml --select Billing.Invoices.TaxTests --format jsonl
//!
//! # Show the tree a plan builds
//! nestrun tree plan.yaml --sort
//!
//! # Create a config file
//! nestrun config init
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

mod cli;

use cli::Args;
use nestrun::config::{self, ConfigFile, EngineConfig, EnvConfig};
use nestrun::executor::TestAssemblyRunner;
use nestrun::models::RunSummary;
use nestrun::output::{ConsoleListener, OutputFormat, ResultFormatter};
use nestrun::plan::TestPlan;
use nestrun::utils::logger::{init_logger, LogLevel};

fn main() -> Result<()> {
    let args = Args::parse();

    let env = EnvConfig::load();
    let mut engine = load_config(&args, &env)?.engine;
    env.apply(&mut engine);
    engine.validate()?;

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        engine.log_level()
    };
    init_logger(level);
    if env.has_any() {
        debug!("Environment overrides: {:?}", env);
    }
    debug!("Effective configuration: {:?}", engine);

    match args.command {
        cli::Command::Run(run_args) => {
            let passed = run_plan(run_args, &engine)?;
            if !passed {
                std::process::exit(1);
            }
        }
        cli::Command::Tree(tree_args) => {
            show_tree(tree_args, &engine)?;
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, &engine)?;
        }
    }

    Ok(())
}

/// Config file precedence: --config, then NESTRUN_CONFIG, then the
/// standard locations
fn load_config(args: &Args, env: &EnvConfig) -> Result<ConfigFile> {
    if let Some(path) = &args.config {
        return ConfigFile::load(path);
    }
    if let Some(path) = &env.config_file {
        return ConfigFile::load(config::file::expand_path(path));
    }
    ConfigFile::load_default()
}

fn load_plan(path: &Path) -> Result<TestPlan> {
    let plan = TestPlan::load(path)
        .with_context(|| format!("Failed to load test plan {}", path.display()))?;
    info!(
        "Loaded plan {} with {} fixtures ({} tests)",
        plan.name,
        plan.fixtures.len(),
        plan.test_count()
    );
    Ok(plan)
}

/// Run a plan; returns whether every test that had to run passed
fn run_plan(args: cli::RunArgs, engine: &EngineConfig) -> Result<bool> {
    let format = match &args.format {
        Some(name) => OutputFormat::from_str(name)
            .with_context(|| format!("Unknown output format: {name}"))?,
        None => engine.output_format(),
    };

    let plan = load_plan(&args.plan)?;
    let suite = plan.build()?;

    let mut runner = TestAssemblyRunner::new()
        .with_autostop(args.autostop || engine.autostop)
        .with_sort(args.sort || engine.sort);
    runner.load(suite);

    let mut formatter = ResultFormatter::new(format);
    if args.no_color {
        formatter = formatter.no_color();
    }
    let listener = Arc::new(
        ConsoleListener::stdout(formatter.clone())
            .show_output(engine.show_output && !args.no_output),
    );

    let result = match &args.select {
        Some(full_name) => runner.run_selected(full_name, listener)?,
        None => runner.run(listener)?,
    };

    let summary = RunSummary::from_result(&result);
    println!("{}", formatter.format_summary(&summary));
    Ok(summary.is_all_passed())
}

fn show_tree(args: cli::TreeArgs, engine: &EngineConfig) -> Result<()> {
    let plan = load_plan(&args.plan)?;
    let mut suite = plan.build()?;
    if args.sort || engine.sort {
        suite.sort();
    }

    let formatter = ResultFormatter::new(OutputFormat::Progress);
    print!("{}", formatter.format_tree(&suite));
    Ok(())
}

fn manage_config(args: cli::ConfigArgs, engine: &EngineConfig) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            if output.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {}. Use --force to overwrite.",
                    output.display()
                );
            }

            ConfigFile::example().save(&output)?;
            println!("✓ Configuration file created: {}", output.display());
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show { format } => {
            let effective = ConfigFile {
                engine: engine.clone(),
                ..ConfigFile::default()
            };
            let output = if format == "json" {
                serde_json::to_string_pretty(&effective)?
            } else {
                serde_yaml::to_string(&effective)?
            };
            println!("{output}");
        }

        cli::ConfigAction::Env => {
            EnvConfig::load().print_summary();
            println!();
            config::env::print_env_help();
        }

        cli::ConfigAction::Validate { file } => {
            let path = match file.or_else(ConfigFile::find) {
                Some(path) => path,
                None => anyhow::bail!("No configuration file found"),
            };

            match ConfigFile::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {}", path.display());
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {}", path.display());
                    println!("  Error: {e}");
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}
