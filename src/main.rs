//! Steplint CLI - Pre-deployment checks for pipeline definitions
//!
//! ```bash
//! # Run every configuration under the current directory
//! steplint validate
//!
//! # Run one configuration, stopping at the first failing validation
//! steplint validate --configuration ci/steplint.toml --fail-fast
//!
//! # Show the available validation kinds
//! steplint list
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use steplint::config::{discover, LoadedConfiguration};
use steplint::execution::Report;
use steplint::validation::catalog::{self, VALIDATION_KINDS};

#[derive(Parser)]
#[command(name = "steplint")]
#[command(version)]
#[command(about = "Declarative pre-deployment checks for ML pipeline definitions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run configurations and print their reports
    Validate {
        /// Configuration file, or a directory to search
        #[arg(short, long, default_value = ".")]
        configuration: PathBuf,

        /// Directory to resolve relative paths from
        #[arg(short, long)]
        working_dir: Option<PathBuf>,

        /// Report format
        #[arg(long, short = 'o', default_value = "table", value_enum)]
        format: OutputFormat,

        /// Stop each configuration at its first failing validation
        #[arg(long)]
        fail_fast: bool,
    },

    /// List validation kinds
    List,

    /// Show details of a validation kind
    Info {
        /// Kind as written in configuration files, e.g. `role_name`
        kind: String,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let outcome = match cli.command {
        Commands::Validate {
            configuration,
            working_dir,
            format,
            fail_fast,
        } => validate(configuration, working_dir, format, fail_fast),
        Commands::List => {
            list_kinds();
            Ok(true)
        }
        Commands::Info { kind } => show_kind(&kind).map(|_| true),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether every report passed.
fn validate(
    configuration: PathBuf,
    working_dir: Option<PathBuf>,
    format: OutputFormat,
    fail_fast: bool,
) -> Result<bool> {
    if let Some(dir) = working_dir {
        std::env::set_current_dir(&dir)
            .with_context(|| format!("cannot change directory to {}", dir.display()))?;
    }

    let paths = discover(&configuration)?;
    let mut passed = true;

    for path in paths {
        let loaded = LoadedConfiguration::load(&path)
            .with_context(|| format!("loading {}", path.display()))?;
        let pipeline = loaded.pipeline().name().to_string();
        let report = loaded
            .run(fail_fast)
            .with_context(|| format!("running {}", path.display()))?;

        print_report(&path, &pipeline, &report, format)?;
        passed &= report.is_success();
    }

    Ok(passed)
}

fn print_report(path: &Path, pipeline: &str, report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Table => {
            println!("📋 {} (pipeline '{}')", path.display(), pipeline);
            println!();
            println!("{}", report.to_table());
            let mark = if report.is_success() { "✅" } else { "❌" };
            println!("{} {}", mark, report.summary());
            if report.stopped_early() {
                println!("⚠️  Stopped at the first failing validation");
            }
            println!();
        }
    }
    Ok(())
}

fn list_kinds() {
    println!("📦 Available Validations ({} total)\n", VALIDATION_KINDS.len());
    let width = VALIDATION_KINDS.iter().map(|k| k.kind.len()).max().unwrap_or(0);
    for kind in VALIDATION_KINDS {
        println!("  {:<width$}  {}", kind.kind, kind.name, width = width);
    }
    println!();
    println!("Use 'steplint info <kind>' for details.");
}

fn show_kind(kind: &str) -> Result<()> {
    let Some(found) = catalog::find(kind) else {
        bail!("unknown validation kind '{}'; use 'list' to see available kinds", kind);
    };
    println!("Validation: {}", found.name);
    println!("Kind: {}", found.kind);
    println!();
    println!("Description:");
    println!("  {}", found.description);
    Ok(())
}
