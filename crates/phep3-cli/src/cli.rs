//! Argument definitions.

use clap::{Args, Parser, Subcommand};
use phep3_compat::ExtrasSelection;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "phep3")]
#[command(about = "PHEP 3 compliance and PyHC Environment compatibility checks")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check pyproject.toml compliance with PHEP 3
    Check(CheckArgs),

    /// Check that the package installs alongside the PyHC Environment
    Compat(CompatArgs),

    /// Explain a saved uv resolution failure
    Interpret(InterpretArgs),
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Path to pyproject.toml
    #[arg(default_value = "pyproject.toml")]
    pub project_file: PathBuf,

    /// Schedule snapshot with version release dates (schedule.json)
    #[arg(short, long)]
    pub schedule: Option<PathBuf>,

    /// JSON file overriding support windows or the core-package list
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Treat warnings as errors
    #[arg(short = 'w', long)]
    pub fail_on_warning: bool,

    /// Skip the 6-month adoption rule for new versions
    #[arg(long)]
    pub no_adoption_check: bool,

    /// Packages whose errors are reported as warnings (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub ignore_errors_for: Vec<String>,

    /// Print workflow-command annotations (default on under GitHub Actions)
    #[arg(long)]
    pub annotations: bool,
}

#[derive(Debug, Args)]
pub struct CompatArgs {
    /// Path to pyproject.toml, or the project directory
    #[arg(default_value = "pyproject.toml")]
    pub project_file: PathBuf,

    /// Reference package list of the PyHC Environment (requirements format)
    #[arg(short, long)]
    pub packages: PathBuf,

    /// Constraints file passed to uv with -c
    #[arg(short, long)]
    pub constraints: Option<PathBuf>,

    /// Interpreter version of the PyHC Environment, e.g. 3.12.9
    #[arg(long, conflicts_with = "environment")]
    pub python_version: Option<String>,

    /// conda environment.yml to read the interpreter version from
    #[arg(long)]
    pub environment: Option<PathBuf>,

    /// Extras to check: auto, none, or a comma-separated list
    #[arg(long, default_value = "auto")]
    pub extras: ExtrasSelection,

    /// Resolutions to run at once
    #[arg(short, long, default_value_t = 4)]
    pub jobs: usize,

    /// Per-resolution timeout in seconds
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,

    /// Path to the uv executable (default: discovered)
    #[arg(long)]
    pub uv: Option<PathBuf>,

    /// Treat warnings as errors
    #[arg(short = 'w', long)]
    pub fail_on_warning: bool,

    /// Print workflow-command annotations (default on under GitHub Actions)
    #[arg(long)]
    pub annotations: bool,
}

#[derive(Debug, Args)]
pub struct InterpretArgs {
    /// File holding uv's stderr (default: standard input)
    pub file: Option<PathBuf>,

    /// Name of the package being checked
    #[arg(long)]
    pub package: Option<String>,

    /// Print findings as JSON
    #[arg(long)]
    pub json: bool,
}
