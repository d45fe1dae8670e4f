//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "tproj",
    version,
    about = "Inspect, check and maintain tproj test project documents",
    long_about = "Inspect, check and maintain tproj test project documents.\n\n\
                  Works on project documents (<project-document>) and environment\n\
                  configuration documents (<environment-config>)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (default: ./tproj.toml when present).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, global = true)]
    pub log_format: Option<LogFormatArg>,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the entity tree of a project document.
    Inspect(ProjectArgs),

    /// Report unresolved references as JSON prompts (exit code 1 if any).
    Check(ProjectArgs),

    /// Re-print an XML document with stable indentation.
    Normalize(NormalizeArgs),

    /// Create a new project document.
    New(NewArgs),

    /// Summarize an environment configuration document.
    Environments(EnvironmentArgs),
}

#[derive(Parser)]
pub struct ProjectArgs {
    /// Project document to read.
    #[arg(value_name = "PROJECT")]
    pub project: PathBuf,
}

#[derive(Parser)]
pub struct NormalizeArgs {
    /// Document to re-print.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Write here instead of replacing FILE.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Spaces per nesting level (overrides the settings file).
    #[arg(long = "indent", value_name = "N")]
    pub indent: Option<usize>,
}

#[derive(Parser)]
pub struct NewArgs {
    /// Name of the project.
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Project document to create.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: PathBuf,

    /// Create a template project instead of a test project.
    #[arg(long = "template")]
    pub template: bool,

    /// Overwrite OUTPUT if it exists.
    #[arg(long = "force")]
    pub force: bool,

    /// Spaces per nesting level (overrides the settings file).
    #[arg(long = "indent", value_name = "N")]
    pub indent: Option<usize>,
}

#[derive(Parser)]
pub struct EnvironmentArgs {
    /// Environment configuration document to read.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
