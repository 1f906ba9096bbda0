//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    advance::AdvanceArgs, completions::CompletionsArgs, gate::GateArgs, init::InitArgs,
    metrics::MetricsArgs, project::ProjectCommands, solution::SolutionCommands,
    status::StatusArgs, submit::SubmitArgs,
};

#[derive(Parser)]
#[command(name = "dmaic")]
#[command(author, version, about = "DMAIC phase workflow engine")]
#[command(long_about = "Run improvement projects through gated Define, Measure, Analyze, Improve and Control phases, with FMEA risk, process capability and solution ranking derived from the recorded artifacts.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .dmaic/)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new DMAIC workspace
    Init(InitArgs),

    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Submit artifacts for a project's current phase
    Submit(SubmitArgs),

    /// Evaluate the current phase gate
    Gate(GateArgs),

    /// Advance a project to its next phase
    Advance(AdvanceArgs),

    /// Show project status, metrics and gate
    Status(StatusArgs),

    /// Candidate solution ranking and decisions
    #[command(subcommand)]
    Solution(SolutionCommands),

    /// Show derived quality and risk metrics
    Metrics(MetricsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (tables for lists, text for single items)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Just IDs, one per line
    Id,
}
