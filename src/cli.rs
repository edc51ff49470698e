//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use conflayer::output::OutputConfig;

use crate::commands;

/// Conflayer - Diff, merge, and flatten layered configuration trees
#[derive(Parser, Debug)]
#[command(name = "conflayer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare two configuration files
    Diff(commands::diff::DiffArgs),
    /// Overlay merge files in rank order
    Merge(commands::merge::MergeArgs),
    /// Reduce a file to its overrides against a merged baseline
    Minimize(commands::minimize::MinimizeArgs),
    /// Fold source files into their targets, then remove the sources
    Promote(commands::promote::PromoteArgs),
    /// Normalize stanza and key order
    Sort(commands::sort::SortArgs),
    /// Flatten a layer collection into a target tree
    Combine(commands::combine::CombineArgs),
    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command, returning the process exit code.
    pub fn execute(self) -> Result<i32> {
        let level = self.log_level.parse().unwrap_or(LevelFilter::Warn);
        env_logger::Builder::new()
            .filter_level(level)
            .format_timestamp(None)
            .try_init()
            .ok();

        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Diff(args) => commands::diff::execute(args, &output),
            Commands::Merge(args) => commands::merge::execute(args, &output),
            Commands::Minimize(args) => commands::minimize::execute(args),
            Commands::Promote(args) => commands::promote::execute(args),
            Commands::Sort(args) => commands::sort::execute(args),
            Commands::Combine(args) => commands::combine::execute(args, &output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
