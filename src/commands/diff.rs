//! # Diff Command Implementation
//!
//! This module implements the `diff` subcommand, which compares two
//! configuration files at the semantic level: formatting, comments, and
//! declaration order never count as differences.
//!
//! ## Functionality
//!
//! - **Three-level comparison**: whole-file shortcut, per-stanza, per-key
//! - **Output formats**: human-readable text with `+`/`-` markers, or JSON
//!   operation records for scripting
//! - **Exit Codes**: 0 if the files are semantically equal, 1 otherwise
//!
//! This command is a safe, read-only operation that does not modify any
//! files.

use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use conflayer::diff::{self, DiffResult};
use conflayer::output::OutputConfig;
use conflayer::parser::{parse_file, ParseOptions};

/// Output format for diff operations
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum DiffFormat {
    /// Human-readable text with +/- markers
    #[default]
    Text,
    /// JSON array of tagged diff operations
    Json,
}

/// Compare two configuration files
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// The file taken as the "before" side.
    pub file_a: PathBuf,

    /// The file taken as the "after" side.
    pub file_b: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = DiffFormat::Text)]
    pub format: DiffFormat,

    /// Always produce stanza- and key-level detail, even for equal files or
    /// files sharing no stanza names.
    #[arg(long)]
    pub no_shortcut: bool,
}

/// Execute the `diff` command.
///
/// Returns exit code 0 when the files are semantically equal and 1 when any
/// difference exists.
pub fn execute(args: DiffArgs, output: &OutputConfig) -> Result<i32> {
    let options = ParseOptions::default();
    let a = parse_file(&args.file_a, &options)?;
    let b = parse_file(&args.file_b, &options)?;

    let ops = diff::compare(&a, &b, !args.no_shortcut);
    let result = DiffResult::summarize(&ops);

    match args.format {
        DiffFormat::Text => {
            let rendered = diff::render(&ops, output);
            if !rendered.is_empty() {
                print!("{}", rendered);
            }
        }
        DiffFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&ops)?);
        }
    }

    Ok(match result {
        DiffResult::Equal => 0,
        DiffResult::Changed | DiffResult::NoCommonStanzas => 1,
    })
}
