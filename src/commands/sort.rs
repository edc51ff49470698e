//! # Sort Command Implementation
//!
//! This module implements the `sort` subcommand, which normalizes files to
//! a canonical order: the global stanza first, remaining stanzas lexically,
//! and keys lexically within each stanza with comments kept ahead of them.
//! Sorted output is byte-idempotent, so a pre-commit hook can run it
//! repeatedly without churn.
//!
//! ## Exit Codes
//!
//! - `0`: all files already sorted (or stdout mode)
//! - `2`: at least one file was rewritten in place
//! - `22`: some files failed to parse; the rest were still processed

use anyhow::Result;
use clap::Args;
use log::error;
use std::fs;
use std::path::PathBuf;

use conflayer::parser::{parse, ParseOptions};
use conflayer::writer::{self, WriteOptions};

/// Normalize stanza and key order
#[derive(Args, Debug)]
pub struct SortArgs {
    /// Files to sort.
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Rewrite files in place instead of printing to stdout.
    #[arg(short = 'i', long)]
    pub in_place: bool,
}

/// Execute the `sort` command.
///
/// Parse failures are reported per file without stopping the batch.
pub fn execute(args: SortArgs) -> Result<i32> {
    let options = ParseOptions::preserving_comments();
    let mut failures = 0usize;
    let mut rewritten = 0usize;

    for file in &args.files {
        let text = match fs::read_to_string(file) {
            Ok(text) => text,
            Err(err) => {
                error!("{}: {}", file.display(), err);
                failures += 1;
                continue;
            }
        };
        let doc = match parse(&text, &options) {
            Ok(doc) => doc,
            Err(err) => {
                error!("{}: {}", file.display(), err);
                failures += 1;
                continue;
            }
        };
        let sorted = writer::to_string(&doc, &WriteOptions::sorted());

        if args.in_place {
            if writer::write_bytes_if_changed(file, sorted.as_bytes())?.changed() {
                rewritten += 1;
            }
        } else {
            print!("{}", sorted);
        }
    }

    if failures > 0 {
        error!("{} file(s) could not be sorted", failures);
        return Ok(22);
    }
    Ok(if rewritten > 0 { 2 } else { 0 })
}
