//! # Minimize Command Implementation
//!
//! This module implements the `minimize` subcommand, which reduces a local
//! override file down to the entries that actually differ from a merged
//! baseline. Keys whose values match the baseline are dropped; stanzas
//! reduced to nothing disappear; stanzas the baseline does not know about
//! are kept whole. Merging the minimized file back over the baseline
//! reproduces the original content.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use conflayer::merge::{merge, minimize};
use conflayer::parser::{parse_file, ParseOptions};
use conflayer::writer::{self, WriteOptions};

/// Reduce a file to its overrides against a merged baseline
#[derive(Args, Debug)]
pub struct MinimizeArgs {
    /// The file to shrink, rewritten in place.
    pub target: PathBuf,

    /// Baseline files, lowest rank first; they are merged before comparing.
    #[arg(long, value_name = "FILE", required = true, num_args = 1..)]
    pub baseline: Vec<PathBuf>,

    /// Print the minimized document instead of rewriting the target.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `minimize` command.
pub fn execute(args: MinimizeArgs) -> Result<i32> {
    let options = ParseOptions::preserving_comments();
    let target = parse_file(&args.target, &options)?;

    let mut baseline_docs = Vec::with_capacity(args.baseline.len());
    for file in &args.baseline {
        baseline_docs.push(parse_file(file, &options)?);
    }
    let baseline = merge(&baseline_docs);

    let minimized = minimize(&target, &baseline);
    if args.dry_run {
        print!("{}", writer::to_string(&minimized, &WriteOptions::default()));
    } else {
        writer::write_file(&minimized, &args.target, &WriteOptions::default())?;
    }
    Ok(0)
}
