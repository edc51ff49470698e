//! # Merge Command Implementation
//!
//! This module implements the `merge` subcommand, which overlay-merges two
//! or more configuration files. Files are given in ascending rank order:
//! when the same key appears in several files, the last file's value wins.
//! A stanza can be deleted outright by a higher-ranked file declaring
//! `_stanza = <<DROP>>`.
//!
//! Without `--target` the merged document goes to stdout. With `--target`
//! it is written to that file, or previewed as a diff against the file's
//! current content under `--dry-run`.

use anyhow::Result;
use clap::Args;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use conflayer::diff;
use conflayer::document::Document;
use conflayer::error::Error;
use conflayer::merge::merge;
use conflayer::output::OutputConfig;
use conflayer::parser::{parse_file, ParseOptions};
use conflayer::writer::{self, WriteOptions};

/// Overlay merge files in rank order
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Input files, lowest rank first; later files win conflicts.
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Write the merged document here instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub target: Option<PathBuf>,

    /// With --target, show a diff against the target's current content
    /// instead of writing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `merge` command.
pub fn execute(args: MergeArgs, output: &OutputConfig) -> Result<i32> {
    let options = ParseOptions::preserving_comments();
    let mut documents = Vec::with_capacity(args.files.len());
    for file in &args.files {
        documents.push(parse_file(file, &options)?);
    }
    let merged = merge(&documents);

    let Some(target) = &args.target else {
        print!("{}", writer::to_string(&merged, &WriteOptions::default()));
        return Ok(0);
    };

    if args.dry_run {
        let current = match fs::metadata(target) {
            Ok(_) => parse_file(target, &options)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Document::new(),
            Err(err) => return Err(Error::Io(err).into()),
        };
        let ops = diff::compare(&current, &merged, true);
        print!("{}", diff::render(&ops, output));
        return Ok(0);
    }

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    writer::write_file(&merged, target, &WriteOptions::default())?;
    Ok(0)
}
