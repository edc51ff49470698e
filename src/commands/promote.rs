//! # Promote Command Implementation
//!
//! This module implements the `promote` subcommand, which folds override
//! files into their targets: each target becomes `merge(target, source)`
//! and the source is removed. Given directories, every file in the source
//! directory is promoted into the file of the same name in the target
//! directory; targets that do not exist yet are created.
//!
//! This is the standing workflow for graduating `local/` overrides into
//! `default/` before packaging.

use anyhow::Result;
use clap::Args;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use conflayer::document::Document;
use conflayer::error::Error;
use conflayer::merge::merge;
use conflayer::parser::{parse_file, ParseOptions};
use conflayer::writer::{self, WriteOptions};
use walkdir::WalkDir;

/// Fold source files into their targets, then remove the sources
#[derive(Args, Debug)]
pub struct PromoteArgs {
    /// Source file or directory of overrides.
    pub source: PathBuf,

    /// Target file or directory to fold the overrides into.
    pub target: PathBuf,

    /// Keep the source files instead of removing them.
    #[arg(long)]
    pub keep: bool,
}

/// Execute the `promote` command.
pub fn execute(args: PromoteArgs) -> Result<i32> {
    if args.source.is_dir() {
        if args.target.exists() && !args.target.is_dir() {
            return Err(Error::Combine {
                message: format!(
                    "cannot promote directory {} into file {}",
                    args.source.display(),
                    args.target.display()
                ),
            }
            .into());
        }
        for entry in WalkDir::new(&args.source) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(&args.source)?;
            promote_file(entry.path(), &args.target.join(rel), args.keep)?;
        }
        return Ok(0);
    }

    promote_file(&args.source, &args.target, args.keep)?;
    Ok(0)
}

fn promote_file(source: &Path, target: &Path, keep: bool) -> Result<()> {
    let options = ParseOptions::preserving_comments();
    let source_doc = parse_file(source, &options)?;
    let target_doc = if target.is_file() {
        parse_file(target, &options)?
    } else {
        Document::new()
    };

    let merged = merge(&[target_doc, source_doc]);
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    writer::write_file(&merged, target, &WriteOptions::default())?;
    info!("promoted {} into {}", source.display(), target.display());

    if !keep {
        fs::remove_file(source)?;
    }
    Ok(())
}
