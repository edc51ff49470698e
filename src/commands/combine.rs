//! # Combine Command Implementation
//!
//! This module implements the `combine` subcommand, which flattens a layer
//! collection into a single target tree. Layers come either from an
//! explicit ordered list of directories (later directories win) or from
//! `--dotd` discovery, where every `<name>.d` directory under the root
//! mounts its `NN-*` subdirectories as ranked layers and everything else
//! passes through as the lowest-ranked root layer.
//!
//! Per file, multiple `.conf`/`.meta` sources are overlay-merged,
//! `.conf.spec` sources are concatenated, and everything else is copied
//! from the highest-ranked layer. An optional cleanup pass removes target
//! files no layer sourced.

use anyhow::Result;
use clap::Args;
use glob::Pattern;
use std::path::PathBuf;

use conflayer::combine::{Combiner, FileAction};
use conflayer::error::Error;
use conflayer::layer::LayerCollection;
use conflayer::output::OutputConfig;

/// Flatten a layer collection into a target tree
#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Layer directories, lowest rank first. Mutually exclusive with
    /// --dotd.
    #[arg(
        value_name = "LAYER",
        conflicts_with = "dotd",
        required_unless_present = "dotd"
    )]
    pub layers: Vec<PathBuf>,

    /// Discover layers under this root using the `dir.d` convention.
    #[arg(long, value_name = "DIR")]
    pub dotd: Option<PathBuf>,

    /// Directory to write the flattened tree into.
    #[arg(short, long, value_name = "DIR")]
    pub target: PathBuf,

    /// Only admit layers whose names match one of these patterns.
    #[arg(long, value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Drop layers whose names match one of these patterns.
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Target paths matching these patterns survive cleanup.
    #[arg(long, value_name = "PATTERN")]
    pub keep: Vec<String>,

    /// Skip the cleanup pass entirely.
    #[arg(long)]
    pub no_cleanup: bool,

    /// Report what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `combine` command.
pub fn execute(args: CombineArgs, output: &OutputConfig) -> Result<i32> {
    let mut collection = match &args.dotd {
        Some(root) => LayerCollection::discover(root)?,
        None => LayerCollection::from_dirs(&args.layers)?,
    };
    collection.filter(&patterns(&args.include)?, &patterns(&args.exclude)?);

    let summary = Combiner::new(collection, &args.target)
        .dry_run(args.dry_run)
        .cleanup(!args.no_cleanup)
        .keep_patterns(patterns(&args.keep)?)
        .output(output.clone())
        .run()?;

    for record in &summary.records {
        let verb = match record.action {
            FileAction::Created => "create",
            FileAction::Updated => "update",
            FileAction::Removed => "remove",
            FileAction::Unchanged => continue,
        };
        println!("{} {}", verb, record.path.display());
        if let Some(preview) = &record.preview {
            print!("{}", preview);
        }
    }
    println!(
        "{} created, {} updated, {} unchanged, {} removed{}",
        summary.created(),
        summary.updated(),
        summary.unchanged(),
        summary.removed(),
        if args.dry_run { " (dry run)" } else { "" }
    );
    Ok(0)
}

fn patterns(raw: &[String]) -> Result<Vec<Pattern>> {
    raw.iter()
        .map(|p| Pattern::new(p).map_err(|err| Error::Glob(err).into()))
        .collect()
}
