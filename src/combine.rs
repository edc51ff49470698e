//! Combining a layer collection into a flattened target tree
//!
//! For every logical path the collection knows about, the combiner picks a
//! method from the file name and the number of contributing sources:
//!
//! - One source: copy its bytes, whatever the name.
//! - `*.conf` / `*.meta` with several sources: parse each, overlay merge in
//!   rank order, serialize the result.
//! - `*.conf.spec` with several sources: concatenate bytes in rank order,
//!   each chunk terminated by a newline; the output keeps the newest source
//!   modification time.
//! - Anything else with several sources: copy the highest-ranked source.
//!
//! Every write goes through the byte-compare in [`crate::writer`], so a
//! rerun over an unchanged collection touches nothing. After production an
//! optional cleanup pass removes target files no layer sourced, sparing
//! paths matched by keep patterns. Dry-run mode produces the same records
//! without writing, with a rendered diff preview for merged files.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::Pattern;
use log::{debug, info};
use walkdir::WalkDir;

use crate::diff;
use crate::error::{Error, Result};
use crate::layer::{Layer, LayerCollection};
use crate::merge;
use crate::output::OutputConfig;
use crate::parser::{self, ParseOptions};
use crate::writer::{self, WriteOptions, WriteStatus};

/// How one logical file is produced from its sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombineMethod {
    /// Byte-for-byte copy of the highest-ranked source.
    Copy,
    /// Parse and overlay merge all sources in rank order.
    Merge,
    /// Concatenate source bytes in rank order.
    Concatenate,
}

/// Pick the method for a logical path with `source_count` contributors.
pub fn select_method(logical: &Path, source_count: usize) -> CombineMethod {
    if source_count <= 1 {
        return CombineMethod::Copy;
    }
    let name = logical
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if name.ends_with(".conf.spec") {
        CombineMethod::Concatenate
    } else if name.ends_with(".conf") || name.ends_with(".meta") {
        CombineMethod::Merge
    } else {
        CombineMethod::Copy
    }
}

/// Memo of directories known to exist under the target.
///
/// Producing a large tree touches the same parent directories over and
/// over; the memo keeps that to one `create_dir_all` each. If the target
/// tree is manipulated externally mid-run the memo must be cleared.
#[derive(Debug, Default)]
pub struct DirCache {
    created: HashSet<PathBuf>,
}

impl DirCache {
    /// Ensure `dir` exists, creating it (and its ancestors) at most once.
    pub fn ensure(&mut self, dir: &Path) -> Result<()> {
        if self.created.contains(dir) {
            return Ok(());
        }
        fs::create_dir_all(dir)?;
        self.created.insert(dir.to_path_buf());
        Ok(())
    }

    /// Forget everything; the next `ensure` hits the filesystem again.
    pub fn clear(&mut self) {
        self.created.clear();
    }
}

/// What happened (or would happen) to one target file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileAction {
    Created,
    Updated,
    Unchanged,
    Removed,
}

impl From<WriteStatus> for FileAction {
    fn from(status: WriteStatus) -> Self {
        match status {
            WriteStatus::Created => FileAction::Created,
            WriteStatus::Updated => FileAction::Updated,
            WriteStatus::Unchanged => FileAction::Unchanged,
        }
    }
}

/// One per-file outcome record.
#[derive(Clone, Debug)]
pub struct ChangeRecord {
    /// Logical path relative to the target root.
    pub path: PathBuf,
    pub action: FileAction,
    pub method: CombineMethod,
    /// Rendered diff for merged files in dry-run mode; `None` when no
    /// preview applies, a placeholder note when the content is binary.
    pub preview: Option<String>,
}

/// Aggregate outcome of one combine run.
#[derive(Clone, Debug, Default)]
pub struct CombineSummary {
    pub records: Vec<ChangeRecord>,
}

impl CombineSummary {
    fn count(&self, action: FileAction) -> usize {
        self.records.iter().filter(|r| r.action == action).count()
    }

    pub fn created(&self) -> usize {
        self.count(FileAction::Created)
    }

    pub fn updated(&self) -> usize {
        self.count(FileAction::Updated)
    }

    pub fn unchanged(&self) -> usize {
        self.count(FileAction::Unchanged)
    }

    pub fn removed(&self) -> usize {
        self.count(FileAction::Removed)
    }

    /// Whether the run changed (or would change) anything at all.
    pub fn changed(&self) -> bool {
        self.records
            .iter()
            .any(|r| r.action != FileAction::Unchanged)
    }
}

/// Produces a flattened target tree from a layer collection.
pub struct Combiner {
    collection: LayerCollection,
    target: PathBuf,
    dry_run: bool,
    cleanup: bool,
    keep_patterns: Vec<Pattern>,
    output: OutputConfig,
    dirs: DirCache,
}

impl Combiner {
    pub fn new(collection: LayerCollection, target: impl Into<PathBuf>) -> Self {
        Self {
            collection,
            target: target.into(),
            dry_run: false,
            cleanup: true,
            keep_patterns: Vec::new(),
            output: OutputConfig::without_color(),
            dirs: DirCache::default(),
        }
    }

    /// Report what would change without writing anything.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Enable or disable the post-production cleanup pass.
    pub fn cleanup(mut self, enabled: bool) -> Self {
        self.cleanup = enabled;
        self
    }

    /// Target files matching any of these patterns survive cleanup.
    pub fn keep_patterns(mut self, patterns: Vec<Pattern>) -> Self {
        self.keep_patterns = patterns;
        self
    }

    /// Output configuration used for dry-run diff previews.
    pub fn output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    /// Produce every logical file, then run cleanup if enabled.
    pub fn run(&mut self) -> Result<CombineSummary> {
        let files = self.collection.list_files()?;
        let collection = self.collection.clone();
        let mut summary = CombineSummary::default();

        for logical in &files {
            let sources = collection.get_sources(logical);
            if sources.is_empty() {
                return Err(Error::Combine {
                    message: format!("listed file has no sources: {}", logical.display()),
                });
            }
            let method = select_method(logical, sources.len());
            debug!(
                "{} <- {} source(s) via {:?}",
                logical.display(),
                sources.len(),
                method
            );
            let record = match method {
                CombineMethod::Copy => self.produce_copy(logical, &sources)?,
                CombineMethod::Merge => self.produce_merge(logical, &sources)?,
                CombineMethod::Concatenate => self.produce_concat(logical, &sources)?,
            };
            summary.records.push(record);
        }

        if self.cleanup {
            self.remove_unsourced(&files, &mut summary)?;
        }

        info!(
            "combine: {} created, {} updated, {} unchanged, {} removed{}",
            summary.created(),
            summary.updated(),
            summary.unchanged(),
            summary.removed(),
            if self.dry_run { " (dry run)" } else { "" }
        );
        Ok(summary)
    }

    fn produce_copy(&mut self, logical: &Path, sources: &[(&Layer, PathBuf)]) -> Result<ChangeRecord> {
        // Ranks ascend, so the winner is the last source.
        let (_, winner) = &sources[sources.len() - 1];
        let content = read_source(winner)?;
        self.write_target(logical, &content, CombineMethod::Copy)
    }

    fn produce_merge(&mut self, logical: &Path, sources: &[(&Layer, PathBuf)]) -> Result<ChangeRecord> {
        let options = ParseOptions::preserving_comments();
        let mut documents = Vec::with_capacity(sources.len());
        for (_, path) in sources {
            documents.push(parser::parse_file(path, &options)?);
        }
        let merged = merge::merge(&documents);
        let dest = self.target.join(logical);

        if self.dry_run {
            let existing = match fs::metadata(&dest) {
                Ok(_) => Some(parser::parse_file(&dest, &options)?),
                Err(err) if err.kind() == ErrorKind::NotFound => None,
                Err(err) => return Err(Error::Io(err)),
            };
            let (action, preview) = match &existing {
                None => (FileAction::Created, None),
                Some(current) => {
                    let ops = diff::compare(current, &merged, true);
                    if current.content_eq(&merged) {
                        (FileAction::Unchanged, None)
                    } else {
                        (FileAction::Updated, Some(diff::render(&ops, &self.output)))
                    }
                }
            };
            return Ok(ChangeRecord {
                path: logical.to_path_buf(),
                action,
                method: CombineMethod::Merge,
                preview,
            });
        }

        self.ensure_parent(&dest)?;
        let status = writer::write_file(&merged, &dest, &WriteOptions::default())?;
        Ok(ChangeRecord {
            path: logical.to_path_buf(),
            action: status.into(),
            method: CombineMethod::Merge,
            preview: None,
        })
    }

    fn produce_concat(&mut self, logical: &Path, sources: &[(&Layer, PathBuf)]) -> Result<ChangeRecord> {
        let mut content = Vec::new();
        let mut newest: Option<SystemTime> = None;
        for (_, path) in sources {
            let chunk = read_source(path)?;
            content.extend_from_slice(&chunk);
            if content.last() != Some(&b'\n') {
                content.push(b'\n');
            }
            let modified = fs::metadata(path)?.modified()?;
            newest = Some(newest.map_or(modified, |n| n.max(modified)));
        }

        let record = self.write_target(logical, &content, CombineMethod::Concatenate)?;
        if !self.dry_run && record.action != FileAction::Unchanged {
            if let Some(modified) = newest {
                // Concatenated output advertises the age of its newest input.
                let file = fs::File::options()
                    .write(true)
                    .open(self.target.join(logical))?;
                file.set_modified(modified)?;
            }
        }
        Ok(record)
    }

    /// Byte-compare `content` against the target file and write it when it
    /// differs. In dry-run mode only the comparison runs.
    fn write_target(
        &mut self,
        logical: &Path,
        content: &[u8],
        method: CombineMethod,
    ) -> Result<ChangeRecord> {
        let dest = self.target.join(logical);

        if self.dry_run {
            let (action, preview) = match fs::read(&dest) {
                Ok(existing) if existing == content => (FileAction::Unchanged, None),
                Ok(existing) => {
                    let binary = std::str::from_utf8(content).is_err()
                        || std::str::from_utf8(&existing).is_err();
                    let preview =
                        binary.then(|| "no diff available (binary content)".to_string());
                    (FileAction::Updated, preview)
                }
                Err(err) if err.kind() == ErrorKind::NotFound => (FileAction::Created, None),
                Err(err) => return Err(Error::Io(err)),
            };
            return Ok(ChangeRecord {
                path: logical.to_path_buf(),
                action,
                method,
                preview,
            });
        }

        self.ensure_parent(&dest)?;
        let status = writer::write_bytes_if_changed(&dest, content)?;
        Ok(ChangeRecord {
            path: logical.to_path_buf(),
            action: status.into(),
            method,
            preview: None,
        })
    }

    fn ensure_parent(&mut self, dest: &Path) -> Result<()> {
        match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.dirs.ensure(parent),
            _ => Ok(()),
        }
    }

    /// Remove target files no layer sourced, sparing keep-pattern matches.
    fn remove_unsourced(
        &self,
        produced: &BTreeSet<PathBuf>,
        summary: &mut CombineSummary,
    ) -> Result<()> {
        if !self.target.is_dir() {
            return Ok(());
        }
        for entry in WalkDir::new(&self.target) {
            let entry = entry.map_err(|err| Error::Combine {
                message: format!("cleanup walk failed: {}", err),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.target)
                .map_err(|err| Error::Internal {
                    message: format!("cleanup walked outside target: {}", err),
                })?;
            if produced.contains(rel) {
                continue;
            }
            if self.keep_patterns.iter().any(|p| p.matches_path(rel)) {
                debug!("cleanup: keeping {}", rel.display());
                continue;
            }
            if !self.dry_run {
                fs::remove_file(entry.path())?;
            }
            summary.records.push(ChangeRecord {
                path: rel.to_path_buf(),
                action: FileAction::Removed,
                method: CombineMethod::Copy,
                preview: None,
            });
        }
        Ok(())
    }
}

fn read_source(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => Error::MissingFile {
            path: path.to_path_buf(),
        },
        _ => Error::Unreadable {
            path: path.to_path_buf(),
            message: err.to_string(),
        },
    })
}
