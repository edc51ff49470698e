//! Layer discovery and ranking for directory-based configuration trees
//!
//! A [`Layer`] is one ranked contributor of files. Collections come from
//! two modes:
//!
//! - **Direct mode**: layers are supplied as an explicit ordered list of
//!   directories; later entries rank higher.
//! - **Directory-convention mode**: starting at a root, any directory named
//!   `<realname>.d` is a mount point. Its immediate subdirectories matching
//!   `NN-name` (two-digit prefix) become ranked layers contributing files
//!   under the logical path `<realname>`, ordered lexically by prefix then
//!   full name. Everything outside a mount point belongs to the implicit
//!   root layer, which always ranks lowest.
//!
//! Discovery is one-shot: a collection is built once per command invocation
//! and is read-only afterwards. Content is never loaded here; sources are
//! resolved lazily per requested logical path.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::warn;
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Display name of the implicit root layer.
pub const ROOT_LAYER_NAME: &str = "(root)";

/// Pattern a ranked layer directory must match inside a mount point.
const LAYER_DIR_PATTERN: &str = r"^\d{2}-.+$";

/// One ranked contributor in a layered configuration tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    /// Directory basename; used for display, filtering, and rank ordering.
    pub name: String,
    /// Physical directory holding this layer's files.
    pub root: PathBuf,
    /// Logical prefix the layer's files mount under (empty for direct-mode
    /// layers and the root layer).
    pub mount: PathBuf,
    /// Whether this is the implicit pass-through root layer.
    pub is_root: bool,
}

impl Layer {
    /// Resolve a logical path to this layer's physical file, if the layer
    /// contributes it.
    fn source_for(&self, logical: &Path) -> Option<PathBuf> {
        let rest = logical.strip_prefix(&self.mount).ok()?;
        if rest.as_os_str().is_empty() {
            return None;
        }
        let physical = self.root.join(rest);
        physical.is_file().then_some(physical)
    }
}

/// An ordered set of layers, lowest precedence first.
#[derive(Clone, Debug, Default)]
pub struct LayerCollection {
    layers: Vec<Layer>,
}

impl LayerCollection {
    /// Build a collection from an explicit ordered list of directories.
    ///
    /// Rank is the given order; later directories take precedence.
    pub fn from_dirs(dirs: &[PathBuf]) -> Result<Self> {
        let mut layers = Vec::with_capacity(dirs.len());
        for dir in dirs {
            if !dir.is_dir() {
                return Err(Error::LayerDiscovery {
                    path: dir.clone(),
                    message: "not a directory".to_string(),
                });
            }
            layers.push(Layer {
                name: dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| dir.display().to_string()),
                root: dir.clone(),
                mount: PathBuf::new(),
                is_root: false,
            });
        }
        Ok(Self { layers })
    }

    /// Discover layers under `root` using the `dir.d` convention.
    ///
    /// The implicit root layer is placed first so it always ranks lowest.
    pub fn discover(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::LayerDiscovery {
                path: root.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }
        let layer_dir = Regex::new(LAYER_DIR_PATTERN).map_err(Error::Regex)?;

        let mut layers = vec![Layer {
            name: ROOT_LAYER_NAME.to_string(),
            root: root.to_path_buf(),
            mount: PathBuf::new(),
            is_root: true,
        }];

        let mut ranked = Vec::new();
        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_mount_point(entry.path()));
        // Mount points are skipped by the walker above, so collect them from
        // a second shallow scan of each directory it does visit.
        for entry in walker {
            let entry = entry.map_err(|err| Error::LayerDiscovery {
                path: root.to_path_buf(),
                message: err.to_string(),
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            for child in entry.path().read_dir()? {
                let child = child?;
                let child_path = child.path();
                if child_path.is_dir() && is_mount_point(&child_path) {
                    ranked.extend(discover_mount_point(root, &child_path, &layer_dir)?);
                }
            }
        }

        ranked.sort_by(|a: &Layer, b: &Layer| (&a.mount, &a.name).cmp(&(&b.mount, &b.name)));
        layers.extend(ranked);
        Ok(Self { layers })
    }

    /// All layers, lowest precedence first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of layers, the implicit root layer included.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether no layers were found.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Drop layers whose names fail the include/exclude patterns.
    ///
    /// An empty include list admits everything. The implicit root layer is
    /// never removed by filtering.
    pub fn filter(&mut self, include: &[Pattern], exclude: &[Pattern]) {
        self.layers.retain(|layer| {
            if layer.is_root {
                return true;
            }
            let admitted =
                include.is_empty() || include.iter().any(|p| p.matches(&layer.name));
            admitted && !exclude.iter().any(|p| p.matches(&layer.name))
        });
    }

    /// The union, across all layers, of logical relative paths contributed
    /// by any layer.
    pub fn list_files(&self) -> Result<BTreeSet<PathBuf>> {
        let mut files = BTreeSet::new();
        for layer in &self.layers {
            let walker = WalkDir::new(&layer.root).into_iter().filter_entry(|entry| {
                // The root layer passes through everything outside the
                // mount-point convention.
                !(layer.is_root && entry.depth() > 0 && is_mount_point(entry.path()))
            });
            for entry in walker {
                let entry = entry.map_err(|err| Error::LayerDiscovery {
                    path: layer.root.clone(),
                    message: err.to_string(),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let rel = entry
                    .path()
                    .strip_prefix(&layer.root)
                    .map_err(|err| Error::Internal {
                        message: format!(
                            "walked outside layer {}: {}",
                            layer.root.display(),
                            err
                        ),
                    })?;
                files.insert(layer.mount.join(rel));
            }
        }
        Ok(files)
    }

    /// The ranked list of physical files contributing to one logical path,
    /// ascending rank (the last entry wins conflicts).
    pub fn get_sources(&self, logical: &Path) -> Vec<(&Layer, PathBuf)> {
        self.layers
            .iter()
            .filter_map(|layer| layer.source_for(logical).map(|path| (layer, path)))
            .collect()
    }
}

/// Whether a directory is a `<realname>.d` mount point.
fn is_mount_point(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.len() > 2 && name.ends_with(".d"))
}

fn discover_mount_point(
    root: &Path,
    mount_dir: &Path,
    layer_dir: &Regex,
) -> Result<Vec<Layer>> {
    let rel = mount_dir.strip_prefix(root).map_err(|err| Error::Internal {
        message: format!("mount point outside root: {}", err),
    })?;
    // Logical mount path is the sibling of the `.d` directory.
    let mut mount = rel.to_path_buf();
    let realname = mount
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(".d"))
        .ok_or_else(|| Error::Internal {
            message: format!("not a mount point: {}", mount_dir.display()),
        })?
        .to_string();
    mount.set_file_name(&realname);

    let mut layers = Vec::new();
    for child in mount_dir.read_dir()? {
        let child = child?;
        if !child.path().is_dir() {
            continue;
        }
        let name = child.file_name().to_string_lossy().into_owned();
        if layer_dir.is_match(&name) {
            layers.push(Layer {
                name,
                root: child.path(),
                mount: mount.clone(),
                is_root: false,
            });
        } else {
            warn!(
                "ignoring {} in mount point {}: does not match NN-name",
                name,
                mount_dir.display()
            );
        }
    }
    Ok(layers)
}
