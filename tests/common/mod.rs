//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures, helper functions, and document
//! snippets to reduce duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = LayerFixture::new()
//!         .with_layer_file("10-base", "app.conf", docs::BASE);
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use assert_fs::TempDir;
use std::path::PathBuf;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::docs;
    #[allow(unused_imports)]
    pub use super::LayerFixture;
}

/// Common document snippets for testing.
#[allow(dead_code)]
pub mod docs {
    /// A base layer document.
    pub const BASE: &str = "[search]\ndispatch.ttl = 5m\nmax_count = 100\n";

    /// A site layer overriding one key.
    pub const SITE_OVERRIDE: &str = "[search]\ndispatch.ttl = 10m\n";

    /// A layer dropping the search stanza outright.
    pub const DROP_SEARCH: &str = "[search]\n_stanza = <<DROP>>\n";

    /// A document with a multi-line continuation value.
    pub const MULTILINE: &str = "[x]\nsearch = a \\\n| stats count\n";
}

/// A temporary tree of layer directories plus a target directory.
#[allow(dead_code)]
pub struct LayerFixture {
    pub temp: TempDir,
    layers: Vec<PathBuf>,
}

#[allow(dead_code)]
impl LayerFixture {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().expect("create temp dir"),
            layers: Vec::new(),
        }
    }

    /// Add `content` at `rel` inside the named layer directory, registering
    /// the layer (in call order, ascending rank) on first use.
    pub fn with_layer_file(mut self, layer: &str, rel: &str, content: &str) -> Self {
        let dir = self.temp.path().join(layer);
        if !self.layers.contains(&dir) {
            self.layers.push(dir.clone());
        }
        self.temp
            .child(format!("{}/{}", layer, rel))
            .write_str(content)
            .expect("write layer file");
        self
    }

    /// Add a file directly under the target directory (pre-existing state).
    pub fn with_target_file(self, rel: &str, content: &str) -> Self {
        self.temp
            .child(format!("target/{}", rel))
            .write_str(content)
            .expect("write target file");
        self
    }

    /// Layer directories in ascending rank order.
    pub fn layers(&self) -> &[PathBuf] {
        &self.layers
    }

    /// The target directory path (not necessarily created yet).
    pub fn target(&self) -> PathBuf {
        self.temp.path().join("target")
    }
}
