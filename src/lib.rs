//! # Conflayer Library
//!
//! This library provides the core functionality for working with layered
//! stanza/key-value configuration trees. It is designed to be used by the
//! `conflayer` command-line tool but can also be integrated into other
//! applications that need to parse, diff, merge, or flatten such files.
//!
//! ## Quick Example
//!
//! ```
//! use conflayer::document::StanzaKey;
//! use conflayer::merge;
//! use conflayer::parser::{parse, ParseOptions};
//!
//! let base = parse("[search]\ndispatch.ttl = 5m\n", &ParseOptions::default()).unwrap();
//! let local = parse("[search]\ndispatch.ttl = 10m\n", &ParseOptions::default()).unwrap();
//!
//! let merged = merge::merge(&[base, local]);
//! let stanza = merged.get(&StanzaKey::named("search")).unwrap();
//! assert_eq!(stanza.get("dispatch.ttl"), Some("10m"));
//! ```
//!
//! ## Core Concepts
//!
//! The library is built around a few key concepts:
//!
//! - **Documents (`document`)**: The in-memory model. A document is an
//!   ordered map of stanzas; each stanza holds key/value entries and,
//!   optionally, the comments attached to it.
//! - **Parsing and Writing (`parser`, `writer`)**: Text to model and back,
//!   with line-continuation handling, duplicate policies, and crash-safe
//!   write-if-changed file output.
//! - **Diffing (`diff`)**: A three-level semantic comparison producing
//!   tagged operations, renderable as text or JSON.
//! - **Merging (`merge`)**: Overlay merge of ranked documents, including
//!   whole-stanza deletion via a reserved control key, plus the inverse
//!   `minimize` operation.
//! - **Layers (`layer`)**: Discovery and ranking of contributing
//!   directories, either listed explicitly or found through the `dir.d`
//!   naming convention.
//! - **Combining (`combine`)**: Flattening a layer collection into a single
//!   target tree, choosing copy, merge, or concatenation per file.
//!
//! ## Execution Flow
//!
//! The `combine` pipeline ties everything together:
//!
//! 1.  **Discovery**: Build a ranked [`layer::LayerCollection`].
//! 2.  **Enumeration**: Union the logical paths contributed by any layer.
//! 3.  **Production**: For each logical path, pick a method from its name
//!     and source count, then produce the target file through a
//!     byte-compare so reruns leave unchanged files untouched.
//! 4.  **Cleanup**: Remove target files no layer sourced, sparing
//!     keep-pattern matches.

pub mod combine;
pub mod diff;
pub mod document;
pub mod error;
pub mod layer;
pub mod merge;
pub mod output;
pub mod parser;
pub mod writer;

#[cfg(test)]
mod document_proptest;
