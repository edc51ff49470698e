//! Serialization of documents back to text, and crash-safe file output
//!
//! The writer is the inverse of the parser: the global stanza is emitted
//! first with no header, comments are emitted as raw lines, and values
//! containing literal newlines are re-escaped with a trailing backslash.
//! An empty value is written as `key =` with no trailing space so diffs in
//! version control stay quiet.
//!
//! File output always goes through [`write_bytes_if_changed`]: serialize to
//! memory, byte-compare against the existing file, and only when different
//! write via a temp-file-then-rename sequence. Unchanged targets keep their
//! modification timestamps, and an interrupted run never leaves a
//! half-written file behind.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::document::{Document, Entry, Stanza, StanzaKey};
use crate::error::{Error, Result};

/// Serialization configuration.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Text emitted between stanza blocks. The default is one blank line.
    pub delimiter: String,
    /// Emit stanzas and keys in lexical order instead of insertion order.
    pub sort: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            delimiter: "\n".to_string(),
            sort: false,
        }
    }
}

impl WriteOptions {
    /// Options for `sort`-style output.
    pub fn sorted() -> Self {
        Self {
            sort: true,
            ..Self::default()
        }
    }
}

/// What a write-if-changed call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteStatus {
    /// The file did not exist before.
    Created,
    /// The file existed with different content.
    Updated,
    /// The file already had identical bytes; nothing was written.
    Unchanged,
}

impl WriteStatus {
    /// Whether the call wrote to disk.
    pub fn changed(&self) -> bool {
        !matches!(self, WriteStatus::Unchanged)
    }
}

/// Serialize a document to text.
pub fn to_string(doc: &Document, options: &WriteOptions) -> String {
    let mut order: Vec<(&StanzaKey, &Stanza)> = doc.iter().collect();
    if options.sort {
        // StanzaKey ordering puts the global stanza first.
        order.sort_by(|a, b| a.0.cmp(b.0));
    } else if let Some(pos) = order.iter().position(|(k, _)| **k == StanzaKey::Global) {
        let global = order.remove(pos);
        order.insert(0, global);
    }

    let blocks: Vec<String> = order
        .into_iter()
        .map(|(key, stanza)| stanza_block(key, stanza, options.sort))
        .collect();
    blocks.join(&options.delimiter)
}

fn stanza_block(key: &StanzaKey, stanza: &Stanza, sort: bool) -> String {
    let mut out = String::new();
    if let Some(name) = key.name() {
        out.push('[');
        out.push_str(name);
        out.push_str("]\n");
    }

    if sort {
        // Comments first in original order, then keys lexically; this keeps
        // sorted output byte-idempotent.
        for comment in stanza.comments() {
            out.push_str(comment);
            out.push('\n');
        }
        let mut pairs: Vec<(&str, &str)> = stanza.key_values().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        for (k, v) in pairs {
            push_key_value(&mut out, k, v);
        }
    } else {
        for entry in stanza.entries() {
            match entry {
                Entry::Comment(text) => {
                    out.push_str(text);
                    out.push('\n');
                }
                Entry::KeyValue { key, value } => push_key_value(&mut out, key, value),
            }
        }
    }
    out
}

fn push_key_value(out: &mut String, key: &str, value: &str) {
    if value.is_empty() {
        out.push_str(key);
        out.push_str(" =\n");
    } else {
        out.push_str(key);
        out.push_str(" = ");
        out.push_str(&value.replace('\n', "\\\n"));
        out.push('\n');
    }
}

/// Serialize a document and write it to `path` if the content changed.
pub fn write_file(doc: &Document, path: &Path, options: &WriteOptions) -> Result<WriteStatus> {
    let text = to_string(doc, options);
    write_bytes_if_changed(path, text.as_bytes())
}

/// Atomically replace `path` with `content` unless it already matches.
///
/// The comparison is binary-safe; replacement goes through a temp file in
/// the same directory followed by a rename. The parent directory must
/// already exist (the combine pipeline tracks created directories in its
/// own cache).
pub fn write_bytes_if_changed(path: &Path, content: &[u8]) -> Result<WriteStatus> {
    let status = match fs::read(path) {
        Ok(existing) if existing == content => return Ok(WriteStatus::Unchanged),
        Ok(_) => WriteStatus::Updated,
        Err(err) if err.kind() == ErrorKind::NotFound => WriteStatus::Created,
        Err(err) => return Err(Error::Io(err)),
    };

    let mut temp = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new_in(".")?,
    };
    temp.write_all(content)?;
    temp.persist(path).map_err(|err| Error::Io(err.error))?;
    Ok(status)
}
