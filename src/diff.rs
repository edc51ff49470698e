//! Three-level semantic diff between two documents
//!
//! Comparison is independent of formatting: only the key/value view of each
//! stanza participates, with comments stripped out beforehand. The engine
//! works at three levels:
//!
//! - Level 0 (optional shortcut): structurally equal documents collapse to a
//!   single `Equal` at the whole-file location, and documents sharing no
//!   stanza names at all collapse to a single `Replace`, so unrelated files
//!   never explode into key-by-key noise.
//! - Level 1: the union of stanza names is visited with the global stanza
//!   first and the rest in lexical order; stanzas sharing no keys are
//!   reported as one whole-stanza `Replace`.
//! - Level 2: per-key `Insert`/`Delete`/`Equal`/`Replace` in lexical order.
//!
//! Key ordering is purely presentational; it exists so output is
//! reproducible run to run.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::document::{Document, Stanza, StanzaKey};
use crate::output::OutputConfig;

/// The kind of difference one operation describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffTag {
    Equal,
    Insert,
    Delete,
    Replace,
}

/// The unit of content an operation is located at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// The whole document.
    Global,
    /// One stanza.
    Stanza { stanza: StanzaKey },
    /// One key within a stanza.
    Key { stanza: StanzaKey, key: String },
}

/// The compared content carried on one side of an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffBody {
    /// A single key's value.
    Value(String),
    /// A whole stanza's key/value view.
    Stanza(BTreeMap<String, String>),
}

/// One tagged diff operation. The absent side of an insert or delete is
/// `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffOp {
    pub tag: DiffTag,
    pub location: Location,
    pub a: Option<DiffBody>,
    pub b: Option<DiffBody>,
}

impl DiffOp {
    /// Whether either side of a key-level replace spans multiple lines.
    ///
    /// Presenters render these as a line-oriented sub-diff instead of a
    /// single before/after pair.
    pub fn is_multiline(&self) -> bool {
        let spans = |body: &Option<DiffBody>| {
            matches!(body, Some(DiffBody::Value(v)) if v.contains('\n'))
        };
        spans(&self.a) || spans(&self.b)
    }
}

/// Overall outcome of a comparison, for exit-code reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffResult {
    /// The documents have identical content.
    Equal,
    /// At least one located difference exists.
    Changed,
    /// The documents share no stanza names; the diff is one full swap.
    NoCommonStanzas,
}

impl DiffResult {
    /// Summarize a sequence of operations.
    pub fn summarize(ops: &[DiffOp]) -> DiffResult {
        if let [only] = ops {
            if only.location == Location::Global {
                return match only.tag {
                    DiffTag::Equal => DiffResult::Equal,
                    _ => DiffResult::NoCommonStanzas,
                };
            }
        }
        if ops.iter().all(|op| op.tag == DiffTag::Equal) {
            DiffResult::Equal
        } else {
            DiffResult::Changed
        }
    }
}

/// Compare two documents.
///
/// With `shortcut` enabled, equal documents and documents with no stanza
/// names in common each collapse to a single whole-file operation.
pub fn compare(a: &Document, b: &Document, shortcut: bool) -> Vec<DiffOp> {
    if shortcut {
        if a.content_eq(b) {
            return vec![DiffOp {
                tag: DiffTag::Equal,
                location: Location::Global,
                a: None,
                b: None,
            }];
        }
        if !a.keys().any(|key| b.contains(key)) {
            return vec![DiffOp {
                tag: DiffTag::Replace,
                location: Location::Global,
                a: None,
                b: None,
            }];
        }
    }

    // BTreeSet ordering on StanzaKey visits the global stanza first and the
    // rest lexically.
    let names: BTreeSet<&StanzaKey> = a.keys().chain(b.keys()).collect();
    let mut ops = Vec::new();

    for name in names {
        match (a.get(name), b.get(name)) {
            (Some(sa), Some(sb)) => compare_stanza(name, sa, sb, &mut ops),
            (Some(sa), None) => ops.push(DiffOp {
                tag: DiffTag::Delete,
                location: Location::Stanza {
                    stanza: name.clone(),
                },
                a: Some(stanza_body(sa)),
                b: None,
            }),
            (None, Some(sb)) => ops.push(DiffOp {
                tag: DiffTag::Insert,
                location: Location::Stanza {
                    stanza: name.clone(),
                },
                a: None,
                b: Some(stanza_body(sb)),
            }),
            (None, None) => unreachable!("name came from the union"),
        }
    }
    ops
}

fn compare_stanza(name: &StanzaKey, a: &Stanza, b: &Stanza, ops: &mut Vec<DiffOp>) {
    if a.content_eq(b) {
        ops.push(DiffOp {
            tag: DiffTag::Equal,
            location: Location::Stanza {
                stanza: name.clone(),
            },
            a: None,
            b: None,
        });
        return;
    }

    let keys_a = a.kv_map();
    let keys_b = b.kv_map();
    if keys_a.keys().all(|k| !keys_b.contains_key(k)) {
        // Whole-stanza swap; no key-level detail.
        ops.push(DiffOp {
            tag: DiffTag::Replace,
            location: Location::Stanza {
                stanza: name.clone(),
            },
            a: Some(stanza_body(a)),
            b: Some(stanza_body(b)),
        });
        return;
    }

    let keys: BTreeSet<&str> = keys_a.keys().chain(keys_b.keys()).copied().collect();
    for key in keys {
        let location = Location::Key {
            stanza: name.clone(),
            key: key.to_string(),
        };
        match (keys_a.get(key), keys_b.get(key)) {
            (Some(va), Some(vb)) if va == vb => ops.push(DiffOp {
                tag: DiffTag::Equal,
                location,
                a: Some(DiffBody::Value(va.to_string())),
                b: Some(DiffBody::Value(vb.to_string())),
            }),
            (Some(va), Some(vb)) => ops.push(DiffOp {
                tag: DiffTag::Replace,
                location,
                a: Some(DiffBody::Value(va.to_string())),
                b: Some(DiffBody::Value(vb.to_string())),
            }),
            (Some(va), None) => ops.push(DiffOp {
                tag: DiffTag::Delete,
                location,
                a: Some(DiffBody::Value(va.to_string())),
                b: None,
            }),
            (None, Some(vb)) => ops.push(DiffOp {
                tag: DiffTag::Insert,
                location,
                a: None,
                b: Some(DiffBody::Value(vb.to_string())),
            }),
            (None, None) => unreachable!("key came from the union"),
        }
    }
}

fn stanza_body(stanza: &Stanza) -> DiffBody {
    DiffBody::Stanza(
        stanza
            .key_values()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

/// Render operations as human-readable text with `+`/`-` markers.
///
/// Equal operations are omitted. Multi-line value replacements are shown as
/// a line-oriented sub-diff.
pub fn render(ops: &[DiffOp], output: &OutputConfig) -> String {
    let mut out = String::new();
    for op in ops {
        if op.tag == DiffTag::Equal {
            continue;
        }
        match &op.location {
            Location::Global => match op.tag {
                DiffTag::Replace => out.push_str("~ entire file replaced (no common stanzas)\n"),
                _ => {}
            },
            Location::Stanza { stanza } => {
                match op.tag {
                    DiffTag::Delete => render_stanza_side(&mut out, '-', stanza, &op.a, output),
                    DiffTag::Insert => render_stanza_side(&mut out, '+', stanza, &op.b, output),
                    DiffTag::Replace => {
                        render_stanza_side(&mut out, '-', stanza, &op.a, output);
                        render_stanza_side(&mut out, '+', stanza, &op.b, output);
                    }
                    DiffTag::Equal => {}
                }
            }
            Location::Key { stanza, key } => {
                out.push_str(&output.context(&format!("~ [{}]", stanza)));
                out.push('\n');
                match op.tag {
                    DiffTag::Delete => {
                        render_key_side(&mut out, '-', key, &op.a, output);
                    }
                    DiffTag::Insert => {
                        render_key_side(&mut out, '+', key, &op.b, output);
                    }
                    DiffTag::Replace if op.is_multiline() => {
                        render_multiline(&mut out, key, &op.a, &op.b, output);
                    }
                    DiffTag::Replace => {
                        render_key_side(&mut out, '-', key, &op.a, output);
                        render_key_side(&mut out, '+', key, &op.b, output);
                    }
                    DiffTag::Equal => {}
                }
            }
        }
    }
    out
}

fn render_stanza_side(
    out: &mut String,
    marker: char,
    stanza: &StanzaKey,
    body: &Option<DiffBody>,
    output: &OutputConfig,
) {
    let Some(DiffBody::Stanza(map)) = body else {
        return;
    };
    out.push_str(&output.marker(marker, &format!("{} [{}]", marker, stanza)));
    out.push('\n');
    for (key, value) in map {
        let line = format!("{} {} = {}", marker, key, value.replace('\n', "\\\n"));
        out.push_str(&output.marker(marker, &line));
        out.push('\n');
    }
}

fn render_key_side(
    out: &mut String,
    marker: char,
    key: &str,
    body: &Option<DiffBody>,
    output: &OutputConfig,
) {
    let Some(DiffBody::Value(value)) = body else {
        return;
    };
    let line = format!("  {} {} = {}", marker, key, value.replace('\n', "\\\n"));
    out.push_str(&output.marker(marker, &line));
    out.push('\n');
}

/// Classic line-oriented sub-diff: common prefix/suffix lines stay as
/// context, the differing middle is shown as removals then additions.
fn render_multiline(
    out: &mut String,
    key: &str,
    a: &Option<DiffBody>,
    b: &Option<DiffBody>,
    output: &OutputConfig,
) {
    let empty = String::new();
    let a = match a {
        Some(DiffBody::Value(v)) => v,
        _ => &empty,
    };
    let b = match b {
        Some(DiffBody::Value(v)) => v,
        _ => &empty,
    };
    let lines_a: Vec<&str> = a.lines().collect();
    let lines_b: Vec<&str> = b.lines().collect();

    let prefix = lines_a
        .iter()
        .zip(lines_b.iter())
        .take_while(|(x, y)| x == y)
        .count();
    let max_suffix = lines_a.len().min(lines_b.len()) - prefix;
    let suffix = lines_a
        .iter()
        .rev()
        .zip(lines_b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
        .min(max_suffix);

    out.push_str(&output.context(&format!("    {} =", key)));
    out.push('\n');
    for line in &lines_a[..prefix] {
        out.push_str(&format!("      {}\n", line));
    }
    for line in &lines_a[prefix..lines_a.len() - suffix] {
        out.push_str(&output.marker('-', &format!("    - {}", line)));
        out.push('\n');
    }
    for line in &lines_b[prefix..lines_b.len() - suffix] {
        out.push_str(&output.marker('+', &format!("    + {}", line)));
        out.push('\n');
    }
    for line in &lines_a[lines_a.len() - suffix..] {
        out.push_str(&format!("      {}\n", line));
    }
}
