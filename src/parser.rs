//! Parser for stanza/key=value configuration text
//!
//! Parsing happens in three passes over the input:
//!
//! 1. A leading UTF-8 byte-order mark is stripped.
//! 2. Physical lines ending in an odd number of trailing backslashes are
//!    joined into logical lines, with a literal newline at the join point.
//!    This pass runs before any stanza or line splitting so multi-line
//!    search strings and macros survive intact.
//! 3. Logical lines are grouped on `[stanza]` headers and classified as
//!    comments, `key = value` pairs, or junk. Lines before the first header
//!    land in the global stanza.
//!
//! Duplicate stanzas and keys are resolved during parsing according to
//! [`ParseOptions`]; a fully parsed [`Document`] never holds collisions.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;

use crate::document::{Document, StanzaKey};
use crate::error::{Error, Result};

/// How a repeated stanza name or key is resolved during parsing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DupPolicy {
    /// The new occurrence replaces everything from prior occurrences.
    #[default]
    Overwrite,
    /// Occurrences are unioned; the last value wins per key.
    Merge,
    /// A repeat is a parse error.
    Exception,
}

/// Immutable parse configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Policy for a repeated `[stanza]` header.
    pub dup_stanza: DupPolicy,
    /// Policy for a repeated key within one stanza occurrence.
    pub dup_key: DupPolicy,
    /// Preserve comment lines as stanza entries.
    pub keep_comments: bool,
    /// Reject junk lines instead of dropping them.
    pub strict: bool,
    /// Lowercase keys as they are read.
    pub lowercase_keys: bool,
    /// Join backslash-continued lines. Disable only for formats where a
    /// trailing backslash is literal.
    pub handle_continuations: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            dup_stanza: DupPolicy::Overwrite,
            dup_key: DupPolicy::Overwrite,
            keep_comments: false,
            strict: false,
            lowercase_keys: false,
            handle_continuations: true,
        }
    }
}

impl ParseOptions {
    /// Options used when merging layered files: comments survive so layer
    /// provenance notes carry through to the combined output.
    pub fn preserving_comments() -> Self {
        Self {
            keep_comments: true,
            ..Self::default()
        }
    }
}

/// Parse a complete document from text.
pub fn parse(text: &str, options: &ParseOptions) -> Result<Document> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut doc = Document::new();
    let mut current = StanzaKey::Global;
    // Keys seen in the current stanza occurrence; duplicate detection is
    // scoped to one occurrence so stanza-level merge stays last-wins.
    let mut occurrence_keys: Vec<String> = Vec::new();

    for (line_no, line) in logical_lines(text, options.handle_continuations) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            if options.keep_comments {
                doc.entry(current.clone()).push_comment(line.clone());
            }
            continue;
        }

        if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
            // Stanza name is everything between the first and last bracket.
            let name = trimmed[1..trimmed.len() - 1].trim().to_string();
            current = StanzaKey::named(name);
            occurrence_keys.clear();

            if doc.contains(&current) {
                match options.dup_stanza {
                    DupPolicy::Exception => {
                        return Err(Error::DuplicateStanza {
                            name: current.to_string(),
                            line: line_no,
                        });
                    }
                    DupPolicy::Overwrite => {
                        doc.remove(&current);
                    }
                    DupPolicy::Merge => {}
                }
            }
            // Blank stanzas (a header with no keys) are valid and round-trip.
            doc.entry(current.clone());
            continue;
        }

        if let Some(eq) = line.find('=') {
            let mut key = line[..eq].trim().to_string();
            let value = line[eq + 1..].trim_start().to_string();
            if options.lowercase_keys {
                key = key.to_lowercase();
            }

            if occurrence_keys.iter().any(|k| *k == key) {
                if options.dup_key == DupPolicy::Exception {
                    return Err(Error::DuplicateKey {
                        stanza: current.to_string(),
                        key,
                        line: line_no,
                    });
                }
            } else {
                occurrence_keys.push(key.clone());
            }
            doc.entry(current.clone()).set(key, value);
            continue;
        }

        // A stray bracket fragment is malformed regardless of strictness.
        if trimmed.starts_with('[') || trimmed.ends_with(']') {
            return Err(Error::DanglingStanzaHeader {
                line: line_no,
                text: trimmed.to_string(),
            });
        }

        if options.strict {
            return Err(Error::UnexpectedLine {
                line: line_no,
                text: trimmed.to_string(),
            });
        }
        debug!("dropping junk line {}: {:?}", line_no, trimmed);
    }

    if doc
        .get(&StanzaKey::Global)
        .is_some_and(|stanza| stanza.is_empty())
    {
        doc.remove(&StanzaKey::Global);
    }

    Ok(doc)
}

/// Parse a document from a file on disk.
///
/// Missing and unreadable files are reported as distinct conditions so
/// batch operations can continue past one bad file.
pub fn parse_file(path: &Path, options: &ParseOptions) -> Result<Document> {
    let bytes = fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => Error::MissingFile {
            path: path.to_path_buf(),
        },
        _ => Error::Unreadable {
            path: path.to_path_buf(),
            message: err.to_string(),
        },
    })?;
    let text = String::from_utf8(bytes).map_err(|_| Error::Unreadable {
        path: path.to_path_buf(),
        message: "content is not valid UTF-8".to_string(),
    })?;
    parse(&text, options)
}

/// Join physical lines into logical lines.
///
/// A line ending in an odd number of trailing backslashes continues onto
/// the next physical line; the continuation backslash is replaced by a
/// literal newline in the logical line. Each logical line is tagged with
/// the physical line number it started on.
fn logical_lines(text: &str, handle_continuations: bool) -> Vec<(usize, String)> {
    let mut result = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        match pending.take() {
            Some((start, mut acc)) => {
                acc.push('\n');
                acc.push_str(raw);
                if handle_continuations && ends_in_continuation(&acc) {
                    acc.pop();
                    pending = Some((start, acc));
                } else {
                    result.push((start, acc));
                }
            }
            None => {
                if handle_continuations && ends_in_continuation(raw) {
                    let mut acc = raw.to_string();
                    acc.pop();
                    pending = Some((line_no, acc));
                } else {
                    result.push((line_no, raw.to_string()));
                }
            }
        }
    }

    // A trailing continuation at EOF has nothing to join with.
    if let Some(open) = pending {
        result.push(open);
    }
    result
}

fn ends_in_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    trailing % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_default(text: &str) -> Document {
        parse(text, &ParseOptions::default()).unwrap()
    }

    mod grouping_tests {
        use super::*;

        #[test]
        fn test_parse_empty() {
            assert!(parse_default("").is_empty());
        }

        #[test]
        fn test_parse_single_stanza() {
            let doc = parse_default("[monitor:///var/log]\nindex = os\nsourcetype = syslog\n");
            assert_eq!(doc.len(), 1);
            let stanza = doc.get(&StanzaKey::named("monitor:///var/log")).unwrap();
            assert_eq!(stanza.get("index"), Some("os"));
            assert_eq!(stanza.get("sourcetype"), Some("syslog"));
        }

        #[test]
        fn test_pre_header_lines_go_global() {
            let doc = parse_default("loglevel = WARN\n\n[tcpout]\ndefaultGroup = primary\n");
            assert_eq!(
                doc.get(&StanzaKey::Global).unwrap().get("loglevel"),
                Some("WARN")
            );
            assert!(doc.contains(&StanzaKey::named("tcpout")));
        }

        #[test]
        fn test_empty_global_dropped() {
            let doc = parse_default("\n\n[s]\nk = v\n");
            assert!(!doc.contains(&StanzaKey::Global));
            assert_eq!(doc.len(), 1);
        }

        #[test]
        fn test_blank_stanza_is_valid() {
            let doc = parse_default("[placeholder]\n");
            let stanza = doc.get(&StanzaKey::named("placeholder")).unwrap();
            assert!(stanza.is_empty());
        }

        #[test]
        fn test_stanza_name_whitespace_trimmed() {
            let doc = parse_default("[  spaced name  ]\nk = v\n");
            assert!(doc.contains(&StanzaKey::named("spaced name")));
        }

        #[test]
        fn test_stanza_name_inner_brackets() {
            // Name spans from the first to the last bracket on the line.
            let doc = parse_default("[source::udp:514 [weird]]\nk = v\n");
            assert!(doc.contains(&StanzaKey::named("source::udp:514 [weird]")));
        }

        #[test]
        fn test_bom_stripped() {
            let doc = parse_default("\u{feff}[s]\nk = v\n");
            assert!(doc.contains(&StanzaKey::named("s")));
        }
    }

    mod key_value_tests {
        use super::*;

        #[test]
        fn test_split_on_first_equals() {
            let doc = parse_default("[s]\nurl = scheme://host?a=1&b=2\n");
            assert_eq!(
                doc.get(&StanzaKey::named("s")).unwrap().get("url"),
                Some("scheme://host?a=1&b=2")
            );
        }

        #[test]
        fn test_empty_value() {
            let doc = parse_default("[s]\nblank =\n");
            assert_eq!(doc.get(&StanzaKey::named("s")).unwrap().get("blank"), Some(""));
        }

        #[test]
        fn test_value_trailing_whitespace_kept() {
            let doc = parse_default("[s]\nk =  padded  \n");
            assert_eq!(
                doc.get(&StanzaKey::named("s")).unwrap().get("k"),
                Some("padded  ")
            );
        }

        #[test]
        fn test_lowercase_keys_option() {
            let options = ParseOptions {
                lowercase_keys: true,
                ..ParseOptions::default()
            };
            let doc = parse("[s]\nTIMEOUT = 30\n", &options).unwrap();
            assert_eq!(doc.get(&StanzaKey::named("s")).unwrap().get("timeout"), Some("30"));
        }
    }

    mod continuation_tests {
        use super::*;

        #[test]
        fn test_continuation_joins_with_newline() {
            let doc = parse_default("[x]\nsearch = a \\\n| stats count\n");
            assert_eq!(
                doc.get(&StanzaKey::named("x")).unwrap().get("search"),
                Some("a \n| stats count")
            );
        }

        #[test]
        fn test_even_backslashes_are_literal() {
            let doc = parse_default("[x]\npath = C:\\\\\nnext = 1\n");
            let stanza = doc.get(&StanzaKey::named("x")).unwrap();
            assert_eq!(stanza.get("path"), Some("C:\\\\"));
            assert_eq!(stanza.get("next"), Some("1"));
        }

        #[test]
        fn test_three_backslashes_continue() {
            // Odd count: one backslash is the continuation marker, the
            // remaining pair stays literal.
            let doc = parse_default("[x]\nk = v\\\\\\\nrest\n");
            assert_eq!(
                doc.get(&StanzaKey::named("x")).unwrap().get("k"),
                Some("v\\\\\nrest")
            );
        }

        #[test]
        fn test_chained_continuations() {
            let doc = parse_default("[x]\nk = one \\\ntwo \\\nthree\n");
            assert_eq!(
                doc.get(&StanzaKey::named("x")).unwrap().get("k"),
                Some("one \ntwo \nthree")
            );
        }

        #[test]
        fn test_continuation_at_eof() {
            let doc = parse_default("[x]\nk = open \\");
            assert_eq!(doc.get(&StanzaKey::named("x")).unwrap().get("k"), Some("open "));
        }

        #[test]
        fn test_continuations_disabled() {
            let options = ParseOptions {
                handle_continuations: false,
                ..ParseOptions::default()
            };
            let doc = parse("[x]\nk = a \\\nm = 1\n", &options).unwrap();
            let stanza = doc.get(&StanzaKey::named("x")).unwrap();
            assert_eq!(stanza.get("k"), Some("a \\"));
            assert_eq!(stanza.get("m"), Some("1"));
        }

        #[test]
        fn test_continuation_runs_before_header_split() {
            // The continued line swallows what would otherwise look like a
            // stanza header.
            let doc = parse_default("[x]\nk = a \\\n[not-a-header]\n");
            assert_eq!(doc.len(), 1);
            assert_eq!(
                doc.get(&StanzaKey::named("x")).unwrap().get("k"),
                Some("a \n[not-a-header]")
            );
        }
    }

    mod junk_and_strict_tests {
        use super::*;

        #[test]
        fn test_junk_dropped_by_default() {
            let doc = parse_default("[s]\nvalid = 1\nnot a pair\n");
            assert_eq!(doc.get(&StanzaKey::named("s")).unwrap().key_count(), 1);
        }

        #[test]
        fn test_junk_rejected_in_strict() {
            let options = ParseOptions {
                strict: true,
                ..ParseOptions::default()
            };
            let err = parse("[s]\nnot a pair\n", &options).unwrap_err();
            assert!(matches!(err, Error::UnexpectedLine { line: 2, .. }));
        }

        #[test]
        fn test_dangling_open_bracket_always_fails() {
            let err = parse("[s]\n[unterminated\n", &ParseOptions::default()).unwrap_err();
            assert!(matches!(err, Error::DanglingStanzaHeader { line: 2, .. }));
        }

        #[test]
        fn test_dangling_close_bracket_always_fails() {
            let err = parse("[s]\nstray]\n", &ParseOptions::default()).unwrap_err();
            assert!(matches!(err, Error::DanglingStanzaHeader { .. }));
        }

        #[test]
        fn test_bracket_in_value_is_fine() {
            let doc = parse_default("[s]\nk = [0, 1]\n");
            assert_eq!(doc.get(&StanzaKey::named("s")).unwrap().get("k"), Some("[0, 1]"));
        }
    }

    mod duplicate_policy_tests {
        use super::*;

        const DUP_STANZA_INPUT: &str = "[s]\na = 1\nb = 2\n\n[s]\na = 9\nc = 3\n";

        #[test]
        fn test_dup_stanza_overwrite_replaces_all_keys() {
            let doc = parse_default(DUP_STANZA_INPUT);
            let stanza = doc.get(&StanzaKey::named("s")).unwrap();
            assert_eq!(stanza.get("a"), Some("9"));
            assert_eq!(stanza.get("b"), None);
            assert_eq!(stanza.get("c"), Some("3"));
        }

        #[test]
        fn test_dup_stanza_merge_unions_keys() {
            let options = ParseOptions {
                dup_stanza: DupPolicy::Merge,
                ..ParseOptions::default()
            };
            let doc = parse(DUP_STANZA_INPUT, &options).unwrap();
            let stanza = doc.get(&StanzaKey::named("s")).unwrap();
            assert_eq!(stanza.get("a"), Some("9"));
            assert_eq!(stanza.get("b"), Some("2"));
            assert_eq!(stanza.get("c"), Some("3"));
        }

        #[test]
        fn test_dup_stanza_exception() {
            let options = ParseOptions {
                dup_stanza: DupPolicy::Exception,
                ..ParseOptions::default()
            };
            let err = parse(DUP_STANZA_INPUT, &options).unwrap_err();
            assert!(matches!(err, Error::DuplicateStanza { line: 5, .. }));
        }

        #[test]
        fn test_dup_key_overwrite_last_wins() {
            let doc = parse_default("[s]\nk = old\nk = new\n");
            assert_eq!(doc.get(&StanzaKey::named("s")).unwrap().get("k"), Some("new"));
        }

        #[test]
        fn test_dup_key_exception() {
            let options = ParseOptions {
                dup_key: DupPolicy::Exception,
                ..ParseOptions::default()
            };
            let err = parse("[s]\nk = old\nk = new\n", &options).unwrap_err();
            match err {
                Error::DuplicateKey { stanza, key, line } => {
                    assert_eq!(stanza, "s");
                    assert_eq!(key, "k");
                    assert_eq!(line, 3);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_dup_key_exception_not_triggered_across_merged_occurrences() {
            let options = ParseOptions {
                dup_stanza: DupPolicy::Merge,
                dup_key: DupPolicy::Exception,
                ..ParseOptions::default()
            };
            let doc = parse("[s]\nk = 1\n\n[s]\nk = 2\n", &options).unwrap();
            assert_eq!(doc.get(&StanzaKey::named("s")).unwrap().get("k"), Some("2"));
        }
    }

    mod comment_tests {
        use super::*;

        #[test]
        fn test_comments_dropped_by_default() {
            let doc = parse_default("[s]\n# a note\nk = v\n");
            let stanza = doc.get(&StanzaKey::named("s")).unwrap();
            assert_eq!(stanza.entries().len(), 1);
        }

        #[test]
        fn test_comments_preserved_in_place() {
            let doc = parse(
                "[s]\n# first\nk = v\n; second\n",
                &ParseOptions::preserving_comments(),
            )
            .unwrap();
            let stanza = doc.get(&StanzaKey::named("s")).unwrap();
            let comments: Vec<_> = stanza.comments().collect();
            assert_eq!(comments, vec!["# first", "; second"]);
            assert_eq!(stanza.entries().len(), 3);
        }

        #[test]
        fn test_global_with_only_comments_survives_when_kept() {
            let doc = parse("# banner\n[s]\nk = v\n", &ParseOptions::preserving_comments()).unwrap();
            assert!(doc.contains(&StanzaKey::Global));
        }
    }

    mod parse_file_tests {
        use super::*;
        use std::path::PathBuf;

        #[test]
        fn test_missing_file_distinct() {
            let err =
                parse_file(&PathBuf::from("/no/such/file.conf"), &ParseOptions::default())
                    .unwrap_err();
            assert!(matches!(err, Error::MissingFile { .. }));
        }

        #[test]
        fn test_reads_from_disk() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("app.conf");
            std::fs::write(&path, "[install]\nstate = enabled\n").unwrap();
            let doc = parse_file(&path, &ParseOptions::default()).unwrap();
            assert_eq!(
                doc.get(&StanzaKey::named("install")).unwrap().get("state"),
                Some("enabled")
            );
        }

        #[test]
        fn test_non_utf8_is_unreadable() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("bin.conf");
            std::fs::write(&path, [0xFF, 0xFE, 0x00, 0x01]).unwrap();
            let err = parse_file(&path, &ParseOptions::default()).unwrap_err();
            assert!(matches!(err, Error::Unreadable { .. }));
        }
    }
}
