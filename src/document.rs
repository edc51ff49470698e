//! Core data model for stanza/key=value configuration documents
//!
//! A [`Document`] is a collection of [`Stanza`]s addressed by [`StanzaKey`].
//! Key/value pairs that appear before any `[stanza]` header live in the
//! distinguished global stanza (`StanzaKey::Global`). Within a stanza,
//! entries are an ordered sequence of key/value pairs and preserved comment
//! lines; insertion order carries no merge/diff semantics but is kept for
//! serialization stability.
//!
//! Documents are plain owned values. Merging always produces a new
//! `Document`, so there is no aliasing between inputs and outputs.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Identifies one stanza within a document.
///
/// `Global` sorts before every named stanza; names sort lexically and are
/// case-sensitive.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StanzaKey {
    /// The implicit section for key/value pairs preceding any `[name]` header.
    Global,
    /// A named `[stanza]` section.
    Named(String),
}

impl StanzaKey {
    /// Build a key from a parsed header name.
    pub fn named(name: impl Into<String>) -> Self {
        StanzaKey::Named(name.into())
    }

    /// The stanza name, or `None` for the global stanza.
    pub fn name(&self) -> Option<&str> {
        match self {
            StanzaKey::Global => None,
            StanzaKey::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for StanzaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StanzaKey::Global => write!(f, "(global)"),
            StanzaKey::Named(name) => write!(f, "{}", name),
        }
    }
}

/// One line of stanza content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    /// A `key = value` setting.
    KeyValue { key: String, value: String },
    /// A preserved comment line, stored raw (including its `#`/`;` prefix).
    Comment(String),
}

/// A named section of key/value settings.
///
/// Comments are carried in place but are invisible to merge and diff logic,
/// which operate on the key/value view only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stanza {
    entries: Vec<Entry>,
}

impl Stanza {
    /// Create an empty stanza.
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Look up the value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find_map(|entry| match entry {
            Entry::KeyValue { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Set `key` to `value`, replacing an existing entry in place or
    /// appending a new one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        for entry in &mut self.entries {
            if let Entry::KeyValue { key: k, value: v } = entry {
                if *k == key {
                    *v = value;
                    return;
                }
            }
        }
        self.entries.push(Entry::KeyValue { key, value });
    }

    /// Remove `key`, returning its value if present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(
            |entry| matches!(entry, Entry::KeyValue { key: k, .. } if k == key),
        )?;
        match self.entries.remove(pos) {
            Entry::KeyValue { value, .. } => Some(value),
            Entry::Comment(_) => None,
        }
    }

    /// Append a raw comment line.
    pub fn push_comment(&mut self, text: impl Into<String>) {
        self.entries.push(Entry::Comment(text.into()));
    }

    /// Insert a raw comment line at the front of the stanza.
    pub fn prepend_comment(&mut self, text: impl Into<String>) {
        self.entries.insert(0, Entry::Comment(text.into()));
    }

    /// Whether a comment with exactly this text is already present.
    pub fn has_comment(&self, text: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| matches!(entry, Entry::Comment(t) if t == text))
    }

    /// Iterate over the key/value pairs, skipping comments.
    pub fn key_values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::KeyValue { key, value } => Some((key.as_str(), value.as_str())),
            Entry::Comment(_) => None,
        })
    }

    /// Iterate over the comment lines, skipping key/value pairs.
    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Comment(text) => Some(text.as_str()),
            Entry::KeyValue { .. } => None,
        })
    }

    /// Number of key/value pairs (comments excluded).
    pub fn key_count(&self) -> usize {
        self.key_values().count()
    }

    /// Whether the stanza has no entries at all, comments included.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The key/value view as an ordered map, used for content comparison.
    pub fn kv_map(&self) -> BTreeMap<&str, &str> {
        self.key_values().collect()
    }

    /// Structural equality of the key/value view, ignoring comments and
    /// entry order.
    pub fn content_eq(&self, other: &Stanza) -> bool {
        self.kv_map() == other.kv_map()
    }
}

impl FromIterator<(String, String)> for Stanza {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut stanza = Stanza::new();
        for (key, value) in iter {
            stanza.set(key, value);
        }
        stanza
    }
}

/// A parsed configuration document.
///
/// Holds at most one stanza per key; collisions are resolved during parsing
/// per the duplicate policy, never left ambiguous here. Stanza insertion
/// order is preserved for serialization stability.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    stanzas: Vec<(StanzaKey, Stanza)>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stanza.
    pub fn get(&self, key: &StanzaKey) -> Option<&Stanza> {
        self.stanzas
            .iter()
            .find_map(|(k, s)| if k == key { Some(s) } else { None })
    }

    /// Look up a stanza mutably.
    pub fn get_mut(&mut self, key: &StanzaKey) -> Option<&mut Stanza> {
        self.stanzas
            .iter_mut()
            .find_map(|(k, s)| if k == key { Some(s) } else { None })
    }

    /// Find the stanza for `key`, creating an empty one at the end if it
    /// does not exist yet.
    pub fn entry(&mut self, key: StanzaKey) -> &mut Stanza {
        let pos = match self.stanzas.iter().position(|(k, _)| *k == key) {
            Some(pos) => pos,
            None => {
                self.stanzas.push((key, Stanza::new()));
                self.stanzas.len() - 1
            }
        };
        &mut self.stanzas[pos].1
    }

    /// Insert a stanza, replacing an existing one in place.
    pub fn insert(&mut self, key: StanzaKey, stanza: Stanza) {
        if let Some(pos) = self.stanzas.iter().position(|(k, _)| *k == key) {
            self.stanzas[pos].1 = stanza;
        } else {
            self.stanzas.push((key, stanza));
        }
    }

    /// Remove a stanza, returning it if present.
    pub fn remove(&mut self, key: &StanzaKey) -> Option<Stanza> {
        let pos = self.stanzas.iter().position(|(k, _)| k == key)?;
        Some(self.stanzas.remove(pos).1)
    }

    /// Whether a stanza with this key exists.
    pub fn contains(&self, key: &StanzaKey) -> bool {
        self.stanzas.iter().any(|(k, _)| k == key)
    }

    /// Iterate over stanzas in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&StanzaKey, &Stanza)> {
        self.stanzas.iter().map(|(k, s)| (k, s))
    }

    /// All stanza keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &StanzaKey> {
        self.stanzas.iter().map(|(k, _)| k)
    }

    /// Number of stanzas.
    pub fn len(&self) -> usize {
        self.stanzas.len()
    }

    /// Whether the document has no stanzas.
    pub fn is_empty(&self) -> bool {
        self.stanzas.is_empty()
    }

    /// Structural equality of the key/value view across all stanzas,
    /// ignoring comments and ordering.
    pub fn content_eq(&self, other: &Document) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|(key, stanza)| {
            other
                .get(key)
                .is_some_and(|theirs| stanza.content_eq(theirs))
        })
    }
}

impl FromIterator<(StanzaKey, Stanza)> for Document {
    fn from_iter<I: IntoIterator<Item = (StanzaKey, Stanza)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (key, stanza) in iter {
            doc.insert(key, stanza);
        }
        doc
    }
}
