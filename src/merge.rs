//! Overlay merge of N documents into one
//!
//! Documents fold left to right: the first seeds the result by value, each
//! subsequent document overlays it. Conflicting values never fail; the
//! later (higher-ranked) document always wins. A stanza can be suppressed
//! wholesale by an overlay declaring the reserved control key with the drop
//! marker, so a higher layer can delete a lower layer's stanza without
//! re-declaring every key.
//!
//! The output never aliases any input: everything copied into the result is
//! an independent owned value.

use crate::document::{Document, Stanza, StanzaKey};

/// Reserved key carrying per-stanza control metadata. It never appears in
/// merged output.
pub const STANZA_CONTROL_KEY: &str = "_stanza";

/// When the control key's value contains this marker, the stanza is deleted
/// from the result and the overlay contributes nothing further for it.
pub const DROP_MARKER: &str = "<<DROP>>";

/// Fold an ordered sequence of documents into one.
///
/// Later documents take precedence. `merge(&[a, b, c])` equals
/// `merge(&[merge(&[a, b]), c])`.
pub fn merge(documents: &[Document]) -> Document {
    let mut result = Document::new();
    for doc in documents {
        overlay(&mut result, doc);
    }
    result
}

/// Overlay one document onto an accumulated base, in place.
fn overlay(base: &mut Document, overlay: &Document) {
    for (key, stanza) in overlay.iter() {
        if wants_drop(stanza) {
            base.remove(key);
            continue;
        }

        if base.contains(key) {
            overlay_stanza(base.entry(key.clone()), stanza);
        } else {
            base.insert(key.clone(), strip_control_key(stanza));
        }
    }
}

fn overlay_stanza(target: &mut Stanza, overlay: &Stanza) {
    // Overlay comments go ahead of the base's existing comments, each text
    // appearing only once.
    let fresh: Vec<String> = overlay
        .comments()
        .filter(|text| !target.has_comment(text))
        .map(str::to_string)
        .collect();
    for comment in fresh.into_iter().rev() {
        target.prepend_comment(comment);
    }

    for (key, value) in overlay.key_values() {
        if key == STANZA_CONTROL_KEY {
            continue;
        }
        target.set(key.to_string(), value.to_string());
    }
}

fn wants_drop(stanza: &Stanza) -> bool {
    stanza
        .get(STANZA_CONTROL_KEY)
        .is_some_and(|value| value.contains(DROP_MARKER))
}

fn strip_control_key(stanza: &Stanza) -> Stanza {
    let mut copy = stanza.clone();
    copy.remove(STANZA_CONTROL_KEY);
    copy
}

/// Reduce `target` to only the entries that differ from a merged baseline.
///
/// Keys whose values match the baseline are dropped; stanzas reduced to
/// nothing disappear entirely. Stanzas absent from the baseline are kept
/// whole. Used by the `minimize` command to shrink local files down to
/// their true overrides.
pub fn minimize(target: &Document, baseline: &Document) -> Document {
    let mut result = Document::new();
    for (key, stanza) in target.iter() {
        let Some(base) = baseline.get(key) else {
            result.insert(key.clone(), stanza.clone());
            continue;
        };

        let mut kept = Stanza::new();
        for comment in stanza.comments() {
            kept.push_comment(comment);
        }
        let mut key_count = 0;
        for (k, v) in stanza.key_values() {
            if base.get(k) != Some(v) {
                kept.set(k.to_string(), v.to_string());
                key_count += 1;
            }
        }
        if key_count > 0 {
            result.insert(key.clone(), kept);
        }
    }
    result
}
