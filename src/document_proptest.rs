//! Property-based tests for the document model and its text round trip.
//!
//! These tests use proptest to generate random documents and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::document::{Document, Stanza, StanzaKey};
    use crate::merge::merge;
    use crate::parser::{parse, ParseOptions};
    use crate::writer::{to_string, WriteOptions};
    use proptest::collection::{btree_map, vec};
    use proptest::prelude::*;

    /// Keys and stanza names drawn from the safe identifier space: no
    /// brackets, no '=', no leading '#' or ';', no whitespace at the edges.
    fn ident() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_.:/-]{0,15}"
    }

    /// Values may be empty, contain spaces, '=' signs, or embedded newlines
    /// (which the writer re-escapes as line continuations). Leading and
    /// trailing whitespace is stripped because parsed values never carry it.
    fn value() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "[a-zA-Z0-9 =_.,|*]{1,30}".prop_map(|s| s.trim().to_string()),
            ("[a-zA-Z0-9][a-zA-Z0-9 ]{0,11}", "[a-zA-Z0-9][a-zA-Z0-9 ]{0,11}")
                .prop_map(|(a, b)| format!("{} \n{}", a.trim_end(), b.trim_end())),
        ]
    }

    fn stanza() -> impl Strategy<Value = Stanza> {
        btree_map(ident(), value(), 1..6).prop_map(|pairs| {
            let mut stanza = Stanza::new();
            for (k, v) in pairs {
                stanza.set(k, v);
            }
            stanza
        })
    }

    fn document() -> impl Strategy<Value = Document> {
        vec((ident(), stanza()), 0..5).prop_map(|stanzas| {
            let mut doc = Document::new();
            for (name, stanza) in stanzas {
                doc.insert(StanzaKey::named(name), stanza);
            }
            doc
        })
    }

    proptest! {
        /// Property: write-then-parse reproduces the document's content
        #[test]
        fn round_trip_preserves_content(doc in document()) {
            let text = to_string(&doc, &WriteOptions::default());
            let reparsed = parse(&text, &ParseOptions::default()).unwrap();
            prop_assert!(
                reparsed.content_eq(&doc),
                "round trip lost content for:\n{}",
                text
            );
        }

        /// Property: sorted output is byte-idempotent
        #[test]
        fn sorted_output_is_idempotent(doc in document()) {
            let once = to_string(&doc, &WriteOptions::sorted());
            let reparsed = parse(&once, &ParseOptions::default()).unwrap();
            let twice = to_string(&reparsed, &WriteOptions::sorted());
            prop_assert_eq!(once, twice);
        }

        /// Property: merging a document onto itself changes nothing
        #[test]
        fn self_merge_is_identity(doc in document()) {
            let merged = merge(&[doc.clone(), doc.clone()]);
            prop_assert!(merged.content_eq(&doc));
        }

        /// Property: a later layer's value always wins the merge
        #[test]
        fn later_layer_wins(name in ident(), key in ident(), low in value(), high in value()) {
            let mut a = Document::new();
            a.entry(StanzaKey::named(&name)).set(key.clone(), low);
            let mut b = Document::new();
            b.entry(StanzaKey::named(&name)).set(key.clone(), high.clone());

            let merged = merge(&[a, b]);
            let stanza = merged.get(&StanzaKey::named(&name)).unwrap();
            prop_assert_eq!(stanza.get(&key), Some(high.as_str()));
        }

        /// Property: content equality ignores stanza declaration order
        #[test]
        fn content_eq_ignores_order(doc in document()) {
            let mut reversed = Document::new();
            let stanzas: Vec<_> = doc
                .iter()
                .map(|(k, s)| (k.clone(), s.clone()))
                .collect();
            for (key, stanza) in stanzas.into_iter().rev() {
                reversed.insert(key, stanza);
            }
            prop_assert!(doc.content_eq(&reversed));
        }
    }
}
