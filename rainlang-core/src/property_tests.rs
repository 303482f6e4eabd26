//! Property-based tests for the Rainlang front end.
//!
//! Uses proptest to check parser, namespace and source-map invariants
//! across generated inputs.

use std::sync::Arc;

use proptest::prelude::*;

use crate::binding::Binding;
use crate::compiler::compose;
use crate::dependency::Resolver;
use crate::diagnostic::ErrorCode;
use crate::document::RainDocument;
use crate::meta::AuthoringWord;
use crate::namespace::{Element, Namespace, NamespaceNode, ResolveError};
use crate::parser::{ParseContext, parse};
use crate::rewrite::{backmap, flatten};
use crate::span::{Span, utf16_len};
use crate::store::MetaStore;

fn words() -> Vec<AuthoringWord> {
    vec![
        AuthoringWord::new("add", ""),
        AuthoringWord::new("call", "").with_operand_args(&["source"]),
    ]
}

/// Rainlang-ish text built from a small token alphabet, so generated
/// inputs reach deep into the parser instead of stopping at the first
/// illegal character.
fn rain_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            "_", "a", "b", ":", ",", ";", " ", "\n", "(", ")", "<", ">", "add", "call", "foo", "1",
            "0x1f", "1e3", "max-uint256", "'a", ".x", "ns.add", "Bad",
        ]),
        0..40,
    )
    .prop_map(|tokens| tokens.concat())
}

fn comment_body() -> impl Strategy<Value = String> {
    "[a-z0-9 ]{0,12}"
}

/// One clean line of an expression binding: `_: add(n m)`.
fn clean_line() -> impl Strategy<Value = String> {
    (0u32..10_000, 0u32..10_000, " {0,2}", any::<bool>()).prop_map(|(a, b, pad, newline)| {
        let lead = if newline { "\n" } else { "" };
        format!("{lead}{pad}_: add({a} {b})")
    })
}

fn clean_binding() -> impl Strategy<Value = String> {
    prop::collection::vec(clean_line(), 1..4).prop_map(|lines| format!("{};", lines.join(",")))
}

// ========================================================================
// Parser Property Tests
// ========================================================================

proptest! {
    /// Parsing the same text twice gives identical results.
    #[test]
    fn prop_parse_is_deterministic(text in rain_text()) {
        let words = words();
        let ns = Namespace::new();
        let cx = ParseContext::new(&words, &ns);
        prop_assert_eq!(parse(&text, &cx), parse(&text, &cx));
    }

    /// Every problem lies inside the text it was reported on.
    #[test]
    fn prop_problem_spans_in_bounds(text in prop_oneof![rain_text(), "\\PC{1,60}"]) {
        let words = words();
        let ns = Namespace::new();
        let result = parse(&text, &ParseContext::new(&words, &ns));
        let len = utf16_len(&text);
        for problem in &result.problems {
            prop_assert!(problem.position.start <= problem.position.end, "{:?}", problem);
            prop_assert!(problem.position.end < len, "{:?} in {:?}", problem, text);
        }
    }

    /// A comment and the blanks it is replaced by lead to the same problems.
    #[test]
    fn prop_comment_blanking_keeps_offsets(
        before in rain_text(),
        body in comment_body(),
        after in rain_text(),
    ) {
        let words = words();
        let ns = Namespace::new();
        let cx = ParseContext::new(&words, &ns);
        let commented = format!("{before}/*{body}*/{after}");
        let blanked = format!("{before}{}{after}", " ".repeat(body.len() + 4));
        prop_assert_eq!(parse(&commented, &cx).problems, parse(&blanked, &cx).problems);
    }

    /// Illegal characters only add their own problem; everything else
    /// stays where it was.
    #[test]
    fn prop_illegal_blanking_keeps_offsets(
        before in rain_text(),
        illegal in "[\u{e9}\u{3bb}\u{2603}]{1,4}",
        after in rain_text(),
    ) {
        let words = words();
        let ns = Namespace::new();
        let cx = ParseContext::new(&words, &ns);
        let dirty = format!("{before}{illegal}{after}");
        let clean = format!("{before}{}{after}", " ".repeat(utf16_len(&illegal)));
        let kept: Vec<_> = parse(&dirty, &cx)
            .problems
            .into_iter()
            .filter(|problem| problem.code != ErrorCode::IllegalChar)
            .collect();
        prop_assert_eq!(kept, parse(&clean, &cx).problems);
    }
}

// ========================================================================
// Namespace Property Tests
// ========================================================================

proptest! {
    /// Paths deeper than the namespace limit fail the same way whether
    /// or not their segments exist.
    #[test]
    fn prop_deep_paths_are_rejected(segments in prop::collection::vec("[a-z]{1,5}", 33..48)) {
        let path = segments.join(".");
        let root = Namespace::new();
        prop_assert_eq!(root.resolve(&path).unwrap_err(), ResolveError::TooDeep);
    }

    #[test]
    fn prop_shallow_paths_are_not_too_deep(segments in prop::collection::vec("[a-z]{1,5}", 1..33)) {
        let path = segments.join(".");
        let root = Namespace::new();
        prop_assert_ne!(root.resolve(&path).unwrap_err(), ResolveError::TooDeep);
    }

    /// A binding reading itself never composes.
    #[test]
    fn prop_self_reference_is_rejected(name in "x-[a-z0-9]{1,6}", dotted in any::<bool>()) {
        let reference = if dotted { format!(".{name}") } else { name.clone() };
        let text = format!("#{name} _: {reference};");
        let doc = RainDocument::create(&text, &MetaStore::new());
        prop_assert!(doc
            .all_problems()
            .iter()
            .any(|problem| problem.code == ErrorCode::InvalidSelfReference));
        prop_assert!(compose(&doc, &[name.as_str()]).is_err());
    }

    /// An LHS alias read on its own line is a self reference too.
    #[test]
    fn prop_alias_self_reference_is_rejected(name in "x-[a-z0-9]{1,6}") {
        let text = format!("#main {name}: {name};");
        let doc = RainDocument::create(&text, &MetaStore::new());
        prop_assert!(doc
            .all_problems()
            .iter()
            .any(|problem| problem.code == ErrorCode::InvalidSelfReference));
        prop_assert!(compose(&doc, &["main"]).is_err());
    }
}

// ========================================================================
// Source Map Property Tests
// ========================================================================

proptest! {
    /// Problems induced in a quote-free composite map back to exactly the
    /// positions a direct parse of each binding reports.
    #[test]
    fn prop_backmap_round_trip(contents in prop::collection::vec(clean_binding(), 1..4)) {
        let mut ns = Namespace::new();
        let mut names = Vec::new();
        let mut at = 0;
        for (index, content) in contents.iter().enumerate() {
            let name = format!("b{index}");
            let name_position = Span::new(at + 1, at + name.len());
            let start = at + name.len() + 2;
            let content_position = Span::new(start, start + utf16_len(content) - 1);
            let binding = Binding::new_expression(&name, name_position, content, content_position);
            ns.insert_node(&name, NamespaceNode::local(Element::Binding(Arc::new(binding))))
                .map_err(|err| TestCaseError::fail(err.to_string()))?;
            at = content_position.end + 2;
            names.push(name);
        }

        let words = words();
        let resolution = Resolver::new(&ns, &words)
            .resolve(names.as_slice())
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let flattened = flatten(&resolution).map_err(|err| TestCaseError::fail(err.to_string()))?;

        let empty = Namespace::new();
        let bare = ParseContext::new(&[], &empty);
        let mapped: Vec<Span> = parse(&flattened.text, &bare)
            .problems
            .iter()
            .map(|problem| backmap(problem, &flattened.fragments, &[]).position)
            .collect();

        let mut direct = Vec::new();
        for fragment in &flattened.fragments {
            let base = fragment.binding.content_position.start;
            direct.extend(
                parse(&fragment.original, &bare)
                    .problems
                    .iter()
                    .map(|problem| problem.position.shift(base)),
            );
        }
        prop_assert!(!mapped.is_empty());
        prop_assert_eq!(mapped, direct);
    }
}
