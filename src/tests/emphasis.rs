use pretty_assertions::assert_eq;

use super::*;
use crate::nodes::InlineValue;

fn emph_children(inline: &crate::nodes::Inline) -> &[crate::nodes::Inline] {
    match &inline.value {
        InlineValue::Emph(e) | InlineValue::Strong(e) => &e.children,
        other => panic!("expected emphasis, got {:?}", other),
    }
}

#[test]
fn simple_emphasis() {
    let doc = parse("*a*\n");
    let inlines = para(&doc, 0);
    match &inlines[0].value {
        InlineValue::Emph(e) => {
            assert_eq!(e.marker, b'*');
            assert_eq!(text(&e.children[0]), "a");
        }
        other => panic!("expected emph, got {:?}", other),
    }
    roundtrip("*a*\n");
}

#[test]
fn simple_strong() {
    let doc = parse("**b**\n");
    assert!(matches!(para(&doc, 0)[0].value, InlineValue::Strong(..)));
    roundtrip("**b**\n");
}

#[test]
fn underscore_marker_is_recorded() {
    let doc = parse("_a_ __b__\n");
    let inlines = para(&doc, 0);
    match &inlines[0].value {
        InlineValue::Emph(e) => assert_eq!(e.marker, b'_'),
        other => panic!("expected emph, got {:?}", other),
    }
    roundtrip("_a_ __b__\n");
}

#[test]
fn triple_markers_nest_strong_inside_emph() {
    let doc = parse("***c***\n");
    let outer = &para(&doc, 0)[0];
    assert!(matches!(outer.value, InlineValue::Emph(..)));
    assert!(matches!(
        emph_children(outer)[0].value,
        InlineValue::Strong(..)
    ));
    roundtrip("***c***\n");
}

#[test]
fn unmatched_markers_are_text() {
    let doc = parse("a *b\n");
    let inlines = para(&doc, 0);
    assert_eq!(inlines.len(), 1);
    assert_eq!(text(&inlines[0]), "a *b");
    roundtrip("a *b\n");
}

#[test]
fn space_blocked_run_cannot_open() {
    let doc = parse("a * b * c\n");
    assert_eq!(para(&doc, 0).len(), 1);
    roundtrip("a * b * c\n");
}

#[test]
fn intraword_underscore_is_text() {
    let doc = parse("a_b_c\n");
    let inlines = para(&doc, 0);
    assert_eq!(inlines.len(), 1);
    assert_eq!(text(&inlines[0]), "a_b_c");
    roundtrip("a_b_c\n");
}

#[test]
fn intraword_star_works() {
    let doc = parse("a*b*c\n");
    let inlines = para(&doc, 0);
    assert!(matches!(inlines[1].value, InlineValue::Emph(..)));
    roundtrip("a*b*c\n");
}

#[test]
fn nested_emphasis_across_markers() {
    let doc = parse("*a _b_ c*\n");
    let outer = &para(&doc, 0)[0];
    let children = emph_children(outer);
    assert!(matches!(children[1].value, InlineValue::Emph(..)));
    roundtrip("*a _b_ c*\n");
}

#[test]
fn emphasis_spans_are_exact() {
    let doc = parse("x *ab* y\n");
    let inlines = para(&doc, 0);
    let emph = &inlines[1];
    assert_eq!(emph.span.from, 2);
    assert_eq!(emph.span.to, 6);
    let inner = &emph_children(emph)[0];
    assert_eq!(inner.span.from, 3);
    assert_eq!(inner.span.to, 5);
}

// "*abc**def*" is where fast and strict modes part ways: the doubled run
// both opens and closes, and rule 9/10 forbids pairing it with either
// single run (1 + 2 is a multiple of 3).
#[test]
fn fast_mode_pairs_greedily() {
    let doc = parse("*abc**def*\n");
    let inlines = para(&doc, 0);
    assert_eq!(inlines.len(), 2);
    assert!(matches!(inlines[0].value, InlineValue::Emph(..)));
    assert!(matches!(inlines[1].value, InlineValue::Emph(..)));
    roundtrip("*abc**def*\n");
}

#[test]
fn strict_mode_applies_rule_nine() {
    let doc = parse_strict("*abc**def*\n");
    let inlines = para(&doc, 0);
    assert_eq!(inlines.len(), 1);
    let children = emph_children(&inlines[0]);
    assert_eq!(children.len(), 1);
    assert_eq!(text(&children[0]), "abc**def");

    let doc = parse_strict("*abc**def*\n");
    assert_eq!(
        serialize(&doc, &Options::default()),
        "*abc**def*\n",
        "strict mode is still lossless"
    );
}

#[test]
fn strict_mode_allows_divisible_pairs() {
    // both run lengths are themselves multiples of 3, so rule 9/10
    // permits the match
    let doc = parse_strict("***a***b***\n");
    let inlines = para(&doc, 0);
    assert!(matches!(
        inlines[0].value,
        InlineValue::Emph(..) | InlineValue::Strong(..)
    ));
}

#[test]
fn strict_and_fast_agree_on_simple_cases() {
    for source in ["*a*\n", "**b**\n", "***c***\n", "*a _b_ c*\n", "a*b*c\n"] {
        assert_eq!(
            parse(source).blocks,
            parse_strict(source).blocks,
            "modes disagree on {:?}",
            source
        );
    }
}

#[test]
fn mixed_markers_do_not_pair() {
    let doc = parse("*a_\n");
    assert_eq!(para(&doc, 0).len(), 1);
    roundtrip("*a_\n");
}

#[test]
fn emphasis_inside_link_text() {
    let doc = parse("[*a*](u)\n");
    match &para(&doc, 0)[0].value {
        InlineValue::Link(l) => {
            assert!(matches!(l.children[0].value, InlineValue::Emph(..)));
        }
        other => panic!("expected link, got {:?}", other),
    }
    roundtrip("[*a*](u)\n");
}

#[test]
fn delimiters_do_not_cross_link_boundaries() {
    let doc = parse("*a [b*](u)\n");
    let inlines = para(&doc, 0);
    // the star inside the link text cannot close the outer star
    assert!(inlines
        .iter()
        .all(|i| !matches!(i.value, InlineValue::Emph(..))));
    roundtrip("*a [b*](u)\n");
}
