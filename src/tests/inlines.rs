use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;
use crate::nodes::{HardBreakStyle, InlineValue};

#[test]
fn text_is_coalesced() {
    let doc = parse("a ! b ] c\n");
    let inlines = para(&doc, 0);
    assert_eq!(inlines.len(), 1);
    assert_eq!(text(&inlines[0]), "a ! b ] c");
}

#[test]
fn backslash_escapes_stay_verbatim() {
    let source = "a \\* not emphasis \\*\n";
    let doc = parse(source);
    let inlines = para(&doc, 0);
    assert_eq!(inlines.len(), 1);
    assert_eq!(text(&inlines[0]), "a \\* not emphasis \\*");
    roundtrip(source);
}

#[test]
fn backslash_before_non_punctuation_is_literal() {
    roundtrip("a \\b c\n");
}

#[test]
fn code_span_basic() {
    let doc = parse("`code`\n");
    match &para(&doc, 0)[0].value {
        InlineValue::Code(c) => {
            assert_eq!(c.literal, "code");
            assert_eq!(c.num_ticks, 1);
            assert!(!c.padded);
        }
        other => panic!("expected code, got {:?}", other),
    }
    roundtrip("`code`\n");
}

#[test]
fn code_span_padding_is_recorded() {
    let doc = parse("`` a`b ``\n");
    match &para(&doc, 0)[0].value {
        InlineValue::Code(c) => {
            assert_eq!(c.literal, "a`b");
            assert_eq!(c.num_ticks, 2);
            assert!(c.padded);
        }
        other => panic!("expected code, got {:?}", other),
    }
    roundtrip("`` a`b ``\n");
}

#[test]
fn all_space_code_span_is_not_trimmed() {
    roundtrip("`  `\n");
}

#[test]
fn unmatched_backticks_are_text() {
    let doc = parse("a `` b\n");
    assert_eq!(text(&para(&doc, 0)[0]), "a `` b");
    roundtrip("a `` b\n");
}

#[test]
fn code_span_does_not_cross_lines() {
    let doc = parse("a `x\ny` b\n");
    assert!(para(&doc, 0)
        .iter()
        .all(|i| !matches!(i.value, InlineValue::Code(..))));
    roundtrip("a `x\ny` b\n");
}

#[rstest]
#[case("<https://example.com/x>", false)]
#[case("<mailto:a@b.c>", false)]
#[case("<ftp://files.example.com>", false)]
fn uri_autolinks(#[case] inner: &str, #[case] email: bool) {
    let source = format!("{}\n", inner);
    let doc = parse(&source);
    match &para(&doc, 0)[0].value {
        InlineValue::Autolink(a) => {
            assert_eq!(format!("<{}>", a.url), inner);
            assert_eq!(a.email, email);
        }
        other => panic!("expected autolink, got {:?}", other),
    }
    roundtrip(&source);
}

#[test]
fn email_autolink() {
    let doc = parse("<user@example.com>\n");
    match &para(&doc, 0)[0].value {
        InlineValue::Autolink(a) => {
            assert_eq!(a.url, "user@example.com");
            assert!(a.email);
        }
        other => panic!("expected autolink, got {:?}", other),
    }
    roundtrip("<user@example.com>\n");
}

#[test]
fn unknown_scheme_is_not_an_autolink() {
    let doc = parse("<foo://x>\n");
    assert!(matches!(para(&doc, 0)[0].value, InlineValue::Text(..)));
    roundtrip("<foo://x>\n");
}

#[test]
fn inline_html_tag() {
    let doc = parse("a <b class=\"x\">c</b>\n");
    let inlines = para(&doc, 0);
    assert!(matches!(&inlines[1].value, InlineValue::HtmlInline(t) if t == "<b class=\"x\">"));
    roundtrip("a <b class=\"x\">c</b>\n");
}

#[test]
fn inline_html_comment() {
    roundtrip("a <!-- note --> b\n");
}

#[test]
fn bare_angle_bracket_is_text() {
    roundtrip("a < b\n");
}

#[test]
fn soft_break() {
    let doc = parse("a\nb\n");
    let inlines = para(&doc, 0);
    assert!(matches!(inlines[1].value, InlineValue::SoftBreak));
    roundtrip("a\nb\n");
}

#[test]
fn hard_break_two_spaces() {
    let source = "a  \nb\n";
    let doc = parse(source);
    let inlines = para(&doc, 0);
    assert_eq!(text(&inlines[0]), "a");
    assert!(matches!(
        inlines[1].value,
        InlineValue::HardBreak(HardBreakStyle::TwoSpace)
    ));
    roundtrip(source);
}

#[test]
fn hard_break_backslash() {
    let source = "a\\\nb\n";
    let doc = parse(source);
    assert!(matches!(
        para(&doc, 0)[1].value,
        InlineValue::HardBreak(HardBreakStyle::Backslash)
    ));
    roundtrip(source);
}

#[test]
fn three_trailing_spaces_roundtrip() {
    // the break consumes exactly two spaces; the third stays in the text
    roundtrip("a   \nb\n");
}

#[test]
fn single_trailing_space_is_a_soft_break() {
    let doc = parse("a \nb\n");
    assert!(matches!(para(&doc, 0)[1].value, InlineValue::SoftBreak));
    roundtrip("a \nb\n");
}

#[test]
fn strikethrough() {
    let doc = parse("a ~~gone~~ b\n");
    let inlines = para(&doc, 0);
    match &inlines[1].value {
        InlineValue::Strikethrough(children) => assert_eq!(text(&children[0]), "gone"),
        other => panic!("expected strikethrough, got {:?}", other),
    }
    roundtrip("a ~~gone~~ b\n");
}

#[test]
fn single_and_triple_tildes_are_text() {
    roundtrip("a ~x~ b\n");
    roundtrip("a ~~~x~~~ b\n");
}

#[test]
fn strikethrough_off_without_gfm() {
    let mut options = Options::default();
    options.parse.gfm = false;
    let doc = parse_document("~~x~~\n", &options);
    assert!(matches!(para(&doc, 0)[0].value, InlineValue::Text(..)));
}

#[test]
fn footnote_reference_inline() {
    let doc = parse("see[^note] here\n");
    let inlines = para(&doc, 0);
    assert!(matches!(&inlines[1].value, InlineValue::FootnoteReference(l) if l == "note"));
    roundtrip("see[^note] here\n");
}

#[test]
fn non_bmp_text_roundtrips() {
    roundtrip("# \u{1f980} crab\n");
    roundtrip("[x](\u{1f980}.example)\n");
}
