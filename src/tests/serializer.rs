use pretty_assertions::assert_eq;

use super::*;
use crate::nodes::HardBreakStyle;
use crate::{FenceCharStyle, ListStyleType, TitleQuoteStyle};

fn serialize_with(source: &str, configure: impl FnOnce(&mut Options)) -> String {
    let doc = parse(source);
    let mut options = Options::default();
    configure(&mut options);
    serialize(&doc, &options)
}

#[test]
fn normalize_title_quotes() {
    assert_eq!(
        serialize_with("[x](u 'y')\n", |o| o.serialize.normalize = true),
        "[x](u \"y\")\n"
    );
    assert_eq!(
        serialize_with("[x](u (y))\n", |o| o.serialize.normalize = true),
        "[x](u \"y\")\n"
    );
}

#[test]
fn title_quote_override() {
    assert_eq!(
        serialize_with("[x](u \"y\")\n", |o| {
            o.serialize.title_quote = Some(TitleQuoteStyle::Single)
        }),
        "[x](u 'y')\n"
    );
    assert_eq!(
        serialize_with("[x](u \"y\")\n", |o| {
            o.serialize.title_quote = Some(TitleQuoteStyle::Paren)
        }),
        "[x](u (y))\n"
    );
}

#[test]
fn normalize_fence_char() {
    assert_eq!(
        serialize_with("~~~\ncode\n~~~\n", |o| o.serialize.normalize = true),
        "```\ncode\n```\n"
    );
}

#[test]
fn fence_override_grows_past_body_runs() {
    assert_eq!(
        serialize_with("~~~\na ``` b\n~~~\n", |o| {
            o.serialize.fence_char = Some(FenceCharStyle::Backtick)
        }),
        "````\na ``` b\n````\n"
    );
}

#[test]
fn normalize_bullet_marker() {
    assert_eq!(
        serialize_with("* a\n* b\n", |o| o.serialize.normalize = true),
        "- a\n- b\n"
    );
    assert_eq!(
        serialize_with("- a\n", |o| {
            o.serialize.list_style = Some(ListStyleType::Plus)
        }),
        "+ a\n"
    );
}

#[test]
fn normalize_hard_breaks() {
    assert_eq!(
        serialize_with("a  \nb\n", |o| o.serialize.normalize = true),
        "a\\\nb\n"
    );
    assert_eq!(
        serialize_with("a\\\nb\n", |o| {
            o.serialize.hardbreak = Some(HardBreakStyle::TwoSpace)
        }),
        "a  \nb\n"
    );
}

#[test]
fn normalize_does_not_touch_other_styles() {
    // emphasis markers and heading forms are not on the normalize list
    assert_eq!(
        serialize_with("_a_ and **b**\n", |o| o.serialize.normalize = true),
        "_a_ and **b**\n"
    );
}

#[test]
fn serialize_is_idempotent() {
    let sources = [
        "# h\n\npara *em* `code`\n",
        "- a\n\n  b\n- c\n",
        "> quote\n> more\n",
        "| a | b |\n| --- | --- |\n| c | d |\n",
        "[x](u 'y') and [r]\n\n[r]: /u \"t\"\n",
    ];
    let options = Options::default();
    for source in sources {
        let once = serialize(&parse(source), &options);
        let twice = serialize(&parse(&once), &options);
        assert_eq!(once, twice, "not idempotent for {:?}", source);
    }
}

#[test]
fn format_document_writes_to_any_writer() {
    let doc = parse("# h\n");
    let mut out = Vec::new();
    crate::format_document(&doc, &Options::default(), &mut out).unwrap();
    assert_eq!(out, b"# h\n");
}

#[test]
fn verbatim_blocks_survive_normalize() {
    // raw-line blocks (tables, html, breaks) are emitted from their
    // recorded text even under normalization
    let source = "<div>\nx\n</div>\n\n- - -\n";
    assert_eq!(
        serialize_with(source, |o| o.serialize.normalize = true),
        source
    );
}
