use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;
use crate::nodes::BlockValue;

#[test]
fn atx_heading_levels() {
    let doc = parse("# h1\n### h3\n###### h6\n");
    let levels: Vec<u32> = doc
        .blocks
        .iter()
        .map(|b| match &b.value {
            BlockValue::Heading(h) => h.level,
            other => panic!("expected heading, got {:?}", other),
        })
        .collect();
    assert_eq!(levels, vec![1, 3, 6]);
    roundtrip("# h1\n### h3\n###### h6\n");
}

#[test]
fn seven_hashes_is_a_paragraph() {
    let doc = parse("####### nope\n");
    assert!(matches!(doc.blocks[0].value, BlockValue::Paragraph(..)));
}

#[test]
fn heading_keeps_trailing_hashes_and_spacing() {
    // closing sequences are content in this dialect
    roundtrip("# h #\n");
    roundtrip("##  two spaces\n");
}

#[test]
fn empty_heading() {
    let doc = parse("##\n");
    match &doc.blocks[0].value {
        BlockValue::Heading(h) => {
            assert_eq!(h.level, 2);
            assert!(h.children.is_empty());
        }
        other => panic!("expected heading, got {:?}", other),
    }
    roundtrip("##\n");
}

#[test]
fn fenced_code_roundtrip() {
    let source = "```js\nconst x = 1;\n```\n";
    let doc = parse(source);
    match &doc.blocks[0].value {
        BlockValue::CodeBlock(cb) => {
            assert!(cb.fenced);
            assert_eq!(cb.fence_char, b'`');
            assert_eq!(cb.fence_length, 3);
            assert_eq!(cb.info, "js");
            assert_eq!(cb.language(), Some("js"));
            assert_eq!(cb.literal, "const x = 1;\n");
            assert_eq!(cb.close_fence_length, Some(3));
        }
        other => panic!("expected code block, got {:?}", other),
    }
    roundtrip(source);
}

#[rstest]
#[case("~~~~\ncode\n~~~~\n")]
#[case("`````\n``` not a close\n`````\n")]
#[case("``` rust extra info\nfn main() {}\n```\n")]
#[case("```\n\nblank inside\n\n```\n")]
fn fence_variants(#[case] source: &str) {
    roundtrip(source);
}

#[test]
fn unclosed_fence_runs_to_eof() {
    let source = "```\ncode\n";
    let doc = parse(source);
    match &doc.blocks[0].value {
        BlockValue::CodeBlock(cb) => {
            assert_eq!(cb.close_fence_length, None);
            assert_eq!(cb.literal, "code\n");
        }
        other => panic!("expected code block, got {:?}", other),
    }
    roundtrip(source);
}

#[test]
fn longer_close_fence_is_preserved() {
    roundtrip("```\nx\n`````\n");
}

#[test]
fn indented_code() {
    let source = "    a\n\n    b\n";
    let doc = parse(source);
    match &doc.blocks[0].value {
        BlockValue::CodeBlock(cb) => {
            assert!(!cb.fenced);
            assert_eq!(cb.literal, "a\n\nb\n");
        }
        other => panic!("expected code block, got {:?}", other),
    }
    roundtrip(source);
}

#[test]
fn indented_code_does_not_interrupt_paragraph() {
    let doc = parse("para\n    still para\n");
    assert_eq!(doc.blocks.len(), 1);
    roundtrip("para\n    still para\n");
}

#[rstest]
#[case("---\n", b'-')]
#[case("***\n", b'*')]
#[case("___\n", b'_')]
#[case("- - -\n", b'-')]
fn thematic_breaks(#[case] source: &str, #[case] marker: u8) {
    let doc = parse(source);
    match &doc.blocks[0].value {
        BlockValue::ThematicBreak(tb) => assert_eq!(tb.marker, marker),
        other => panic!("expected thematic break, got {:?}", other),
    }
    roundtrip(source);
}

#[test]
fn thematic_break_wins_over_list() {
    // `- - -` could be a bullet item; the break wins
    let doc = parse("- - -\n");
    assert!(matches!(doc.blocks[0].value, BlockValue::ThematicBreak(..)));
}

#[test]
fn dashes_after_paragraph_are_a_break_not_setext() {
    let doc = parse("para\n---\n");
    assert!(matches!(doc.blocks[0].value, BlockValue::Paragraph(..)));
    assert!(matches!(doc.blocks[1].value, BlockValue::ThematicBreak(..)));
    roundtrip("para\n---\n");
}

#[test]
fn blockquote_basic() {
    let source = "> a\n> b\n";
    let doc = parse(source);
    match &doc.blocks[0].value {
        BlockValue::BlockQuote(q) => {
            assert_eq!(q.children.len(), 1);
            assert!(matches!(q.children[0].value, BlockValue::Paragraph(..)));
        }
        other => panic!("expected blockquote, got {:?}", other),
    }
    roundtrip(source);
}

#[test]
fn blockquote_with_interior_blank() {
    roundtrip("> a\n>\n> b\n");
}

#[test]
fn blockquote_closes_at_blank() {
    let doc = parse("> a\n\nb\n");
    assert!(matches!(doc.blocks[0].value, BlockValue::BlockQuote(..)));
    assert!(matches!(doc.blocks[2].value, BlockValue::Paragraph(..)));
    roundtrip("> a\n\nb\n");
}

#[test]
fn lazy_continuation_joins_quote_paragraph() {
    let doc = parse("> a\nb\n");
    match &doc.blocks[0].value {
        BlockValue::BlockQuote(q) => assert_eq!(q.children.len(), 1),
        other => panic!("expected blockquote, got {:?}", other),
    }
    // lazy lines re-acquire the prefix on output
    assert_eq!(serialize(&doc, &Options::default()), "> a\n> b\n");
}

#[test]
fn nested_blockquotes() {
    roundtrip("> a\n> > b\n");
}

#[test]
fn heading_inside_quote() {
    roundtrip("> # h\n> text\n");
}

#[test]
fn html_block_type_6() {
    let source = "<div>\ntext\n</div>\n";
    let doc = parse(source);
    match &doc.blocks[0].value {
        BlockValue::HtmlBlock(hb) => {
            assert_eq!(hb.block_type, 6);
            assert_eq!(hb.literal, source);
        }
        other => panic!("expected html block, got {:?}", other),
    }
    roundtrip(source);
}

#[test]
fn html_block_ends_at_blank() {
    let doc = parse("<div>\n\npara\n");
    assert!(matches!(doc.blocks[0].value, BlockValue::HtmlBlock(..)));
    assert!(matches!(doc.blocks[2].value, BlockValue::Paragraph(..)));
    roundtrip("<div>\n\npara\n");
}

#[test]
fn html_comment_block_end_condition() {
    let source = "<!-- note\nstill comment -->\npara\n";
    let doc = parse(source);
    match &doc.blocks[0].value {
        BlockValue::HtmlBlock(hb) => {
            assert_eq!(hb.block_type, 2);
            assert_eq!(hb.literal, "<!-- note\nstill comment -->\n");
        }
        other => panic!("expected html block, got {:?}", other),
    }
    roundtrip(source);
}

#[test]
fn script_block_swallows_blank_lines() {
    let source = "<script>\n\nvar x;\n</script>\n";
    let doc = parse(source);
    assert_eq!(doc.blocks.len(), 1);
    roundtrip(source);
}

#[test]
fn link_reference_definition_block() {
    let source = "[a][ref]\n\n[ref]: /u \"t\"\n";
    let doc = parse(source);
    match &doc.blocks[2].value {
        BlockValue::LinkRefDef(def) => {
            assert_eq!(def.label, "ref");
            assert_eq!(def.dest, "/u");
            assert_eq!(def.title.as_deref(), Some("t"));
            assert_eq!(def.title_quote, Some(b'"'));
        }
        other => panic!("expected refdef, got {:?}", other),
    }
    let resolved = doc.refmap.lookup("ref").unwrap();
    assert_eq!(resolved.url, "/u");
    assert_eq!(resolved.title, "t");
    roundtrip(source);
}

#[test]
fn refdef_first_definition_wins() {
    let doc = parse("[r]: /one\n\n[r]: /two\n");
    assert_eq!(doc.refmap.lookup("r").unwrap().url, "/one");
    roundtrip("[r]: /one\n\n[r]: /two\n");
}

#[test]
fn refdef_labels_are_case_folded() {
    let doc = parse("[x][LABEL]\n\n[label]: /u\n");
    assert!(doc.refmap.lookup("label").is_some());
    let inlines = para(&doc, 0);
    assert!(matches!(inlines[0].value, crate::nodes::InlineValue::RefLink(..)));
}

#[test]
fn refdef_cannot_interrupt_paragraph() {
    let doc = parse("para\n[r]: /u\n");
    assert_eq!(doc.blocks.len(), 1);
    assert!(doc.refmap.lookup("r").is_none());
    roundtrip("para\n[r]: /u\n");
}

#[test]
fn leading_refdefs_split_off_paragraph() {
    let doc = parse("[r]: /u\nafter\n");
    assert!(matches!(doc.blocks[0].value, BlockValue::LinkRefDef(..)));
    assert!(matches!(doc.blocks[1].value, BlockValue::Paragraph(..)));
    assert!(doc.refmap.lookup("r").is_some());
    roundtrip("[r]: /u\nafter\n");
}

#[test]
fn footnote_definition() {
    let source = "text[^1].\n\n[^1]: the note\n";
    let doc = parse(source);
    match &doc.blocks[2].value {
        BlockValue::FootnoteDefinition(d) => {
            assert_eq!(d.label, "1");
            assert_eq!(d.children.len(), 1);
        }
        other => panic!("expected footnote definition, got {:?}", other),
    }
    roundtrip(source);
}

#[test]
fn footnote_definition_with_continuation() {
    roundtrip("[^a]: first\n    second\n");
}

#[test]
fn footnotes_off_without_gfm() {
    let mut options = Options::default();
    options.parse.gfm = false;
    let doc = parse_document("[^1]: the note\n", &options);
    assert!(matches!(doc.blocks[0].value, BlockValue::Paragraph(..)));

    let with_gfm = parse("[^1]: the note\n");
    assert!(matches!(
        with_gfm.blocks[0].value,
        BlockValue::FootnoteDefinition(..)
    ));
}
