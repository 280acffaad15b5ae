use pretty_assertions::assert_eq;

use super::*;
use crate::nodes::{BlockValue, NodeTable, TableAlignment};

fn table(doc: &Document, ix: usize) -> &NodeTable {
    match &doc.blocks[ix].value {
        BlockValue::Table(t) => t,
        other => panic!("expected table, got {:?}", other),
    }
}

#[test]
fn basic_table() {
    let source = "| a | b |\n| --- | --- |\n| c | d |\n";
    let doc = parse(source);
    let t = table(&doc, 0);
    assert_eq!(t.header.cells.len(), 2);
    assert_eq!(t.rows.len(), 1);
    assert_eq!(text(&t.header.cells[0].children[0]), "a");
    roundtrip(source);
}

#[test]
fn alignments() {
    let source = "| a | b | c | d |\n| :--- | ---: | :---: | --- |\n";
    let doc = parse(source);
    assert_eq!(
        table(&doc, 0).alignments,
        vec![
            TableAlignment::Left,
            TableAlignment::Right,
            TableAlignment::Center,
            TableAlignment::None
        ]
    );
    roundtrip(source);
}

#[test]
fn cell_count_mismatch_is_not_a_table() {
    let doc = parse("| a | b |\n| --- |\n");
    assert!(doc
        .blocks
        .iter()
        .all(|b| !matches!(b.value, BlockValue::Table(..))));
    roundtrip("| a | b |\n| --- |\n");
}

#[test]
fn multiline_paragraph_is_not_a_header() {
    let doc = parse("text\n| a | b |\n| --- | --- |\n");
    assert!(doc
        .blocks
        .iter()
        .all(|b| !matches!(b.value, BlockValue::Table(..))));
}

#[test]
fn table_ends_at_blank_line() {
    let source = "| a | b |\n| --- | --- |\n| c | d |\n\npara\n";
    let doc = parse(source);
    assert_eq!(table(&doc, 0).rows.len(), 1);
    assert!(matches!(doc.blocks[2].value, BlockValue::Paragraph(..)));
    roundtrip(source);
}

#[test]
fn table_ends_at_block_start() {
    let source = "| a | b |\n| --- | --- |\n# h\n";
    let doc = parse(source);
    assert!(table(&doc, 0).rows.is_empty());
    assert!(matches!(doc.blocks[1].value, BlockValue::Heading(..)));
    roundtrip(source);
}

#[test]
fn pipeless_body_row() {
    let source = "| a | b |\n| --- | --- |\nrow\n";
    let doc = parse(source);
    assert_eq!(table(&doc, 0).rows.len(), 1);
    roundtrip(source);
}

#[test]
fn escaped_pipe_stays_in_cell() {
    let source = "| a\\|b | c |\n| --- | --- |\n";
    let doc = parse(source);
    assert_eq!(table(&doc, 0).header.cells.len(), 2);
    roundtrip(source);
}

#[test]
fn cells_carry_inline_content() {
    let source = "| *em* | b |\n| --- | --- |\n";
    let doc = parse(source);
    let cell = &table(&doc, 0).header.cells[0];
    assert!(matches!(
        cell.children[0].value,
        crate::nodes::InlineValue::Emph(..)
    ));
}

#[test]
fn tables_off_without_gfm() {
    let mut options = Options::default();
    options.parse.gfm = false;
    let doc = parse_document("| a | b |\n| --- | --- |\n", &options);
    assert!(doc
        .blocks
        .iter()
        .all(|b| !matches!(b.value, BlockValue::Table(..))));
}

#[test]
fn single_column_is_not_a_table() {
    let doc = parse("| a |\n| --- |\n");
    assert!(doc
        .blocks
        .iter()
        .all(|b| !matches!(b.value, BlockValue::Table(..))));
    roundtrip("| a |\n| --- |\n");
}
