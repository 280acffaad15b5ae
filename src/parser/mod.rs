//! The block parser: a line-driven state machine.
//!
//! Each line passes through three phases, the way cmark structures its
//! parser: match the continuation markers of the open containers
//! ([`Parser::match_containers`]), try to open new containers and leaves
//! at the remainder ([`Parser::open_new_blocks`]), then route leftover
//! text ([`Parser::add_text_to_container`]). Inline content is parsed in
//! a second pass once the reference index is complete.

pub(crate) mod emphasis;
pub(crate) mod inlines;
mod options;
pub(crate) mod table;

pub use options::{
    FenceCharStyle, ListStyleType, Options, ParseOptions, SerializeOptions, TitleQuoteStyle,
};
pub use self::inlines::{RefMap, ResolvedReference};

use std::cmp::min;

use smallvec::SmallVec;

use crate::nodes::{
    Block, BlockValue, Document, LineOffset, ListDelimType, ListItem, ListType, NodeBlockQuote,
    NodeCodeBlock, NodeFootnoteDefinition, NodeHeading, NodeHtmlBlock, NodeLinkRefDef, NodeList,
    NodeParagraph, NodeTable, NodeThematicBreak, Span, TableCell, TableRow,
};
use crate::parser::inlines::parse_inlines;
use crate::scanner::Scanner;
use crate::scanners;
use crate::strings;

const TAB_STOP: usize = 4;
const CODE_INDENT: usize = 4;

// Very deeply nested lists can cause quadratic performance issues. The
// limit is far above anything a non-contrived document reaches; deeper
// markers parse as paragraph text.
const MAX_LIST_DEPTH: usize = 100;

/// Parse a Markdown document to a [`Document`].
///
/// See the documentation of the crate root for an example.
pub fn parse_document(source: &str, options: &Options) -> Document {
    let scanner = Scanner::new(source);
    let len = scanner.len();
    let bom = source.starts_with('\u{feff}');
    let (parse_source, base) = if bom {
        (&source['\u{feff}'.len_utf8()..], 1)
    } else {
        (source, 0)
    };
    let (blocks, refmap) = parse_range(parse_source, base, options, None);
    Document {
        blocks,
        span: Span::new(0, len),
        refmap,
        final_newline: source.ends_with('\n'),
        bom,
    }
}

/// Parses one region of a source into top-level blocks. Spans are absolute:
/// `base` is the code-point offset of the region start. `lookup` supplies
/// the reference index consulted for reference links; when absent, the
/// definitions collected from the region itself are used (the full-parse
/// case). The collected definitions are returned either way.
pub(crate) fn parse_range(
    source: &str,
    base: usize,
    options: &Options,
    lookup: Option<&RefMap>,
) -> (Vec<Block>, RefMap) {
    let mut parser = Parser::new(source, base, options);
    parser.run();
    let mut blocks = parser.finish();
    let refmap = parser.refmap;
    process_inline_content(&mut blocks, lookup.unwrap_or(&refmap), options);
    (blocks, refmap)
}

fn process_inline_content(blocks: &mut [Block], refmap: &RefMap, options: &Options) {
    for block in blocks {
        match block.value {
            BlockValue::Paragraph(ref mut p) => {
                p.children = parse_inlines(&p.content, &p.line_offsets, refmap, options);
                p.content = String::new();
                p.line_offsets = Vec::new();
            }
            BlockValue::Heading(ref mut h) => {
                h.children = parse_inlines(&h.content, &h.line_offsets, refmap, options);
                h.content = String::new();
                h.line_offsets = Vec::new();
            }
            BlockValue::BlockQuote(ref mut q) => {
                process_inline_content(&mut q.children, refmap, options)
            }
            BlockValue::List(ref mut l) => {
                for item in &mut l.items {
                    process_inline_content(&mut item.children, refmap, options);
                }
            }
            BlockValue::FootnoteDefinition(ref mut d) => {
                process_inline_content(&mut d.children, refmap, options)
            }
            BlockValue::Table(ref mut t) => {
                process_cells(&mut t.header, refmap, options);
                for row in &mut t.rows {
                    process_cells(row, refmap, options);
                }
            }
            _ => {}
        }
    }
}

fn process_cells(row: &mut TableRow, refmap: &RefMap, options: &Options) {
    for cell in &mut row.cells {
        cell.children = parse_inlines(&cell.content, &cell.line_offsets, refmap, options);
        cell.content = String::new();
        cell.line_offsets = Vec::new();
    }
}

#[derive(Clone, Copy)]
struct Line<'s> {
    /// Line text without its terminator.
    text: &'s str,
    /// Absolute code-point offset of the line start.
    cp_start: usize,
    /// Code points in `text`.
    cp_len: usize,
    /// Code points of terminator (0 at EOF, 1 for `\n`, 2 for `\r\n`).
    term: usize,
}

impl<'s> Line<'s> {
    fn cp_end(&self) -> usize {
        self.cp_start + self.cp_len + self.term
    }
}

fn split_lines(source: &str, base: usize) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut cp = base;
    let mut line_start_byte = 0;
    let mut line_start_cp = base;
    for (b, c) in source.char_indices() {
        if c == '\n' {
            let mut text = &source[line_start_byte..b];
            let mut term = 1;
            if text.ends_with('\r') {
                text = &text[..text.len() - 1];
                term = 2;
            }
            lines.push(Line {
                text,
                cp_start: line_start_cp,
                cp_len: cp - line_start_cp - (term - 1),
                term,
            });
            cp += 1;
            line_start_byte = b + 1;
            line_start_cp = cp;
        } else {
            cp += 1;
        }
    }
    if line_start_byte < source.len() {
        lines.push(Line {
            text: &source[line_start_byte..],
            cp_start: line_start_cp,
            cp_len: cp - line_start_cp,
            term: 0,
        });
    }
    lines
}

struct ListMarkerData {
    list_type: ListType,
    bullet_char: u8,
    start: usize,
    delimiter: ListDelimType,
}

fn parse_list_marker(
    line: &str,
    mut pos: usize,
    interrupts_paragraph: bool,
) -> Option<(usize, ListMarkerData)> {
    let b = line.as_bytes();
    let startpos = pos;
    let mut c = *b.get(pos)?;

    if c == b'*' || c == b'-' || c == b'+' {
        pos += 1;
        if pos < b.len() && !strings::is_space_or_tab(b[pos]) {
            return None;
        }
        if interrupts_paragraph {
            let mut i = pos;
            while i < b.len() && strings::is_space_or_tab(b[i]) {
                i += 1;
            }
            if i >= b.len() {
                return None;
            }
        }
        Some((
            pos - startpos,
            ListMarkerData {
                list_type: ListType::Bullet,
                bullet_char: c,
                start: 1,
                delimiter: ListDelimType::Period,
            },
        ))
    } else if c.is_ascii_digit() {
        let mut start: usize = 0;
        let mut digits = 0;
        loop {
            start = 10 * start + (b[pos] - b'0') as usize;
            pos += 1;
            digits += 1;
            if !(digits < 9 && pos < b.len() && b[pos].is_ascii_digit()) {
                break;
            }
        }
        if interrupts_paragraph && start != 1 {
            return None;
        }
        c = *b.get(pos)?;
        if c != b'.' && c != b')' {
            return None;
        }
        pos += 1;
        if pos < b.len() && !strings::is_space_or_tab(b[pos]) {
            return None;
        }
        if interrupts_paragraph {
            let mut i = pos;
            while i < b.len() && strings::is_space_or_tab(b[i]) {
                i += 1;
            }
            if i >= b.len() {
                return None;
            }
        }
        Some((
            pos - startpos,
            ListMarkerData {
                list_type: ListType::Ordered,
                bullet_char: 0,
                start,
                delimiter: if c == b'.' {
                    ListDelimType::Period
                } else {
                    ListDelimType::Paren
                },
            },
        ))
    } else {
        None
    }
}

fn lists_match(list: &ListData, marker: &ListMarkerData) -> bool {
    list.list_type == marker.list_type
        && list.delimiter == marker.delimiter
        && list.bullet_char == marker.bullet_char
}

struct ListData {
    list_type: ListType,
    bullet_char: u8,
    start: usize,
    delimiter: ListDelimType,
    items: Vec<ListItem>,
}

struct ItemData {
    marker_offset: usize,
    padding: usize,
    ordinal: usize,
    task: Option<char>,
    open_line: usize,
}

enum ContainerKind {
    Quote,
    List(ListData),
    Item(ItemData),
    FootnoteDef(String),
}

struct OpenContainer {
    kind: ContainerKind,
    children: Vec<Block>,
    span_from: usize,
    span_to: usize,
}

struct LeafText {
    content: String,
    content_cp: usize,
    line_offsets: Vec<LineOffset>,
    span_from: usize,
    span_to: usize,
}

enum OpenLeaf {
    Paragraph(LeafText),
    Fenced {
        fence_char: u8,
        fence_length: usize,
        fence_offset: usize,
        info: String,
        literal: String,
        close_fence_length: Option<usize>,
        span_from: usize,
        span_to: usize,
    },
    Indented {
        literal: String,
        pending_blanks: usize,
        pending_span: Span,
        span_from: usize,
        span_to: usize,
    },
    Html {
        block_type: u8,
        literal: String,
        span_from: usize,
        span_to: usize,
    },
    Table {
        alignments: Vec<crate::nodes::TableAlignment>,
        header: TableRow,
        delimiter_literal: String,
        rows: Vec<TableRow>,
        span_from: usize,
        span_to: usize,
    },
}

struct LineOutcome {
    opened: bool,
    consumed: bool,
}

pub(crate) struct Parser<'s, 'o> {
    options: &'o Options,
    lines: Vec<Line<'s>>,
    line_ix: usize,
    offset: usize,
    column: usize,
    first_nonspace: usize,
    first_nonspace_column: usize,
    indent: usize,
    blank: bool,
    containers: SmallVec<[OpenContainer; 4]>,
    doc_children: Vec<Block>,
    leaf: Option<OpenLeaf>,
    refmap: RefMap,
}

impl<'s, 'o> Parser<'s, 'o> {
    fn new(source: &'s str, base: usize, options: &'o Options) -> Self {
        Parser {
            options,
            lines: split_lines(source, base),
            line_ix: 0,
            offset: 0,
            column: 0,
            first_nonspace: 0,
            first_nonspace_column: 0,
            indent: 0,
            blank: false,
            containers: SmallVec::new(),
            doc_children: Vec::new(),
            leaf: None,
            refmap: RefMap::new(),
        }
    }

    fn gfm(&self) -> bool {
        self.options.parse.gfm
    }

    fn run(&mut self) {
        for ix in 0..self.lines.len() {
            self.line_ix = ix;
            self.process_line();
        }
    }

    fn finish(&mut self) -> Vec<Block> {
        self.truncate_to(0);
        std::mem::take(&mut self.doc_children)
    }

    fn process_line(&mut self) {
        let line = self.lines[self.line_ix];
        self.offset = 0;
        self.column = 0;
        self.first_nonspace = 0;
        self.first_nonspace_column = 0;
        self.indent = 0;
        self.blank = false;

        let matched = self.match_containers(&line);
        let all_matched = matched == self.containers.len();

        if all_matched && self.leaf_consumes_line(&line) {
            return;
        }

        let outcome = self.open_new_blocks(matched, &line);
        self.add_text_to_container(matched, outcome, &line);
    }

    fn find_first_nonspace(&mut self, line: &Line) {
        let b = line.text.as_bytes();
        let mut i = self.offset;
        let mut col = self.column;
        while i < b.len() {
            match b[i] {
                b' ' => {
                    col += 1;
                    i += 1;
                }
                b'\t' => {
                    col += TAB_STOP - (col % TAB_STOP);
                    i += 1;
                }
                _ => break,
            }
        }
        self.first_nonspace = i;
        self.first_nonspace_column = col;
        self.indent = col - self.column;
        self.blank = i >= b.len();
    }

    fn advance_offset(&mut self, line: &Line, mut count: usize, columns: bool) {
        let b = line.text.as_bytes();
        while count > 0 && self.offset < b.len() {
            if b[self.offset] == b'\t' {
                let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
                // a tab is never split; column consumption may overshoot
                self.column += chars_to_tab;
                self.offset += 1;
                count -= if columns { min(count, chars_to_tab) } else { 1 };
            } else {
                self.offset += 1;
                self.column += 1;
                count -= 1;
            }
        }
    }

    ///////////////////////////
    // Container continuation //
    ///////////////////////////

    fn match_containers(&mut self, line: &Line) -> usize {
        enum Probe {
            Quote,
            List,
            Item(usize, usize),
            Footnote,
        }

        let mut matched = 0;
        for i in 0..self.containers.len() {
            self.find_first_nonspace(line);
            let probe = match self.containers[i].kind {
                ContainerKind::Quote => Probe::Quote,
                ContainerKind::List(..) => Probe::List,
                ContainerKind::Item(ref d) => Probe::Item(d.marker_offset, d.padding),
                ContainerKind::FootnoteDef(..) => Probe::Footnote,
            };
            let ok = match probe {
                Probe::Quote => self.parse_block_quote_prefix(line),
                Probe::List => true,
                Probe::Item(marker_offset, padding) => {
                    let has_content = !self.containers[i].children.is_empty()
                        || self.item_has_items(i)
                        || (i + 1 == self.containers.len() && self.leaf.is_some());
                    if self.indent >= marker_offset + padding {
                        self.advance_offset(line, marker_offset + padding, true);
                        true
                    } else if self.blank && has_content {
                        self.offset = self.first_nonspace;
                        self.column = self.first_nonspace_column;
                        true
                    } else {
                        false
                    }
                }
                Probe::Footnote => {
                    if self.indent >= CODE_INDENT {
                        self.advance_offset(line, CODE_INDENT, true);
                        true
                    } else {
                        self.blank
                    }
                }
            };
            if !ok {
                break;
            }
            matched = i + 1;
        }
        matched
    }

    // an item whose direct child is an open nested list counts as begun
    fn item_has_items(&self, i: usize) -> bool {
        i + 1 < self.containers.len()
    }

    fn parse_block_quote_prefix(&mut self, line: &Line) -> bool {
        let b = line.text.as_bytes();
        if self.indent <= 3 && b.get(self.first_nonspace) == Some(&b'>') {
            self.advance_offset(line, self.indent + 1, true);
            if let Some(&c) = b.get(self.offset) {
                if strings::is_space_or_tab(c) {
                    self.advance_offset(line, 1, true);
                }
            }
            true
        } else {
            false
        }
    }

    ////////////////////////
    // Leaf continuation  //
    ////////////////////////

    fn leaf_consumes_line(&mut self, line: &Line) -> bool {
        self.find_first_nonspace(line);
        match self.leaf {
            Some(OpenLeaf::Fenced { .. }) => {
                self.continue_fenced(line);
                true
            }
            Some(OpenLeaf::Indented { .. }) => self.continue_indented(line),
            Some(OpenLeaf::Html { .. }) => self.continue_html(line),
            Some(OpenLeaf::Table { .. }) => self.continue_table(line),
            Some(OpenLeaf::Paragraph(..)) => self.try_table_interrupt(line),
            None => false,
        }
    }

    fn continue_fenced(&mut self, line: &Line) {
        let rest = &line.text[self.first_nonspace..];
        let (fence_char, fence_length) = match self.leaf {
            Some(OpenLeaf::Fenced {
                fence_char,
                fence_length,
                ..
            }) => (fence_char, fence_length),
            _ => unreachable!(),
        };
        if self.indent <= 3 {
            if let Some(n) = scanners::close_code_fence(rest, fence_char, fence_length) {
                if let Some(OpenLeaf::Fenced {
                    ref mut close_fence_length,
                    ref mut span_to,
                    ..
                }) = self.leaf
                {
                    *close_fence_length = Some(n);
                    *span_to = line.cp_end();
                }
                self.close_leaf();
                return;
            }
        }
        if let Some(OpenLeaf::Fenced {
            ref mut literal,
            ref mut span_to,
            ..
        }) = self.leaf
        {
            literal.push_str(&line.text[self.offset..]);
            literal.push('\n');
            *span_to = line.cp_end();
        }
    }

    fn continue_indented(&mut self, line: &Line) -> bool {
        if self.blank {
            if let Some(OpenLeaf::Indented {
                ref mut pending_blanks,
                ref mut pending_span,
                ..
            }) = self.leaf
            {
                if *pending_blanks == 0 {
                    pending_span.from = line.cp_start;
                }
                *pending_blanks += 1;
                pending_span.to = line.cp_end();
            }
            return true;
        }
        if self.indent >= CODE_INDENT {
            self.advance_offset(line, CODE_INDENT, true);
            if let Some(OpenLeaf::Indented {
                ref mut literal,
                ref mut pending_blanks,
                ref mut span_to,
                ..
            }) = self.leaf
            {
                for _ in 0..*pending_blanks {
                    literal.push('\n');
                }
                *pending_blanks = 0;
                literal.push_str(&line.text[self.offset..]);
                literal.push('\n');
                *span_to = line.cp_end();
            }
            return true;
        }
        self.close_leaf();
        false
    }

    fn continue_html(&mut self, line: &Line) -> bool {
        let block_type = match self.leaf {
            Some(OpenLeaf::Html { block_type, .. }) => block_type,
            _ => unreachable!(),
        };
        if block_type >= 6 && self.blank {
            self.close_leaf();
            return false;
        }
        let rest = line.text[self.first_nonspace..].to_string();
        if let Some(OpenLeaf::Html {
            ref mut literal,
            ref mut span_to,
            ..
        }) = self.leaf
        {
            literal.push_str(&line.text[self.offset..]);
            literal.push('\n');
            *span_to = line.cp_end();
        }
        if (1..=5).contains(&block_type) && scanners::html_block_end(block_type, &rest) {
            self.close_leaf();
        }
        true
    }

    fn line_starts_new_block(&self, rest: &str) -> bool {
        if self.indent >= CODE_INDENT || rest.is_empty() {
            return false;
        }
        rest.as_bytes()[0] == b'>'
            || scanners::atx_heading_start(rest).is_some()
            || scanners::open_code_fence(rest).is_some()
            || scanners::thematic_break(rest).is_some()
            || scanners::html_block_start(rest).is_some()
            || parse_list_marker(rest, 0, false).is_some()
    }

    fn continue_table(&mut self, line: &Line) -> bool {
        if self.blank {
            self.close_leaf();
            return false;
        }
        let rest = &line.text[self.first_nonspace..];
        if self.line_starts_new_block(rest) {
            self.close_leaf();
            return false;
        }
        let cells = match table::row(rest) {
            Some(cells) => cells,
            None => {
                self.close_leaf();
                return false;
            }
        };
        let row = self.build_row(line, cells);
        if let Some(OpenLeaf::Table {
            ref mut rows,
            ref mut span_to,
            ..
        }) = self.leaf
        {
            rows.push(row);
            *span_to = line.cp_end();
        }
        true
    }

    fn build_row(&self, line: &Line, cells: Vec<table::RowCell>) -> TableRow {
        let cell_base = line.cp_start + self.first_nonspace;
        let cells = cells
            .into_iter()
            .map(|c| TableCell {
                span: Span::new(cell_base + c.start, cell_base + c.end),
                children: vec![],
                line_offsets: vec![LineOffset {
                    content_pos: 0,
                    source_pos: cell_base + c.start,
                }],
                content: c.text,
            })
            .collect();
        TableRow {
            span: Span::new(line.cp_start + self.offset, line.cp_end()),
            literal: line.text[self.offset..].to_string(),
            cells,
        }
    }

    // A delimiter row directly under a one-line paragraph turns that
    // paragraph into a table header.
    fn try_table_interrupt(&mut self, line: &Line) -> bool {
        if !self.gfm() || self.indent >= CODE_INDENT {
            return false;
        }
        let rest = &line.text[self.first_nonspace..];
        let alignments = match table::delimiter_row(rest) {
            Some(a) => a,
            None => return false,
        };
        let (header, span_from) = {
            let lt = match self.leaf {
                Some(OpenLeaf::Paragraph(ref lt)) => lt,
                _ => return false,
            };
            if lt.line_offsets.len() != 1 {
                return false;
            }
            let content = lt.content.trim_end_matches('\n');
            let cells = match table::row(content) {
                Some(cells) => cells,
                None => return false,
            };
            if cells.len() != alignments.len() {
                return false;
            }
            let base = lt.line_offsets[0].source_pos;
            let cells = cells
                .into_iter()
                .map(|c| TableCell {
                    span: Span::new(base + c.start, base + c.end),
                    children: vec![],
                    line_offsets: vec![LineOffset {
                        content_pos: 0,
                        source_pos: base + c.start,
                    }],
                    content: c.text,
                })
                .collect();
            (
                TableRow {
                    span: Span::new(lt.span_from, lt.span_to),
                    literal: content.to_string(),
                    cells,
                },
                lt.span_from,
            )
        };
        self.leaf = Some(OpenLeaf::Table {
            alignments,
            header,
            delimiter_literal: line.text[self.offset..].to_string(),
            rows: vec![],
            span_from,
            span_to: line.cp_end(),
        });
        true
    }

    /////////////////////
    // New block phase //
    /////////////////////

    fn open_new_blocks(&mut self, mut matched: usize, line: &Line) -> LineOutcome {
        let mut outcome = LineOutcome {
            opened: false,
            consumed: false,
        };
        let mut maybe_lazy = matches!(self.leaf, Some(OpenLeaf::Paragraph(..)));
        let mut depth = self.containers.len();

        loop {
            self.find_first_nonspace(line);
            if self.blank {
                break;
            }
            let indented = self.indent >= CODE_INDENT;
            let rest = &line.text[self.first_nonspace..];
            let first = rest.as_bytes()[0];

            if !indented && first == b'>' {
                let from = line.cp_start + self.offset;
                self.truncate_opened(&mut matched, &mut outcome);
                self.advance_offset(line, self.first_nonspace - self.offset + 1, false);
                if let Some(&c) = line.text.as_bytes().get(self.offset) {
                    if strings::is_space_or_tab(c) {
                        self.advance_offset(line, 1, true);
                    }
                }
                self.containers.push(OpenContainer {
                    kind: ContainerKind::Quote,
                    children: vec![],
                    span_from: from,
                    span_to: line.cp_end(),
                });
                matched = self.containers.len();
                maybe_lazy = false;
                depth += 1;
                continue;
            }

            if !indented {
                if let Some((consumed, level)) = scanners::atx_heading_start(rest) {
                    let from = line.cp_start + self.offset;
                    self.truncate_opened(&mut matched, &mut outcome);
                    self.advance_offset(line, self.first_nonspace - self.offset + consumed, false);
                    let node = NodeHeading {
                        level,
                        children: vec![],
                        content: line.text[self.offset..].to_string(),
                        line_offsets: vec![LineOffset {
                            content_pos: 0,
                            source_pos: line.cp_start + self.offset,
                        }],
                    };
                    self.push_block(Block {
                        value: BlockValue::Heading(node),
                        span: Span::new(from, line.cp_end()),
                    });
                    outcome.consumed = true;
                    return outcome;
                }
            }

            if !indented {
                if let Some((fence_char, fence_length)) = scanners::open_code_fence(rest) {
                    let from = line.cp_start + self.offset;
                    let fence_offset = self.indent;
                    self.truncate_opened(&mut matched, &mut outcome);
                    self.leaf = Some(OpenLeaf::Fenced {
                        fence_char,
                        fence_length,
                        fence_offset,
                        info: line.text[self.first_nonspace + fence_length..].to_string(),
                        literal: String::new(),
                        close_fence_length: None,
                        span_from: from,
                        span_to: line.cp_end(),
                    });
                    outcome.consumed = true;
                    return outcome;
                }
            }

            if !indented {
                let block_type = scanners::html_block_start(rest).or_else(|| {
                    if !matches!(self.leaf, Some(OpenLeaf::Paragraph(..)))
                        && scanners::html_block_start_7(rest)
                    {
                        Some(7)
                    } else {
                        None
                    }
                });
                if let Some(block_type) = block_type {
                    let from = line.cp_start + self.offset;
                    self.truncate_opened(&mut matched, &mut outcome);
                    let mut literal = line.text[self.offset..].to_string();
                    literal.push('\n');
                    self.leaf = Some(OpenLeaf::Html {
                        block_type,
                        literal,
                        span_from: from,
                        span_to: line.cp_end(),
                    });
                    if (1..=5).contains(&block_type) && scanners::html_block_end(block_type, rest) {
                        self.close_leaf();
                    }
                    outcome.consumed = true;
                    return outcome;
                }
            }

            if !indented {
                if let Some(marker) = scanners::thematic_break(rest) {
                    let from = line.cp_start + self.offset;
                    self.truncate_opened(&mut matched, &mut outcome);
                    let node = NodeThematicBreak {
                        marker,
                        literal: line.text[self.offset..].to_string(),
                    };
                    self.push_block(Block {
                        value: BlockValue::ThematicBreak(node),
                        span: Span::new(from, line.cp_end()),
                    });
                    outcome.consumed = true;
                    return outcome;
                }
            }

            if self.gfm() && !indented {
                if let Some((label, consumed)) = scanners::footnote_definition_start(rest) {
                    let from = line.cp_start + self.offset;
                    self.truncate_opened(&mut matched, &mut outcome);
                    self.advance_offset(line, self.first_nonspace - self.offset + consumed, false);
                    if let Some(&c) = line.text.as_bytes().get(self.offset) {
                        if strings::is_space_or_tab(c) {
                            self.advance_offset(line, 1, true);
                        }
                    }
                    self.containers.push(OpenContainer {
                        kind: ContainerKind::FootnoteDef(label),
                        children: vec![],
                        span_from: from,
                        span_to: line.cp_end(),
                    });
                    matched = self.containers.len();
                    maybe_lazy = false;
                    depth += 1;
                    continue;
                }
            }

            if !indented && depth < MAX_LIST_DEPTH {
                let interrupts = matches!(self.leaf, Some(OpenLeaf::Paragraph(..)));
                if let Some((marker_len, marker)) =
                    parse_list_marker(line.text, self.first_nonspace, interrupts)
                {
                    let from = line.cp_start + self.offset;
                    let marker_offset = self.indent;
                    self.truncate_opened(&mut matched, &mut outcome);

                    self.advance_offset(
                        line,
                        self.first_nonspace - self.offset + marker_len,
                        false,
                    );
                    let (save_offset, save_column) = (self.offset, self.column);
                    let b = line.text.as_bytes();
                    while self.column - save_column <= 5
                        && self.offset < b.len()
                        && strings::is_space_or_tab(b[self.offset])
                    {
                        self.advance_offset(line, 1, true);
                    }
                    let spaces = self.column - save_column;
                    let padding = if !(1..5).contains(&spaces) || self.offset >= b.len() {
                        self.offset = save_offset;
                        self.column = save_column;
                        if spaces > 0 {
                            self.advance_offset(line, 1, true);
                        }
                        marker_len + 1
                    } else {
                        marker_len + spaces
                    };

                    let list_matches = match self.containers.last() {
                        Some(container) => match container.kind {
                            ContainerKind::List(ref ld) => lists_match(ld, &marker),
                            _ => false,
                        },
                        None => false,
                    };
                    if !list_matches {
                        self.close_trailing_list();
                        self.containers.push(OpenContainer {
                            kind: ContainerKind::List(ListData {
                                list_type: marker.list_type,
                                bullet_char: marker.bullet_char,
                                start: marker.start,
                                delimiter: marker.delimiter,
                                items: vec![],
                            }),
                            children: vec![],
                            span_from: from,
                            span_to: line.cp_end(),
                        });
                    }
                    self.containers.push(OpenContainer {
                        kind: ContainerKind::Item(ItemData {
                            marker_offset,
                            padding,
                            ordinal: if marker.list_type == ListType::Ordered {
                                marker.start
                            } else {
                                0
                            },
                            task: None,
                            open_line: self.line_ix,
                        }),
                        children: vec![],
                        span_from: from,
                        span_to: line.cp_end(),
                    });
                    matched = self.containers.len();
                    maybe_lazy = false;
                    depth += 1;
                    continue;
                }
            }

            if indented && !maybe_lazy && !self.blank {
                let from = line.cp_start + self.offset;
                self.truncate_opened(&mut matched, &mut outcome);
                self.advance_offset(line, CODE_INDENT, true);
                let mut literal = line.text[self.offset..].to_string();
                literal.push('\n');
                self.leaf = Some(OpenLeaf::Indented {
                    literal,
                    pending_blanks: 0,
                    pending_span: Span::new(0, 0),
                    span_from: from,
                    span_to: line.cp_end(),
                });
                outcome.consumed = true;
                return outcome;
            }

            break;
        }

        outcome
    }

    // Closes the leaf and any unmatched containers the first time a new
    // block actually opens on this line.
    fn truncate_opened(&mut self, matched: &mut usize, outcome: &mut LineOutcome) {
        self.truncate_to(*matched);
        outcome.opened = true;
        *matched = self.containers.len();
    }

    // A List container only holds items; any other incoming child closes
    // it first (the owned-tree rendition of cmark's can_contain walk).
    fn close_trailing_list(&mut self) {
        while matches!(
            self.containers.last(),
            Some(OpenContainer {
                kind: ContainerKind::List(..),
                ..
            })
        ) {
            self.close_container();
        }
    }

    ////////////////////
    // Text routing   //
    ////////////////////

    fn add_text_to_container(&mut self, matched: usize, outcome: LineOutcome, line: &Line) {
        if outcome.consumed {
            return;
        }
        self.find_first_nonspace(line);

        if self.blank {
            self.close_leaf();
            if !outcome.opened {
                while self.containers.len() > matched {
                    self.close_container();
                }
            }
            self.add_blank_line(line);
            return;
        }

        let lazy = !outcome.opened
            && matched < self.containers.len()
            && matches!(self.leaf, Some(OpenLeaf::Paragraph(..)));
        let continuation = !outcome.opened
            && matched == self.containers.len()
            && matches!(self.leaf, Some(OpenLeaf::Paragraph(..)));

        if lazy || continuation {
            self.add_line_to_paragraph(line);
            return;
        }

        if !outcome.opened {
            self.truncate_to(matched);
        }
        self.open_paragraph(line);
    }

    fn open_paragraph(&mut self, line: &Line) {
        self.close_trailing_list();

        let mut src = line.cp_start + self.offset;
        let mut text = &line.text[self.offset..];

        if self.gfm() {
            let line_ix = self.line_ix;
            if let Some(container) = self.containers.last_mut() {
                if let ContainerKind::Item(ref mut item) = container.kind {
                    if container.children.is_empty()
                        && item.open_line == line_ix
                        && item.task.is_none()
                    {
                        if let Some(symbol) = scanners::task_item_marker(text) {
                            item.task = Some(symbol);
                            text = &text[4..];
                            src += 4;
                        }
                    }
                }
            }
        }

        let mut content = text.to_string();
        content.push('\n');
        self.leaf = Some(OpenLeaf::Paragraph(LeafText {
            content_cp: text.chars().count() + 1,
            content,
            line_offsets: vec![LineOffset {
                content_pos: 0,
                source_pos: src,
            }],
            span_from: src,
            span_to: line.cp_end(),
        }));
    }

    fn add_line_to_paragraph(&mut self, line: &Line) {
        if let Some(OpenLeaf::Paragraph(ref mut lt)) = self.leaf {
            let text = &line.text[self.offset..];
            lt.line_offsets.push(LineOffset {
                content_pos: lt.content_cp,
                source_pos: line.cp_start + self.offset,
            });
            lt.content.push_str(text);
            lt.content.push('\n');
            lt.content_cp += text.chars().count() + 1;
            lt.span_to = line.cp_end();
        }
    }

    fn add_blank_line(&mut self, line: &Line) {
        let from = line.cp_start + self.offset;
        let to = line.cp_end();
        let line_start = line.cp_start;
        let children = self.current_children();
        if let Some(last) = children.last_mut() {
            if let BlockValue::BlankLines(ref mut count) = last.value {
                if last.span.to == line_start {
                    *count += 1;
                    last.span.to = to;
                    return;
                }
            }
        }
        children.push(Block {
            value: BlockValue::BlankLines(1),
            span: Span::new(from, to),
        });
    }

    fn current_children(&mut self) -> &mut Vec<Block> {
        match self.containers.last_mut() {
            Some(container) => match container.kind {
                ContainerKind::List(ref mut ld) => {
                    &mut ld.items.last_mut().expect("list without items").children
                }
                _ => &mut container.children,
            },
            None => &mut self.doc_children,
        }
    }

    ////////////////////
    // Block closing  //
    ////////////////////

    fn truncate_to(&mut self, matched: usize) {
        self.close_leaf();
        while self.containers.len() > matched {
            self.close_container();
        }
    }

    fn push_block(&mut self, block: Block) {
        self.close_trailing_list();
        match self.containers.last_mut() {
            Some(c) => c.children.push(block),
            None => self.doc_children.push(block),
        }
    }

    fn close_leaf(&mut self) {
        let leaf = match self.leaf.take() {
            Some(leaf) => leaf,
            None => return,
        };
        match leaf {
            OpenLeaf::Paragraph(lt) => self.close_paragraph(lt),
            OpenLeaf::Fenced {
                fence_char,
                fence_length,
                fence_offset,
                info,
                literal,
                close_fence_length,
                span_from,
                span_to,
            } => {
                self.push_block(Block {
                    value: BlockValue::CodeBlock(NodeCodeBlock {
                        fenced: true,
                        fence_char,
                        fence_length,
                        fence_offset,
                        close_fence_length,
                        info,
                        literal,
                    }),
                    span: Span::new(span_from, span_to),
                });
            }
            OpenLeaf::Indented {
                literal,
                pending_blanks,
                pending_span,
                span_from,
                span_to,
            } => {
                self.push_block(Block {
                    value: BlockValue::CodeBlock(NodeCodeBlock {
                        fenced: false,
                        fence_char: 0,
                        fence_length: 0,
                        fence_offset: 0,
                        close_fence_length: None,
                        info: String::new(),
                        literal,
                    }),
                    span: Span::new(span_from, span_to),
                });
                if pending_blanks > 0 {
                    self.push_block(Block {
                        value: BlockValue::BlankLines(pending_blanks),
                        span: pending_span,
                    });
                }
            }
            OpenLeaf::Html {
                block_type,
                literal,
                span_from,
                span_to,
            } => {
                self.push_block(Block {
                    value: BlockValue::HtmlBlock(NodeHtmlBlock {
                        block_type,
                        literal,
                    }),
                    span: Span::new(span_from, span_to),
                });
            }
            OpenLeaf::Table {
                alignments,
                header,
                delimiter_literal,
                rows,
                span_from,
                span_to,
            } => {
                self.push_block(Block {
                    value: BlockValue::Table(NodeTable {
                        alignments,
                        header,
                        delimiter_literal,
                        rows,
                    }),
                    span: Span::new(span_from, span_to),
                });
            }
        }
    }

    // Leading reference-definition lines are split off the paragraph into
    // LinkRefDef blocks and recorded in the index; whatever remains is the
    // paragraph proper.
    fn close_paragraph(&mut self, lt: LeafText) {
        let content = lt.content;
        let trimmed = content.strip_suffix('\n').unwrap_or(&content);
        let lines: Vec<&str> = trimmed.split('\n').collect();
        let line_offsets = lt.line_offsets;

        let mut first_kept = 0;
        for (i, l) in lines.iter().enumerate() {
            let mut probe = *l;
            let mut stripped = 0;
            while stripped < 3 && probe.starts_with(' ') {
                probe = &probe[1..];
                stripped += 1;
            }
            let parts = match scanners::link_reference_definition(probe) {
                Some(parts) => parts,
                None => break,
            };
            let src = line_offsets[i].source_pos;
            let cp_len = l.chars().count();
            let span_to = if i + 1 == lines.len() {
                lt.span_to
            } else {
                src + cp_len + 1
            };
            let normalized = strings::normalize_label(&parts.label);
            if !normalized.is_empty() {
                let mut title = parts.title.clone().unwrap_or_default();
                strings::unescape(&mut title);
                self.refmap.insert(
                    normalized,
                    ResolvedReference {
                        url: strings::clean_url(&parts.dest),
                        title,
                    },
                );
            }
            self.push_block(Block {
                value: BlockValue::LinkRefDef(NodeLinkRefDef {
                    label: parts.label,
                    dest: parts.dest,
                    title: parts.title,
                    title_quote: parts.title_quote,
                    literal: l.to_string(),
                }),
                span: Span::new(src, span_to),
            });
            first_kept = i + 1;
        }

        if first_kept < lines.len() {
            let rebased: Vec<LineOffset> = line_offsets[first_kept..]
                .iter()
                .map(|e| LineOffset {
                    content_pos: e.content_pos - line_offsets[first_kept].content_pos,
                    source_pos: e.source_pos,
                })
                .collect();
            let span_from = if first_kept == 0 {
                lt.span_from
            } else {
                line_offsets[first_kept].source_pos
            };
            self.push_block(Block {
                value: BlockValue::Paragraph(NodeParagraph {
                    children: vec![],
                    content: lines[first_kept..].join("\n"),
                    line_offsets: rebased,
                }),
                span: Span::new(span_from, lt.span_to),
            });
        }
    }

    fn close_container(&mut self) {
        let c = self.containers.pop().expect("no open container");
        match c.kind {
            ContainerKind::Quote => {
                let span_to = c
                    .children
                    .last()
                    .map(|b| b.span.to)
                    .unwrap_or(c.span_to);
                self.push_block(Block {
                    value: BlockValue::BlockQuote(NodeBlockQuote {
                        children: c.children,
                    }),
                    span: Span::new(c.span_from, span_to),
                });
            }
            ContainerKind::Item(data) => {
                let span_to = c
                    .children
                    .last()
                    .map(|b| b.span.to)
                    .unwrap_or(c.span_to);
                let item = ListItem {
                    span: Span::new(c.span_from, span_to),
                    marker_offset: data.marker_offset,
                    padding: data.padding,
                    ordinal: data.ordinal,
                    task: data.task,
                    children: c.children,
                };
                match self.containers.last_mut() {
                    Some(parent) => match parent.kind {
                        ContainerKind::List(ref mut ld) => ld.items.push(item),
                        _ => unreachable!("item outside a list"),
                    },
                    None => unreachable!("item outside a list"),
                }
            }
            ContainerKind::List(mut ld) => {
                let trailing = Self::bubble_trailing_blanks(
                    ld.items.last_mut().map(|item| &mut item.children),
                );
                if let Some(last) = ld.items.last_mut() {
                    if let Some(to) = last.children.last().map(|b| b.span.to) {
                        last.span.to = to;
                    }
                }
                let tight = !Self::list_is_loose(&ld.items);
                let span_to = ld
                    .items
                    .last()
                    .map(|item| item.span.to)
                    .unwrap_or(c.span_to);
                self.push_block(Block {
                    value: BlockValue::List(NodeList {
                        list_type: ld.list_type,
                        bullet_char: ld.bullet_char,
                        start: ld.start,
                        delimiter: ld.delimiter,
                        tight,
                        items: ld.items,
                    }),
                    span: Span::new(c.span_from, span_to),
                });
                if let Some(blanks) = trailing {
                    self.push_block(blanks);
                }
            }
            ContainerKind::FootnoteDef(label) => {
                let mut children = c.children;
                let trailing = Self::bubble_trailing_blanks(Some(&mut children));
                let span_to = children.last().map(|b| b.span.to).unwrap_or(c.span_to);
                self.push_block(Block {
                    value: BlockValue::FootnoteDefinition(NodeFootnoteDefinition {
                        label,
                        children,
                    }),
                    span: Span::new(c.span_from, span_to),
                });
                if let Some(blanks) = trailing {
                    self.push_block(blanks);
                }
            }
        }
    }

    // Blank lines that trail a closing container belong to its parent;
    // giving them back keeps container spans tight and lets the
    // incremental engine localize edits around the container.
    fn bubble_trailing_blanks(children: Option<&mut Vec<Block>>) -> Option<Block> {
        let children = children?;
        match children.last() {
            Some(Block {
                value: BlockValue::BlankLines(..),
                ..
            }) => children.pop(),
            _ => None,
        }
    }

    fn list_is_loose(items: &[ListItem]) -> bool {
        items.iter().enumerate().any(|(i, item)| {
            item.children.iter().enumerate().any(|(j, child)| {
                matches!(child.value, BlockValue::BlankLines(..))
                    && (j + 1 < item.children.len() || i + 1 < items.len())
            })
        })
    }
}
