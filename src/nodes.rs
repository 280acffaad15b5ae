//! The Markdown CST.
//!
//! Unlike a rendering AST, the tree keeps every marker and style choice the
//! author made (`*` vs `_`, fence character and length, title quote kind,
//! blank-line runs) so that serialization can reproduce the input
//! byte-for-byte for the supported subset.

use crate::parser::inlines::RefMap;

/// A half-open interval `[from, to)` of Unicode code-point indices over the
/// source.
///
/// Block-level spans include their trailing line terminator, so the spans
/// of a document's top-level blocks tile `[0, len)` without gaps; this is
/// what makes affected-range arithmetic in the incremental engine total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub from: usize,
    pub to: usize,
}

impl Span {
    pub fn new(from: usize, to: usize) -> Span {
        Span { from, to }
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.to == self.from
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.from <= pos && pos < self.to
    }

    pub(crate) fn shift(&mut self, delta: isize) {
        self.from = (self.from as isize + delta) as usize;
        self.to = (self.to as isize + delta) as usize;
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{})", self.from, self.to)
    }
}

/// Maps the start of one content line to its position in the source.
///
/// Container prefixes (`> `, list padding) are stripped before leaf content
/// is accumulated, so inline spans are recovered through these entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineOffset {
    /// Code-point offset of the line start within the accumulated content.
    pub content_pos: usize,
    /// Code-point offset of the same position in the source.
    pub source_pos: usize,
}

/// An immutable parse result: the top-level block sequence, the document
/// span and the link-reference index snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
    pub span: Span,
    pub refmap: RefMap,
    #[doc(hidden)]
    pub final_newline: bool,
    #[doc(hidden)]
    pub bom: bool,
}

impl Document {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Depth-first walk over every block in the document, including the
    /// children of quotes, list items and footnote definitions.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.blocks.iter().rev().collect(),
        }
    }
}

/// Iterator over a block tree in depth-first source order.
pub struct Descendants<'a> {
    stack: Vec<&'a Block>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<&'a Block> {
        let block = self.stack.pop()?;
        match block.value {
            BlockValue::List(ref l) => {
                for item in l.items.iter().rev() {
                    self.stack.extend(item.children.iter().rev());
                }
            }
            _ => self.stack.extend(block.children().iter().rev()),
        }
        Some(block)
    }
}

/// One node of the block tree: the variant payload plus its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub value: BlockValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockValue {
    /// Contains **inlines**.
    Paragraph(NodeParagraph),

    /// An ATX heading, levels 1 to 6. Contains **inlines**.
    Heading(NodeHeading),

    /// A fenced or indented code block; the body is raw text.
    CodeBlock(NodeCodeBlock),

    /// A thematic break. The raw line is kept for byte-exact re-emission.
    ThematicBreak(NodeThematicBreak),

    /// Contains other **blocks**.
    BlockQuote(NodeBlockQuote),

    /// A bullet or ordered list of items.
    List(NodeList),

    /// Raw HTML lines, neither parsed nor escaped.
    HtmlBlock(NodeHtmlBlock),

    /// A GFM table: header row, per-column alignments, body rows.
    Table(NodeTable),

    /// A link reference definition; also recorded in the document's
    /// [`RefMap`].
    LinkRefDef(NodeLinkRefDef),

    /// A GFM footnote definition. Contains other **blocks**.
    FootnoteDefinition(NodeFootnoteDefinition),

    /// A run of blank lines, preserved so serialization is lossless.
    BlankLines(usize),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeParagraph {
    pub children: Vec<Inline>,
    #[doc(hidden)]
    pub content: String,
    #[doc(hidden)]
    pub line_offsets: Vec<LineOffset>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeHeading {
    /// 1 to 6.
    pub level: u32,
    pub children: Vec<Inline>,
    #[doc(hidden)]
    pub content: String,
    #[doc(hidden)]
    pub line_offsets: Vec<LineOffset>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeCodeBlock {
    /// Whether the block is fenced; indented otherwise.
    pub fenced: bool,

    /// For fenced blocks, `` ` `` or `~`.
    pub fence_char: u8,

    /// For fenced blocks, the opening fence length (>= 3).
    pub fence_length: usize,

    /// Columns of indentation before the opening fence.
    pub fence_offset: usize,

    /// Length of the closing fence, or `None` when the block ran to the
    /// end of its region unclosed (no fence is invented on output).
    pub close_fence_length: Option<usize>,

    /// The info string exactly as written after the opening fence.
    pub info: String,

    /// The literal body, newline-terminated lines, verbatim.
    pub literal: String,
}

impl NodeCodeBlock {
    /// First word of the info string, the conventional language tag.
    pub fn language(&self) -> Option<&str> {
        self.info.split_whitespace().next()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeThematicBreak {
    /// `-`, `*` or `_`.
    pub marker: u8,
    /// The raw line without its terminator.
    pub literal: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeBlockQuote {
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeList {
    pub list_type: ListType,

    /// For bullet lists, the marker character (`-`, `+` or `*`).
    pub bullet_char: u8,

    /// For ordered lists, the ordinal the list starts at.
    pub start: usize,

    /// For ordered lists, the delimiter after each number.
    pub delimiter: ListDelimType,

    /// Whether the list is tight (no blank separation between or inside
    /// items).
    pub tight: bool,

    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListType {
    #[default]
    Bullet,
    Ordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListDelimType {
    /// A period character `.`.
    #[default]
    Period,
    /// A paren character `)`.
    Paren,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub span: Span,

    /// Columns of indentation before the marker.
    pub marker_offset: usize,

    /// Columns from the marker start to the item content; continuation
    /// lines are indented by `marker_offset + padding`.
    pub padding: usize,

    /// For ordered items, the ordinal exactly as written (so `1. 1. 1.`
    /// round-trips); 0 for bullet items.
    pub ordinal: usize,

    /// Task-list state: `None` for a plain item, otherwise the character
    /// between the brackets as written (`' '`, `'x'`, `'X'`).
    pub task: Option<char>,

    pub children: Vec<Block>,
}

impl ListItem {
    /// The task-list flag as a tri-state: `None` for a plain item,
    /// `Some(false)` unchecked, `Some(true)` checked.
    pub fn task_checked(&self) -> Option<bool> {
        self.task.map(|c| c != ' ')
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeHtmlBlock {
    /// CommonMark HTML block type 1 through 7; decides the end condition.
    pub block_type: u8,
    /// The literal lines, verbatim, newline-terminated.
    pub literal: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeTable {
    pub alignments: Vec<TableAlignment>,
    pub header: TableRow,
    /// The delimiter row exactly as written.
    pub delimiter_literal: String,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAlignment {
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub span: Span,
    /// The raw row line; serialization emits this, cells are for readers.
    pub literal: String,
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub span: Span,
    pub children: Vec<Inline>,
    #[doc(hidden)]
    pub content: String,
    #[doc(hidden)]
    pub line_offsets: Vec<LineOffset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLinkRefDef {
    /// The label as written, without the surrounding brackets.
    pub label: String,
    /// The destination as written (including `<...>` when present).
    pub dest: String,
    /// The title as written, without its quotes.
    pub title: Option<String>,
    /// The opening title quote: `"`, `'` or `(`.
    pub title_quote: Option<u8>,
    /// The raw definition line; serialization emits this.
    pub literal: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeFootnoteDefinition {
    /// The label as written, without `[^` and `]`.
    pub label: String,
    pub children: Vec<Block>,
}

/// One node of the inline tree: the variant payload plus its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Inline {
    pub value: InlineValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InlineValue {
    /// Literal content. Backslash-escape sequences are kept verbatim; a
    /// renderer unescapes, the serializer does not have to.
    Text(String),

    /// A code span.
    Code(NodeCode),

    /// Raw inline HTML.
    HtmlInline(String),

    /// Emphasis; the marker records `*` vs `_`.
    Emph(NodeEmph),

    /// Strong emphasis; the marker records `*` vs `_`.
    Strong(NodeEmph),

    /// GFM `~~...~~`.
    Strikethrough(Vec<Inline>),

    /// An inline link `[text](dest "title")`.
    Link(NodeLink),

    /// An inline image `![alt](dest "title")`; the children are the alt
    /// text.
    Image(NodeLink),

    /// A reference link in any of its three bracket forms.
    RefLink(NodeRefLink),

    /// A reference image.
    RefImage(NodeRefLink),

    /// `<scheme:...>` or `<user@host>`.
    Autolink(NodeAutolink),

    /// A GFM footnote reference `[^label]`.
    FootnoteReference(String),

    /// A bare newline inside a paragraph.
    SoftBreak,

    /// A hard line break, in its original spelling.
    HardBreak(HardBreakStyle),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeCode {
    /// Backtick count of the delimiter runs.
    pub num_ticks: usize,
    /// Whether one space of padding was trimmed from each end.
    pub padded: bool,
    pub literal: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeEmph {
    /// `*` or `_`.
    pub marker: u8,
    pub children: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeLink {
    pub children: Vec<Inline>,
    /// The destination as written, without a `<...>` wrapper.
    pub url: String,
    /// Whether the destination was written `<...>`.
    pub pointy: bool,
    pub title: Option<NodeTitle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeTitle {
    /// The title text as written, without its quotes.
    pub text: String,
    /// The opening quote: `"`, `'` or `(`.
    pub quote: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRefLink {
    pub children: Vec<Inline>,
    /// The label used for lookup, as written.
    pub label: String,
    pub style: RefStyle,
}

/// Which bracket form a reference link was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefStyle {
    /// `[text][label]`
    Full,
    /// `[label][]`
    Collapsed,
    /// `[label]`
    Shortcut,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeAutolink {
    /// The text between the angle brackets, as written.
    pub url: String,
    /// Whether this is a bare e-mail autolink.
    pub email: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardBreakStyle {
    /// A backslash immediately before the newline.
    Backslash,
    /// Two trailing spaces before the newline.
    TwoSpace,
}

impl BlockValue {
    /// Whether this node's children are inlines (as opposed to blocks or
    /// raw text).
    pub fn contains_inlines(&self) -> bool {
        matches!(self, BlockValue::Paragraph(..) | BlockValue::Heading(..))
    }

    /// Whether this node contains other blocks.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            BlockValue::BlockQuote(..) | BlockValue::List(..) | BlockValue::FootnoteDefinition(..)
        )
    }
}

impl Block {
    /// Direct child blocks of a container; empty for leaves. List items
    /// expose their children through [`NodeList::items`].
    pub fn children(&self) -> &[Block] {
        match self.value {
            BlockValue::BlockQuote(ref q) => &q.children,
            BlockValue::FootnoteDefinition(ref d) => &d.children,
            _ => &[],
        }
    }

    /// Shifts this block's span, and every descendant span, by `delta`
    /// code points. Used to rebase reused blocks after an incremental
    /// splice.
    pub(crate) fn shift(&mut self, delta: isize) {
        self.span.shift(delta);
        match self.value {
            BlockValue::Paragraph(ref mut p) => shift_inlines(&mut p.children, delta),
            BlockValue::Heading(ref mut h) => shift_inlines(&mut h.children, delta),
            BlockValue::BlockQuote(ref mut q) => {
                for child in &mut q.children {
                    child.shift(delta);
                }
            }
            BlockValue::List(ref mut l) => {
                for item in &mut l.items {
                    item.span.shift(delta);
                    for child in &mut item.children {
                        child.shift(delta);
                    }
                }
            }
            BlockValue::FootnoteDefinition(ref mut d) => {
                for child in &mut d.children {
                    child.shift(delta);
                }
            }
            BlockValue::Table(ref mut t) => {
                shift_row(&mut t.header, delta);
                for row in &mut t.rows {
                    shift_row(row, delta);
                }
            }
            BlockValue::CodeBlock(..)
            | BlockValue::ThematicBreak(..)
            | BlockValue::HtmlBlock(..)
            | BlockValue::LinkRefDef(..)
            | BlockValue::BlankLines(..) => {}
        }
    }
}

fn shift_row(row: &mut TableRow, delta: isize) {
    row.span.shift(delta);
    for cell in &mut row.cells {
        cell.span.shift(delta);
        shift_inlines(&mut cell.children, delta);
    }
}

fn shift_inlines(inlines: &mut [Inline], delta: isize) {
    for inline in inlines {
        inline.span.shift(delta);
        match inline.value {
            InlineValue::Emph(ref mut e) | InlineValue::Strong(ref mut e) => {
                shift_inlines(&mut e.children, delta)
            }
            InlineValue::Strikethrough(ref mut children) => shift_inlines(children, delta),
            InlineValue::Link(ref mut l) | InlineValue::Image(ref mut l) => {
                shift_inlines(&mut l.children, delta)
            }
            InlineValue::RefLink(ref mut r) | InlineValue::RefImage(ref mut r) => {
                shift_inlines(&mut r.children, delta)
            }
            InlineValue::Text(..)
            | InlineValue::Code(..)
            | InlineValue::HtmlInline(..)
            | InlineValue::Autolink(..)
            | InlineValue::FootnoteReference(..)
            | InlineValue::SoftBreak
            | InlineValue::HardBreak(..) => {}
        }
    }
}
