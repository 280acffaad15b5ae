//! The lossless serializer.
//!
//! A depth-first walk that re-emits every marker, fence, info string and
//! blank-line run the parser recorded, so that without normalization
//! options the output is byte-identical to the parsed source for the
//! supported subset. Container prefixes (`> `, item padding) are carried
//! on a prefix stack and re-applied at every line start.

use std::cmp::max;
use std::io::{self, Write};

use crate::nodes::{
    Block, BlockValue, Document, HardBreakStyle, Inline, InlineValue, ListItem, ListType,
    NodeCodeBlock, NodeList, NodeTitle,
};
use crate::parser::{FenceCharStyle, ListStyleType, Options, TitleQuoteStyle};

/// Serializes a [`Document`], modified by the given options.
pub fn format_document(
    doc: &Document,
    options: &Options,
    output: &mut dyn Write,
) -> io::Result<()> {
    let mut f = CommonMarkSerializer::new(options);
    f.format(doc);
    output.write_all(f.v.as_bytes())
}

struct CommonMarkSerializer<'o> {
    options: &'o Options,
    v: String,
    prefix: String,
    begin_line: bool,
}

impl<'o> CommonMarkSerializer<'o> {
    fn new(options: &'o Options) -> Self {
        CommonMarkSerializer {
            options,
            v: String::new(),
            prefix: String::new(),
            begin_line: true,
        }
    }

    fn write_str(&mut self, s: &str) {
        for ch in s.chars() {
            if ch == '\n' {
                self.v.push('\n');
                self.begin_line = true;
            } else {
                if self.begin_line {
                    self.v.push_str(&self.prefix);
                    self.begin_line = false;
                }
                self.v.push(ch);
            }
        }
    }

    fn line_end(&mut self) {
        self.v.push('\n');
        self.begin_line = true;
    }

    // A blank line carries the prefix without its trailing whitespace, so
    // blank lines inside a quote come out as `>` and plain ones stay empty.
    fn blank_line(&mut self) {
        if self.begin_line {
            let trimmed = self.prefix.trim_end();
            self.v.push_str(trimmed);
        }
        self.line_end();
    }

    fn format(&mut self, doc: &Document) {
        if doc.bom {
            self.v.push('\u{feff}');
        }
        self.format_blocks(&doc.blocks);
        if !doc.final_newline && self.v.ends_with('\n') {
            self.v.pop();
        }
    }

    fn format_blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            match &block.value {
                BlockValue::Paragraph(p) => {
                    self.format_inlines(&p.children);
                    self.line_end();
                }
                BlockValue::Heading(h) => {
                    for _ in 0..h.level {
                        self.write_str("#");
                    }
                    if !h.children.is_empty() {
                        self.write_str(" ");
                        self.format_inlines(&h.children);
                    }
                    self.line_end();
                }
                BlockValue::CodeBlock(cb) => self.format_code_block(cb),
                BlockValue::ThematicBreak(tb) => {
                    self.write_str(&tb.literal);
                    self.line_end();
                }
                BlockValue::BlockQuote(q) => {
                    self.write_str("> ");
                    let saved = self.prefix.len();
                    self.prefix.push_str("> ");
                    self.format_blocks(&q.children);
                    self.prefix.truncate(saved);
                }
                BlockValue::List(l) => self.format_list(l),
                BlockValue::HtmlBlock(hb) => {
                    self.write_str(&hb.literal);
                }
                BlockValue::Table(t) => {
                    self.write_str(&t.header.literal);
                    self.line_end();
                    self.write_str(&t.delimiter_literal);
                    self.line_end();
                    for row in &t.rows {
                        self.write_str(&row.literal);
                        self.line_end();
                    }
                }
                BlockValue::LinkRefDef(def) => {
                    self.write_str(&def.literal);
                    self.line_end();
                }
                BlockValue::FootnoteDefinition(d) => {
                    let saved = self.prefix.len();
                    if d.children.is_empty() {
                        self.write_str(&format!("[^{}]:", d.label));
                        self.line_end();
                    } else {
                        self.write_str(&format!("[^{}]: ", d.label));
                        self.prefix.push_str("    ");
                        self.format_blocks(&d.children);
                        self.prefix.truncate(saved);
                    }
                }
                BlockValue::BlankLines(count) => {
                    for _ in 0..*count {
                        self.blank_line();
                    }
                }
            }
        }
    }

    fn fence_char(&self, cb: &NodeCodeBlock) -> (u8, usize) {
        let desired = match self.options.serialize.fence_char {
            Some(FenceCharStyle::Backtick) => Some(b'`'),
            Some(FenceCharStyle::Tilde) => Some(b'~'),
            None if self.options.serialize.normalize => Some(b'`'),
            None => None,
        };
        match desired {
            None => (cb.fence_char, cb.fence_length),
            Some(mut ch) => {
                if ch == b'`' && cb.info.contains('`') {
                    ch = b'~';
                }
                let length = if ch == cb.fence_char {
                    cb.fence_length
                } else {
                    max(3, longest_char_sequence(&cb.literal, ch as char) + 1)
                };
                (ch, length)
            }
        }
    }

    fn format_code_block(&mut self, cb: &NodeCodeBlock) {
        if cb.fenced {
            let (ch, length) = self.fence_char(cb);
            let fence: String = std::iter::repeat(ch as char).take(length).collect();
            for _ in 0..cb.fence_offset {
                self.write_str(" ");
            }
            self.write_str(&fence);
            self.write_str(&cb.info);
            self.line_end();
            self.write_str(&cb.literal);
            let close = if self.options.serialize.normalize || self.options.serialize.fence_char.is_some()
            {
                Some(length)
            } else {
                cb.close_fence_length
            };
            if let Some(n) = close {
                let fence: String = std::iter::repeat(ch as char).take(n).collect();
                self.write_str(&fence);
                self.line_end();
            }
        } else {
            if !self.begin_line {
                self.v.push_str("    ");
            }
            let saved = self.prefix.len();
            self.prefix.push_str("    ");
            self.write_str(&cb.literal);
            self.prefix.truncate(saved);
        }
    }

    fn format_list(&mut self, list: &NodeList) {
        for item in &list.items {
            self.format_item(list, item);
        }
    }

    fn bullet_char(&self, list: &NodeList) -> u8 {
        match self.options.serialize.list_style {
            Some(style) => style as u8,
            None if self.options.serialize.normalize => ListStyleType::Dash as u8,
            None => list.bullet_char,
        }
    }

    fn format_item(&mut self, list: &NodeList, item: &ListItem) {
        let marker = match list.list_type {
            ListType::Bullet => (self.bullet_char(list) as char).to_string(),
            ListType::Ordered => format!(
                "{}{}",
                item.ordinal,
                match list.delimiter {
                    crate::nodes::ListDelimType::Period => '.',
                    crate::nodes::ListDelimType::Paren => ')',
                }
            ),
        };

        let mut head = " ".repeat(item.marker_offset);
        head.push_str(&marker);
        for _ in 0..item.padding.saturating_sub(marker.chars().count()) {
            head.push(' ');
        }
        self.write_str(&head);
        if let Some(symbol) = item.task {
            self.write_str(&format!("[{}] ", symbol));
        }

        let saved = self.prefix.len();
        for _ in 0..item.marker_offset + item.padding {
            self.prefix.push(' ');
        }
        if item.children.is_empty() {
            self.line_end();
        } else {
            self.format_blocks(&item.children);
        }
        self.prefix.truncate(saved);
    }

    fn title_quotes(&self, title: &NodeTitle) -> (char, char) {
        let style = match self.options.serialize.title_quote {
            Some(style) => Some(style),
            None if self.options.serialize.normalize => Some(TitleQuoteStyle::Double),
            None => None,
        };
        match style {
            Some(TitleQuoteStyle::Double) => ('"', '"'),
            Some(TitleQuoteStyle::Single) => ('\'', '\''),
            Some(TitleQuoteStyle::Paren) => ('(', ')'),
            None => match title.quote {
                b'\'' => ('\'', '\''),
                b'(' => ('(', ')'),
                _ => ('"', '"'),
            },
        }
    }

    fn format_link_tail(&mut self, url: &str, pointy: bool, title: &Option<NodeTitle>) {
        self.write_str("](");
        if pointy {
            self.write_str("<");
            self.write_str(url);
            self.write_str(">");
        } else {
            self.write_str(url);
        }
        if let Some(title) = title {
            let (open, close) = self.title_quotes(title);
            self.write_str(" ");
            self.write_str(&open.to_string());
            self.write_str(&title.text);
            self.write_str(&close.to_string());
        }
        self.write_str(")");
    }

    fn hard_break(&mut self, style: HardBreakStyle) {
        let effective = self
            .options
            .serialize
            .hardbreak
            .unwrap_or(if self.options.serialize.normalize {
                HardBreakStyle::Backslash
            } else {
                style
            });
        match effective {
            HardBreakStyle::Backslash => self.write_str("\\\n"),
            HardBreakStyle::TwoSpace => self.write_str("  \n"),
        }
    }

    fn format_inlines(&mut self, nodes: &[Inline]) {
        for node in nodes {
            match &node.value {
                InlineValue::Text(t) => self.write_str(t),
                InlineValue::Code(code) => {
                    let ticks = "`".repeat(code.num_ticks);
                    self.write_str(&ticks);
                    if code.padded {
                        self.write_str(" ");
                    }
                    self.write_str(&code.literal);
                    if code.padded {
                        self.write_str(" ");
                    }
                    self.write_str(&ticks);
                }
                InlineValue::HtmlInline(raw) => self.write_str(raw),
                InlineValue::Emph(e) => {
                    let marker = (e.marker as char).to_string();
                    self.write_str(&marker);
                    self.format_inlines(&e.children);
                    self.write_str(&marker);
                }
                InlineValue::Strong(e) => {
                    let marker = (e.marker as char).to_string().repeat(2);
                    self.write_str(&marker);
                    self.format_inlines(&e.children);
                    self.write_str(&marker);
                }
                InlineValue::Strikethrough(children) => {
                    self.write_str("~~");
                    self.format_inlines(children);
                    self.write_str("~~");
                }
                InlineValue::Link(l) => {
                    self.write_str("[");
                    self.format_inlines(&l.children);
                    self.format_link_tail(&l.url, l.pointy, &l.title);
                }
                InlineValue::Image(l) => {
                    self.write_str("![");
                    self.format_inlines(&l.children);
                    self.format_link_tail(&l.url, l.pointy, &l.title);
                }
                InlineValue::RefLink(r) | InlineValue::RefImage(r) => {
                    if matches!(node.value, InlineValue::RefImage(..)) {
                        self.write_str("![");
                    } else {
                        self.write_str("[");
                    }
                    self.format_inlines(&r.children);
                    self.write_str("]");
                    match r.style {
                        crate::nodes::RefStyle::Full => {
                            self.write_str(&format!("[{}]", r.label));
                        }
                        crate::nodes::RefStyle::Collapsed => self.write_str("[]"),
                        crate::nodes::RefStyle::Shortcut => {}
                    }
                }
                InlineValue::Autolink(a) => {
                    self.write_str("<");
                    self.write_str(&a.url);
                    self.write_str(">");
                }
                InlineValue::FootnoteReference(label) => {
                    self.write_str(&format!("[^{}]", label));
                }
                InlineValue::SoftBreak => self.write_str("\n"),
                InlineValue::HardBreak(style) => self.hard_break(*style),
            }
        }
    }
}

fn longest_char_sequence(literal: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in literal.chars() {
        if c == ch {
            current += 1;
            longest = max(longest, current);
        } else {
            current = 0;
        }
    }
    longest
}
