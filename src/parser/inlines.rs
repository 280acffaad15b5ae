//! The inline parser.
//!
//! Converts the raw text of one text-bearing block into inline nodes in a
//! single left-to-right pass. Recognizers are tried in a fixed priority
//! order; `*`/`_`/`~` runs are emitted as provisional text plus delimiter
//! records and resolved afterwards by [`emphasis::process_emphasis`].
//!
//! Positions produced here are offsets into the accumulated block content;
//! they are translated back to source code points through the block's
//! [`LineOffset`] table as a final step.

use rustc_hash::FxHashMap;

use crate::nodes::{
    HardBreakStyle, Inline, InlineValue, LineOffset, NodeAutolink, NodeCode, NodeLink,
    NodeRefLink, NodeTitle, RefStyle, Span,
};
use crate::parser::emphasis::{self, Delim};
use crate::parser::Options;
use crate::strings;

const MAX_LINK_LABEL_LENGTH: usize = 1000;

/// Schemes accepted inside `<...>` autolinks.
const AUTOLINK_SCHEMES: [&str; 8] = [
    "http", "https", "ftp", "ftps", "mailto", "xmpp", "irc", "ircs",
];

/// The document-wide mapping from normalized reference labels to link
/// destinations and titles. Populated during block parsing, read-only
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefMap {
    pub map: FxHashMap<String, ResolvedReference>,
}

/// A successfully resolved reference, with cleaned destination and title.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReference {
    pub url: String,
    pub title: String,
}

impl RefMap {
    pub fn new() -> Self {
        RefMap::default()
    }

    pub fn lookup(&self, normalized: &str) -> Option<&ResolvedReference> {
        self.map.get(normalized)
    }

    /// First definition wins; later duplicates are kept in the CST but do
    /// not resolve.
    pub(crate) fn insert(&mut self, normalized: String, resolved: ResolvedReference) {
        self.map.entry(normalized).or_insert(resolved);
    }
}

/// Parses the accumulated content of one block leaf into inline nodes with
/// source-mapped spans.
pub(crate) fn parse_inlines(
    content: &str,
    line_offsets: &[LineOffset],
    refmap: &RefMap,
    options: &Options,
) -> Vec<Inline> {
    let chars: Vec<char> = content.chars().collect();
    let len = chars.len();
    let mut subject = Subject {
        chars: &chars,
        refmap,
        options,
        pos: 0,
    };
    let mut nodes = subject.parse_range(0, len);
    map_spans(&mut nodes, line_offsets);
    nodes
}

fn source_pos(map: &[LineOffset], pos: usize) -> usize {
    match map.binary_search_by(|e| e.content_pos.cmp(&pos)) {
        Ok(i) => map[i].source_pos,
        Err(0) => pos,
        Err(i) => {
            let e = map[i - 1];
            e.source_pos + (pos - e.content_pos)
        }
    }
}

fn map_spans(nodes: &mut [Inline], map: &[LineOffset]) {
    for node in nodes {
        node.span = Span::new(source_pos(map, node.span.from), source_pos(map, node.span.to));
        match node.value {
            InlineValue::Emph(ref mut e) | InlineValue::Strong(ref mut e) => {
                map_spans(&mut e.children, map)
            }
            InlineValue::Strikethrough(ref mut children) => map_spans(children, map),
            InlineValue::Link(ref mut l) | InlineValue::Image(ref mut l) => {
                map_spans(&mut l.children, map)
            }
            InlineValue::RefLink(ref mut r) | InlineValue::RefImage(ref mut r) => {
                map_spans(&mut r.children, map)
            }
            _ => {}
        }
    }
}

fn contains_link(nodes: &[Inline]) -> bool {
    nodes.iter().any(|node| match node.value {
        InlineValue::Link(..) | InlineValue::RefLink(..) | InlineValue::Autolink(..) => true,
        InlineValue::Emph(ref e) | InlineValue::Strong(ref e) => contains_link(&e.children),
        InlineValue::Strikethrough(ref children) => contains_link(children),
        InlineValue::Image(ref l) => contains_link(&l.children),
        InlineValue::RefImage(ref r) => contains_link(&r.children),
        _ => false,
    })
}

struct Subject<'i, 'r, 'o> {
    chars: &'i [char],
    refmap: &'r RefMap,
    options: &'o Options,
    pos: usize,
}

// Accumulates scanned nodes. Every node gets its own slot so the emphasis
// pass can address delimiter runs by index; plain text is coalesced on the
// way in and once more after emphasis resolution.
struct Out {
    slots: Vec<Vec<Inline>>,
    delims: Vec<Delim>,
    last_delim: Option<usize>,
    last_plain: bool,
}

impl Out {
    fn new() -> Self {
        Out {
            slots: vec![],
            delims: vec![],
            last_delim: None,
            last_plain: false,
        }
    }

    fn push_node(&mut self, inline: Inline) {
        self.slots.push(vec![inline]);
        self.last_plain = false;
    }

    fn push_text(&mut self, text: String, span: Span) {
        if self.last_plain {
            let last = self.slots.last_mut().unwrap().last_mut().unwrap();
            if last.span.to == span.from {
                if let InlineValue::Text(ref mut t) = last.value {
                    t.push_str(&text);
                    last.span.to = span.to;
                    return;
                }
            }
        }
        self.slots.push(vec![Inline {
            value: InlineValue::Text(text),
            span,
        }]);
        self.last_plain = true;
    }

    fn push_delim(&mut self, ch: char, length: usize, can_open: bool, can_close: bool) {
        let slot = self.slots.len() - 1;
        let ix = self.delims.len();
        self.delims.push(Delim {
            slot,
            ch,
            length,
            can_open,
            can_close,
            prev: self.last_delim,
            next: None,
        });
        if let Some(last) = self.last_delim {
            self.delims[last].next = Some(ix);
        }
        self.last_delim = Some(ix);
    }
}

impl<'i, 'r, 'o> Subject<'i, 'r, 'o> {
    fn gfm(&self) -> bool {
        self.options.parse.gfm
    }

    fn peek(&self, at: usize, limit: usize) -> Option<char> {
        if at < limit {
            Some(self.chars[at])
        } else {
            None
        }
    }

    fn is_special(&self, c: char) -> bool {
        match c {
            '\n' | '\\' | '`' | '<' | '[' | '!' | '*' | '_' => true,
            '~' => self.gfm(),
            _ => false,
        }
    }

    /// Parses `[from, to)` into a finished inline sequence. Reentrant:
    /// link text is parsed through a nested call.
    fn parse_range(&mut self, from: usize, to: usize) -> Vec<Inline> {
        let saved = self.pos;
        let mut out = Out::new();
        self.pos = from;

        while self.pos < to {
            let c = self.chars[self.pos];
            match c {
                '\n' => self.handle_newline(&mut out),
                '\\' => self.handle_backslash(to, &mut out),
                '`' => self.handle_backticks(to, &mut out),
                '<' => self.handle_pointy_brace(to, &mut out),
                '[' => self.handle_bracket(false, to, &mut out),
                '!' if self.peek(self.pos + 1, to) == Some('[') => {
                    self.handle_bracket(true, to, &mut out)
                }
                '*' | '_' => self.handle_delim(c, to, &mut out),
                '~' if self.gfm() => self.handle_delim(c, to, &mut out),
                _ => {
                    let start = self.pos;
                    while self.pos < to && !self.is_special(self.chars[self.pos]) {
                        self.pos += 1;
                    }
                    // a '!' not followed by '[' is plain text
                    if self.pos < to
                        && self.chars[self.pos] == '!'
                        && self.peek(self.pos + 1, to) != Some('[')
                    {
                        self.pos += 1;
                    }
                    let text: String = self.chars[start..self.pos].iter().collect();
                    out.push_text(text, Span::new(start, self.pos));
                }
            }
        }

        emphasis::process_emphasis(&mut out.slots, &mut out.delims, self.options.parse.strict);

        let mut nodes: Vec<Inline> = Vec::new();
        for slot in out.slots {
            for node in slot {
                emphasis::push_coalesced(&mut nodes, node);
            }
        }

        self.pos = saved;
        nodes
    }

    fn handle_newline(&mut self, out: &mut Out) {
        let nl = self.pos;
        let mut style = None;
        if out.last_plain {
            let last = out.slots.last_mut().unwrap().last_mut().unwrap();
            if let InlineValue::Text(ref mut t) = last.value {
                if t.ends_with("  ") {
                    t.truncate(t.len() - 2);
                    last.span.to -= 2;
                    style = Some(HardBreakStyle::TwoSpace);
                    if t.is_empty() {
                        out.slots.pop();
                        out.last_plain = false;
                    }
                }
            }
        }
        self.pos = nl + 1;
        match style {
            Some(style) => out.push_node(Inline {
                value: InlineValue::HardBreak(style),
                span: Span::new(nl - 2, nl + 1),
            }),
            None => out.push_node(Inline {
                value: InlineValue::SoftBreak,
                span: Span::new(nl, nl + 1),
            }),
        }
    }

    fn handle_backslash(&mut self, to: usize, out: &mut Out) {
        let start = self.pos;
        match self.peek(start + 1, to) {
            Some('\n') => {
                self.pos = start + 2;
                out.push_node(Inline {
                    value: InlineValue::HardBreak(HardBreakStyle::Backslash),
                    span: Span::new(start, start + 2),
                });
            }
            Some(c) if c.is_ascii_punctuation() => {
                self.pos = start + 2;
                let mut text = String::with_capacity(2);
                text.push('\\');
                text.push(c);
                out.push_text(text, Span::new(start, start + 2));
            }
            _ => {
                self.pos = start + 1;
                out.push_text("\\".to_string(), Span::new(start, start + 1));
            }
        }
    }

    fn handle_backticks(&mut self, to: usize, out: &mut Out) {
        let start = self.pos;
        let mut open = 0;
        while self.peek(start + open, to) == Some('`') {
            open += 1;
        }

        let mut i = start + open;
        let mut close = None;
        while i < to {
            match self.chars[i] {
                '`' => {
                    let mut run = 0;
                    while i + run < to && self.chars[i + run] == '`' {
                        run += 1;
                    }
                    if run == open {
                        close = Some(i);
                        break;
                    }
                    i += run;
                }
                // code spans in this subset do not cross lines
                '\n' => break,
                _ => i += 1,
            }
        }

        match close {
            Some(cs) => {
                let inner = &self.chars[start + open..cs];
                let all_space = inner.iter().all(|&c| c == ' ');
                let padded = inner.len() >= 2
                    && inner[0] == ' '
                    && inner[inner.len() - 1] == ' '
                    && !all_space;
                let literal: String = if padded {
                    inner[1..inner.len() - 1].iter().collect()
                } else {
                    inner.iter().collect()
                };
                self.pos = cs + open;
                out.push_node(Inline {
                    value: InlineValue::Code(NodeCode {
                        num_ticks: open,
                        padded,
                        literal,
                    }),
                    span: Span::new(start, cs + open),
                });
            }
            None => {
                self.pos = start + open;
                out.push_text("`".repeat(open), Span::new(start, start + open));
            }
        }
    }

    fn handle_pointy_brace(&mut self, to: usize, out: &mut Out) {
        let start = self.pos;

        if let Some((url, email, end)) = self.scan_autolink(start, to) {
            self.pos = end;
            out.push_node(Inline {
                value: InlineValue::Autolink(NodeAutolink { url, email }),
                span: Span::new(start, end),
            });
            return;
        }

        if let Some(end) = self.scan_html_tag(start, to) {
            let raw: String = self.chars[start..end].iter().collect();
            self.pos = end;
            out.push_node(Inline {
                value: InlineValue::HtmlInline(raw),
                span: Span::new(start, end),
            });
            return;
        }

        self.pos = start + 1;
        out.push_text("<".to_string(), Span::new(start, start + 1));
    }

    fn scan_autolink(&self, start: usize, to: usize) -> Option<(String, bool, usize)> {
        // URI form: <scheme:...>
        let mut i = start + 1;
        if self.peek(i, to).map_or(false, |c| c.is_ascii_alphabetic()) {
            let scheme_start = i;
            while i < to
                && i - scheme_start < 32
                && self
                    .chars
                    .get(i)
                    .map_or(false, |&c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
            {
                i += 1;
            }
            if self.peek(i, to) == Some(':') {
                let scheme: String = self.chars[scheme_start..i].iter().collect();
                if AUTOLINK_SCHEMES
                    .iter()
                    .any(|s| scheme.eq_ignore_ascii_case(s))
                {
                    let mut j = i + 1;
                    while j < to && !matches!(self.chars[j], '>' | '<') && !self.chars[j].is_whitespace()
                    {
                        j += 1;
                    }
                    if self.peek(j, to) == Some('>') && j > i + 1 {
                        let url: String = self.chars[start + 1..j].iter().collect();
                        return Some((url, false, j + 1));
                    }
                }
            }
        }

        // e-mail form: <local@domain>
        let mut i = start + 1;
        let local_start = i;
        while i < to
            && self.chars[i].is_ascii()
            && (self.chars[i].is_ascii_alphanumeric()
                || ".!#$%&'*+/=?^_`{|}~-".contains(self.chars[i]))
        {
            i += 1;
        }
        if i == local_start || self.peek(i, to) != Some('@') {
            return None;
        }
        i += 1;
        let mut domain_parts = 0;
        loop {
            let part_start = i;
            while i < to
                && (self.chars[i].is_ascii_alphanumeric() || self.chars[i] == '-')
            {
                i += 1;
            }
            if i == part_start {
                return None;
            }
            domain_parts += 1;
            match self.peek(i, to) {
                Some('.') => i += 1,
                Some('>') if domain_parts >= 1 => {
                    let url: String = self.chars[start + 1..i].iter().collect();
                    return Some((url, true, i + 1));
                }
                _ => return None,
            }
        }
    }

    fn scan_html_tag(&self, start: usize, to: usize) -> Option<usize> {
        debug_assert_eq!(self.chars[start], '<');

        // comment
        if self.starts_with(start, to, "<!--") {
            let mut i = start + 4;
            while i + 2 < to {
                if self.chars[i] == '-' && self.chars[i + 1] == '-' && self.chars[i + 2] == '>' {
                    return Some(i + 3);
                }
                i += 1;
            }
            return None;
        }
        // processing instruction
        if self.starts_with(start, to, "<?") {
            let mut i = start + 2;
            while i + 1 < to {
                if self.chars[i] == '?' && self.chars[i + 1] == '>' {
                    return Some(i + 2);
                }
                i += 1;
            }
            return None;
        }
        // CDATA
        if self.starts_with(start, to, "<![CDATA[") {
            let mut i = start + 9;
            while i + 2 < to {
                if self.chars[i] == ']' && self.chars[i + 1] == ']' && self.chars[i + 2] == '>' {
                    return Some(i + 3);
                }
                i += 1;
            }
            return None;
        }
        // declaration
        if self.starts_with(start, to, "<!") {
            if !self
                .peek(start + 2, to)
                .map_or(false, |c| c.is_ascii_alphabetic())
            {
                return None;
            }
            let mut i = start + 2;
            while i < to {
                if self.chars[i] == '>' {
                    return Some(i + 1);
                }
                i += 1;
            }
            return None;
        }
        // close tag
        if self.starts_with(start, to, "</") {
            let mut i = start + 2;
            i = self.scan_tag_name(i, to)?;
            while i < to && self.chars[i].is_whitespace() {
                i += 1;
            }
            return if self.peek(i, to) == Some('>') {
                Some(i + 1)
            } else {
                None
            };
        }
        // open tag
        let mut i = self.scan_tag_name(start + 1, to)?;
        loop {
            let mut j = i;
            while j < to && self.chars[j].is_whitespace() {
                j += 1;
            }
            if j == i {
                break;
            }
            match self.scan_attribute(j, to) {
                Some(next) => i = next,
                None => {
                    i = j;
                    break;
                }
            }
        }
        if self.peek(i, to) == Some('/') {
            i += 1;
        }
        if self.peek(i, to) == Some('>') {
            Some(i + 1)
        } else {
            None
        }
    }

    fn starts_with(&self, at: usize, to: usize, s: &str) -> bool {
        let mut i = at;
        for c in s.chars() {
            if i >= to || self.chars[i] != c {
                return false;
            }
            i += 1;
        }
        true
    }

    fn scan_tag_name(&self, at: usize, to: usize) -> Option<usize> {
        if !self.peek(at, to).map_or(false, |c| c.is_ascii_alphabetic()) {
            return None;
        }
        let mut i = at + 1;
        while i < to && (self.chars[i].is_ascii_alphanumeric() || self.chars[i] == '-') {
            i += 1;
        }
        Some(i)
    }

    fn scan_attribute(&self, at: usize, to: usize) -> Option<usize> {
        if !self
            .peek(at, to)
            .map_or(false, |c| c.is_ascii_alphabetic() || matches!(c, '_' | ':'))
        {
            return None;
        }
        let mut i = at + 1;
        while i < to
            && (self.chars[i].is_ascii_alphanumeric() || matches!(self.chars[i], '_' | '.' | ':' | '-'))
        {
            i += 1;
        }
        let mut j = i;
        while j < to && self.chars[j].is_whitespace() {
            j += 1;
        }
        if self.peek(j, to) != Some('=') {
            return Some(i);
        }
        j += 1;
        while j < to && self.chars[j].is_whitespace() {
            j += 1;
        }
        match self.peek(j, to) {
            Some(q) if q == '"' || q == '\'' => {
                j += 1;
                while j < to && self.chars[j] != q {
                    j += 1;
                }
                if j >= to {
                    None
                } else {
                    Some(j + 1)
                }
            }
            Some(_) => {
                let value_start = j;
                while j < to
                    && !self.chars[j].is_whitespace()
                    && !matches!(self.chars[j], '"' | '\'' | '=' | '<' | '>' | '`')
                {
                    j += 1;
                }
                if j == value_start {
                    None
                } else {
                    Some(j)
                }
            }
            None => None,
        }
    }

    fn handle_bracket(&mut self, image: bool, to: usize, out: &mut Out) {
        let start = self.pos;
        let open_len = if image { 2 } else { 1 };

        if !image && self.gfm() && self.peek(start + 1, to) == Some('^') {
            if let Some(node) = self.scan_footnote_reference(start, to) {
                self.pos = node.span.to;
                out.push_node(node);
                return;
            }
        }

        let inner_start = start + open_len;
        let close = match self.find_bracket_close(inner_start, to) {
            Some(close) => close,
            None => return self.bracket_fallback(image, out),
        };
        let after = close + 1;

        // inline form: [text](dest "title")
        if self.peek(after, to) == Some('(') {
            if let Some((url, pointy, title, end)) = self.scan_inline_link_tail(after, to) {
                let children = self.parse_range(inner_start, close);
                if image || !contains_link(&children) {
                    let link = NodeLink {
                        children,
                        url,
                        pointy,
                        title,
                    };
                    let value = if image {
                        InlineValue::Image(link)
                    } else {
                        InlineValue::Link(link)
                    };
                    self.pos = end;
                    out.push_node(Inline {
                        value,
                        span: Span::new(start, end),
                    });
                    return;
                }
                return self.bracket_fallback(image, out);
            }
        }

        // reference forms: [text][label], [label][], [label]
        let (label, style, end) = if self.peek(after, to) == Some('[') {
            match self.scan_link_label(after + 1, to) {
                Some(label_close) if label_close == after + 1 => {
                    let label: String = self.chars[inner_start..close].iter().collect();
                    (label, RefStyle::Collapsed, label_close + 1)
                }
                Some(label_close) => {
                    let label: String = self.chars[after + 1..label_close].iter().collect();
                    (label, RefStyle::Full, label_close + 1)
                }
                None => return self.bracket_fallback(image, out),
            }
        } else {
            let label: String = self.chars[inner_start..close].iter().collect();
            (label, RefStyle::Shortcut, close + 1)
        };

        let normalized = strings::normalize_label(&label);
        if normalized.is_empty() || self.refmap.lookup(&normalized).is_none() {
            return self.bracket_fallback(image, out);
        }

        let children = self.parse_range(inner_start, close);
        if !image && contains_link(&children) {
            return self.bracket_fallback(image, out);
        }

        let reflink = NodeRefLink {
            children,
            label,
            style,
        };
        let value = if image {
            InlineValue::RefImage(reflink)
        } else {
            InlineValue::RefLink(reflink)
        };
        self.pos = end;
        out.push_node(Inline {
            value,
            span: Span::new(start, end),
        });
    }

    fn bracket_fallback(&mut self, image: bool, out: &mut Out) {
        let start = self.pos;
        let opener = if image { "![" } else { "[" };
        self.pos = start + opener.len();
        out.push_text(opener.to_string(), Span::new(start, self.pos));
    }

    fn scan_footnote_reference(&self, start: usize, to: usize) -> Option<Inline> {
        let mut i = start + 2;
        while i < to && self.chars[i] != ']' && !self.chars[i].is_whitespace() {
            i += 1;
        }
        if i == start + 2 || self.peek(i, to) != Some(']') {
            return None;
        }
        let label: String = self.chars[start + 2..i].iter().collect();
        Some(Inline {
            value: InlineValue::FootnoteReference(label),
            span: Span::new(start, i + 1),
        })
    }

    /// The matching `]` for a bracket opened just before `from`, honoring
    /// backslash escapes and nested bracket pairs.
    fn find_bracket_close(&self, from: usize, to: usize) -> Option<usize> {
        let mut depth = 0;
        let mut i = from;
        while i < to && i - from <= MAX_LINK_LABEL_LENGTH {
            match self.chars[i] {
                '\\' => i += 1,
                '[' => depth += 1,
                ']' => {
                    if depth == 0 {
                        return Some(i);
                    }
                    depth -= 1;
                }
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// A reference label: no nested brackets. Returns the closing `]`.
    fn scan_link_label(&self, from: usize, to: usize) -> Option<usize> {
        let mut i = from;
        while i < to && i - from <= MAX_LINK_LABEL_LENGTH {
            match self.chars[i] {
                '\\' => i += 1,
                '[' => return None,
                ']' => return Some(i),
                _ => {}
            }
            i += 1;
        }
        None
    }

    // spaces and tabs with at most one newline
    fn spnl(&self, mut i: usize, to: usize) -> usize {
        let mut seen_newline = false;
        while i < to {
            match self.chars[i] {
                ' ' | '\t' => i += 1,
                '\n' if !seen_newline => {
                    seen_newline = true;
                    i += 1;
                }
                _ => break,
            }
        }
        i
    }

    fn scan_inline_link_tail(
        &mut self,
        open_paren: usize,
        to: usize,
    ) -> Option<(String, bool, Option<NodeTitle>, usize)> {
        let mut i = self.spnl(open_paren + 1, to);

        let (url, pointy, after_dest) = if self.peek(i, to) == Some('<') {
            let mut j = i + 1;
            while j < to && !matches!(self.chars[j], '>' | '<' | '\n') {
                if self.chars[j] == '\\' && j + 1 < to {
                    j += 1;
                }
                j += 1;
            }
            if self.peek(j, to) != Some('>') {
                return None;
            }
            let url: String = self.chars[i + 1..j].iter().collect();
            (url, true, j + 1)
        } else {
            let mut depth = 0;
            let mut j = i;
            while j < to {
                let c = self.chars[j];
                if c.is_whitespace() {
                    break;
                }
                match c {
                    '\\' if j + 1 < to => j += 1,
                    '(' => depth += 1,
                    ')' => {
                        if depth == 0 {
                            break;
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
                j += 1;
            }
            let url: String = self.chars[i..j].iter().collect();
            (url, false, j)
        };

        i = self.spnl(after_dest, to);

        let mut title = None;
        if i > after_dest {
            if let Some(quote) = self.peek(i, to).filter(|&c| matches!(c, '"' | '\'' | '(')) {
                let close = match quote {
                    '"' => '"',
                    '\'' => '\'',
                    _ => ')',
                };
                let mut j = i + 1;
                while j < to && self.chars[j] != close && self.chars[j] != '\n' {
                    if self.chars[j] == '\\' && j + 1 < to {
                        j += 1;
                    }
                    j += 1;
                }
                if self.peek(j, to) != Some(close) {
                    return None;
                }
                let text: String = self.chars[i + 1..j].iter().collect();
                title = Some(NodeTitle {
                    text,
                    quote: quote as u8,
                });
                i = self.spnl(j + 1, to);
            }
        }

        if self.peek(i, to) == Some(')') {
            Some((url, pointy, title, i + 1))
        } else {
            None
        }
    }

    fn handle_delim(&mut self, c: char, to: usize, out: &mut Out) {
        let start = self.pos;
        let mut count = 0;
        while self.peek(start + count, to) == Some(c) {
            count += 1;
        }
        self.pos = start + count;

        let text: String = std::iter::repeat(c).take(count).collect();
        let span = Span::new(start, self.pos);

        // strikethrough pairs only as a double tilde
        if c == '~' && count != 2 {
            out.push_text(text, span);
            return;
        }

        let before = if start == 0 {
            '\n'
        } else {
            self.chars[start - 1]
        };
        let after = if self.pos < self.chars.len() {
            self.chars[self.pos]
        } else {
            '\n'
        };
        let (can_open, can_close) = emphasis::classify(c, before, after);

        if !can_open && !can_close {
            out.push_text(text, span);
            return;
        }
        out.push_node(Inline {
            value: InlineValue::Text(text),
            span,
        });
        out.push_delim(c, count, can_open, can_close);
    }
}
