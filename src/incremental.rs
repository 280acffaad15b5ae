//! The incremental repair engine.
//!
//! An edit is localized to the smallest top-level block range that could
//! be affected, that range is re-parsed against the new source, and the
//! result is spliced between the untouched prefix and the span-rebased
//! suffix. Whenever reuse cannot be shown safe, the engine silently falls
//! back to a full parse; correctness is preferred over reuse.

use log::{debug, trace};

use crate::nodes::{Block, BlockValue, Document, NodeHtmlBlock, Span};
use crate::parser::inlines::{RefMap, ResolvedReference};
use crate::parser::{self, parse_document, Options};
use crate::scanner::Scanner;
use crate::scanners;
use crate::strings;

/// One contiguous source change, in code-point units.
///
/// `start <= old_end` bound the replaced range of the old source;
/// `new_end` is the end of the replacement in the new source, so
/// `new_end - old_end` is the length delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditInfo {
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
}

impl EditInfo {
    /// An insertion of `new_len` code points at `pos`.
    pub fn insert(pos: usize, new_len: usize) -> EditInfo {
        EditInfo {
            start: pos,
            old_end: pos,
            new_end: pos + new_len,
        }
    }

    /// A deletion of the range `[start, end)`.
    pub fn delete(start: usize, end: usize) -> EditInfo {
        EditInfo {
            start,
            old_end: end,
            new_end: start,
        }
    }

    /// A replacement of `[start, old_end)` by `new_len` code points.
    pub fn replace(start: usize, old_end: usize, new_len: usize) -> EditInfo {
        EditInfo {
            start,
            old_end,
            new_end: start + new_len,
        }
    }

    pub fn delta(&self) -> isize {
        self.new_end as isize - self.old_end as isize
    }
}

/// Re-parses only the blocks affected by `edit` and reuses the rest of
/// `old_doc` with rebased spans. The result equals `parse_document(new_source)`
/// structurally; `old_doc` is not touched.
///
/// # Panics
///
/// Panics when `edit` is inconsistent with the two sources, which is a
/// programmer error: `start > old_end`, an end beyond its source, or a
/// length delta that does not match.
pub fn parse_incremental(
    old_doc: &Document,
    old_source: &str,
    new_source: &str,
    edit: &EditInfo,
    options: &Options,
) -> Document {
    let old_len = Scanner::new(old_source).len();
    let new_scanner = Scanner::new(new_source);
    let new_len = new_scanner.len();

    assert!(edit.start <= edit.old_end, "EditInfo: start > old_end");
    assert!(
        edit.old_end <= old_len,
        "EditInfo: old_end beyond old source"
    );
    assert!(
        edit.new_end <= new_len,
        "EditInfo: new_end beyond new source"
    );
    assert_eq!(
        new_len as isize,
        old_len as isize + edit.delta(),
        "EditInfo: source lengths inconsistent with edit"
    );

    match try_splice(old_doc, new_source, &new_scanner, new_len, edit, options) {
        Some(doc) => doc,
        None => parse_document(new_source, options),
    }
}

fn is_blank(block: &Block) -> bool {
    matches!(block.value, BlockValue::BlankLines(..))
}

fn last_non_blank(blocks: &[Block]) -> Option<&Block> {
    blocks.iter().rev().find(|b| !is_blank(b))
}

fn first_non_blank(blocks: &[Block]) -> Option<&Block> {
    blocks.iter().find(|b| !is_blank(b))
}

fn is_indented_code(block: &Block) -> bool {
    matches!(&block.value, BlockValue::CodeBlock(cb) if !cb.fenced)
}

// Whether an HTML block saw its own end condition (types 1-5); type 6/7
// blocks end at a blank line instead and are never self-closed.
fn html_block_closed(hb: &NodeHtmlBlock) -> bool {
    (1..=5).contains(&hb.block_type)
        && hb
            .literal
            .lines()
            .last()
            .map_or(false, |l| scanners::html_block_end(hb.block_type, l))
}

// A block whose extent cannot change no matter what follows it.
fn self_terminated(block: &Block) -> bool {
    match &block.value {
        BlockValue::BlankLines(..)
        | BlockValue::Heading(..)
        | BlockValue::ThematicBreak(..)
        | BlockValue::LinkRefDef(..) => true,
        BlockValue::CodeBlock(cb) => !cb.fenced || cb.close_fence_length.is_some(),
        BlockValue::HtmlBlock(hb) => html_block_closed(hb),
        _ => false,
    }
}

// A block that no open paragraph (or table) can absorb as a continuation
// line: it starts on its own regardless of what precedes it.
fn interrupts_anything(block: &Block) -> bool {
    match &block.value {
        BlockValue::BlankLines(..)
        | BlockValue::Heading(..)
        | BlockValue::ThematicBreak(..)
        | BlockValue::BlockQuote(..)
        | BlockValue::FootnoteDefinition(..) => true,
        BlockValue::CodeBlock(cb) => cb.fenced,
        BlockValue::HtmlBlock(hb) => (1..=6).contains(&hb.block_type),
        _ => false,
    }
}

fn try_splice(
    old_doc: &Document,
    new_source: &str,
    new_scanner: &Scanner,
    new_len: usize,
    edit: &EditInfo,
    options: &Options,
) -> Option<Document> {
    let blocks = &old_doc.blocks;
    if blocks.is_empty() {
        debug!("incremental: old document empty, full parse");
        return None;
    }
    if old_doc.bom || new_source.starts_with('\u{feff}') {
        debug!("incremental: BOM present, full parse");
        return None;
    }
    let delta = edit.delta();

    // Affected-range detection: the first block the edit touches and the
    // last, widened across exact-boundary edits that could fuse with a
    // neighbour.
    let mut lo = blocks
        .iter()
        .position(|b| b.span.to > edit.start)
        .unwrap_or(blocks.len() - 1);
    let mut hi = blocks
        .iter()
        .rposition(|b| b.span.from < edit.old_end)
        .unwrap_or(lo);
    if edit.start == blocks[lo].span.from && lo > 0 {
        lo -= 1;
    }
    if edit.old_end == blocks[hi].span.to && hi + 1 < blocks.len() {
        hi += 1;
    }
    let (lo, hi) = (lo.min(hi), lo.max(hi));

    if lo == 0 && hi == blocks.len() - 1 {
        debug!("incremental: edit spans the whole document, full parse");
        return None;
    }

    // Containers carry continuation context the simple range expansion
    // cannot capture.
    if blocks[lo..=hi].iter().any(|b| b.value.is_container()) {
        debug!("incremental: affected range holds a container, full parse");
        return None;
    }

    let prefix = &blocks[..lo];
    let suffix = &blocks[hi + 1..];

    // A list or footnote definition above the region could claim indented
    // region lines as continuation content.
    if let Some(context) = last_non_blank(prefix) {
        if matches!(
            context.value,
            BlockValue::List(..) | BlockValue::FootnoteDefinition(..)
        ) {
            debug!("incremental: list/footnote context before region, full parse");
            return None;
        }
    }

    let l = blocks[lo].span.from;
    let r_signed = blocks[hi].span.to as isize + delta;
    if r_signed < l as isize || r_signed as usize > new_len {
        debug!("incremental: rebased region out of bounds, full parse");
        return None;
    }
    let r = r_signed as usize;

    trace!(
        "incremental: reparsing blocks {}..={} as region [{},{})",
        lo,
        hi,
        l,
        r
    );

    let middle_source = new_scanner.slice(l, r);
    let (middle, _) = parser::parse_range(middle_source, l, options, Some(&old_doc.refmap));

    // Reused subtrees keep their resolved reference decisions, so any
    // change to the definition set must recompute everything.
    if collect_defs(&blocks[lo..=hi]) != collect_defs(&middle) {
        debug!("incremental: reference definitions changed, full parse");
        return None;
    }

    // Left seam: unless the prefix ends in a block whose extent is fixed,
    // the region must begin with something the prefix could not absorb.
    if let Some(last) = prefix.last() {
        if !self_terminated(last) {
            let first_ok = middle.first().map_or(false, interrupts_anything);
            if !first_ok {
                debug!("incremental: left seam could fuse, full parse");
                return None;
            }
        }
    }
    if let Some(context) = last_non_blank(prefix) {
        if is_indented_code(context) && first_non_blank(&middle).map_or(false, is_indented_code) {
            debug!("incremental: indented code could merge at left seam, full parse");
            return None;
        }
    }

    // Right seam.
    if !suffix.is_empty() {
        if let Some(last) = middle.last() {
            match &last.value {
                BlockValue::List(..) | BlockValue::FootnoteDefinition(..) => {
                    debug!("incremental: region ends in list/footnote, full parse");
                    return None;
                }
                BlockValue::CodeBlock(cb) if cb.fenced && cb.close_fence_length.is_none() => {
                    debug!("incremental: region ends in unclosed fence, full parse");
                    return None;
                }
                BlockValue::HtmlBlock(hb)
                    if (1..=5).contains(&hb.block_type) && !html_block_closed(hb) =>
                {
                    debug!("incremental: region ends in open HTML block, full parse");
                    return None;
                }
                _ => {}
            }
        }
        let effective_end = middle.last().or_else(|| prefix.last());
        let safe_end = effective_end.map_or(true, self_terminated);
        if !safe_end && !interrupts_anything(&suffix[0]) {
            debug!("incremental: right seam could fuse, full parse");
            return None;
        }
        let effective_nb = last_non_blank(&middle).or_else(|| last_non_blank(prefix));
        if effective_nb.map_or(false, is_indented_code)
            && first_non_blank(suffix).map_or(false, is_indented_code)
        {
            debug!("incremental: indented code could merge at right seam, full parse");
            return None;
        }
    }

    // Splice: prefix verbatim, middle fresh, suffix rebased by the delta.
    let mut spliced: Vec<Block> = Vec::with_capacity(prefix.len() + middle.len() + suffix.len());
    spliced.extend_from_slice(prefix);
    spliced.extend(middle);
    for block in suffix {
        let mut rebased = block.clone();
        rebased.shift(delta);
        spliced.push(rebased);
    }

    // Blank runs meeting at a seam must become one node, as a full parse
    // would produce.
    let mut out: Vec<Block> = Vec::with_capacity(spliced.len());
    for block in spliced {
        if let BlockValue::BlankLines(count) = block.value {
            if let Some(last) = out.last_mut() {
                if let BlockValue::BlankLines(ref mut last_count) = last.value {
                    if last.span.to == block.span.from {
                        *last_count += count;
                        last.span.to = block.span.to;
                        continue;
                    }
                }
            }
        }
        out.push(block);
    }

    let refmap = collect_refmap(&out);

    Some(Document {
        blocks: out,
        span: Span::new(0, new_len),
        refmap,
        final_newline: new_source.ends_with('\n'),
        bom: false,
    })
}

type DefKey = (String, String, String);

fn collect_defs(blocks: &[Block]) -> Vec<DefKey> {
    let mut out = Vec::new();
    collect_defs_into(blocks, &mut out);
    out
}

fn collect_defs_into(blocks: &[Block], out: &mut Vec<DefKey>) {
    for block in blocks {
        match &block.value {
            BlockValue::LinkRefDef(def) => {
                let mut title = def.title.clone().unwrap_or_default();
                strings::unescape(&mut title);
                out.push((
                    strings::normalize_label(&def.label),
                    strings::clean_url(&def.dest),
                    title,
                ));
            }
            BlockValue::BlockQuote(q) => collect_defs_into(&q.children, out),
            BlockValue::List(l) => {
                for item in &l.items {
                    collect_defs_into(&item.children, out);
                }
            }
            BlockValue::FootnoteDefinition(d) => collect_defs_into(&d.children, out),
            _ => {}
        }
    }
}

// The index is rebuilt over the spliced sequence in document order;
// first definition wins, as in a full parse.
fn collect_refmap(blocks: &[Block]) -> RefMap {
    let mut refmap = RefMap::new();
    collect_refmap_into(blocks, &mut refmap);
    refmap
}

fn collect_refmap_into(blocks: &[Block], refmap: &mut RefMap) {
    for block in blocks {
        match &block.value {
            BlockValue::LinkRefDef(def) => {
                let normalized = strings::normalize_label(&def.label);
                if !normalized.is_empty() {
                    let mut title = def.title.clone().unwrap_or_default();
                    strings::unescape(&mut title);
                    refmap.insert(
                        normalized,
                        ResolvedReference {
                            url: strings::clean_url(&def.dest),
                            title,
                        },
                    );
                }
            }
            BlockValue::BlockQuote(q) => collect_refmap_into(&q.children, refmap),
            BlockValue::List(l) => {
                for item in &l.items {
                    collect_refmap_into(&item.children, refmap);
                }
            }
            BlockValue::FootnoteDefinition(d) => collect_refmap_into(&d.children, refmap),
            _ => {}
        }
    }
}
