//! Delimiter-run classification and emphasis resolution.
//!
//! The inline scanner emits every `*`/`_`/`~` run as a provisional `Text`
//! node plus a [`Delim`] record; this module pairs openers with closers
//! afterwards. Fast mode pairs greedily inside-out (nearest matching
//! opener); strict mode is the same search plus CommonMark's rule 9/10
//! "multiple of 3" restriction.

use unicode_categories::UnicodeCategories;

use crate::nodes::{Inline, InlineValue, NodeEmph, Span};

/// Punctuation for the flanking rules: ASCII punctuation plus the Unicode
/// P and S categories.
pub(crate) fn is_cmark_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || c.is_punctuation() || c.is_symbol()
}

/// Classifies one delimiter run as may-open / may-close from the
/// characters adjacent to it. `_` additionally requires a word boundary
/// on the flanking side.
pub(crate) fn classify(ch: char, before: char, after: char) -> (bool, bool) {
    let before_ws = before.is_whitespace();
    let after_ws = after.is_whitespace();
    let before_punct = is_cmark_punctuation(before);
    let after_punct = is_cmark_punctuation(after);

    let left_flanking = !after_ws && (!after_punct || before_ws || before_punct);
    let right_flanking = !before_ws && (!before_punct || after_ws || after_punct);

    if ch == '_' {
        (
            left_flanking && (!right_flanking || before_punct),
            right_flanking && (!left_flanking || after_punct),
        )
    } else {
        (left_flanking, right_flanking)
    }
}

/// One delimiter run, doubly linked through `prev`/`next` vector indices.
pub(crate) struct Delim {
    /// Index of the run's provisional `Text` node in the slot vector.
    pub slot: usize,
    pub ch: char,
    /// Original run length; rule 9/10 is defined over the lengths as
    /// scanned, not as truncated.
    pub length: usize,
    pub can_open: bool,
    pub can_close: bool,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

fn remove_delim(delims: &mut [Delim], ix: usize) {
    let prev = delims[ix].prev;
    let next = delims[ix].next;
    if let Some(p) = prev {
        delims[p].next = next;
    }
    if let Some(n) = next {
        delims[n].prev = prev;
    }
}

fn text_char_len(inline: &Inline) -> usize {
    match inline.value {
        InlineValue::Text(ref t) => t.len(),
        _ => 0,
    }
}

/// Appends a node, merging adjacent literal text with contiguous spans.
pub(crate) fn push_coalesced(nodes: &mut Vec<Inline>, node: Inline) {
    if let InlineValue::Text(ref t) = node.value {
        if let Some(last) = nodes.last_mut() {
            if last.span.to == node.span.from {
                if let InlineValue::Text(ref mut lt) = last.value {
                    lt.push_str(t);
                    last.span.to = node.span.to;
                    return;
                }
            }
        }
    }
    nodes.push(node);
}

/// Pairs openers and closers over the scanned slots. Each live delimiter's
/// slot holds exactly its provisional text node; resolved emphasis nodes
/// are placed into the (drained) slot after their opener, which keeps the
/// flattened slot order equal to source order.
pub(crate) fn process_emphasis(slots: &mut Vec<Vec<Inline>>, delims: &mut Vec<Delim>, strict: bool) {
    if delims.is_empty() {
        return;
    }

    // Prevents re-searching parts of the stack known to hold no opener
    // for a given delimiter class; this is what keeps pathological inputs
    // from going quadratic.
    let mut openers_bottom: [usize; 8] = [0; 8];

    let mut closer = Some(0);
    while let Some(c_ix) = closer {
        if !delims[c_ix].can_close {
            closer = delims[c_ix].next;
            continue;
        }

        let (c_ch, c_len, c_can_open) = {
            let c = &delims[c_ix];
            (c.ch, c.length, c.can_open)
        };
        let ix_key = match c_ch {
            '~' => 0,
            '_' => 1,
            '*' => 2 + (if c_can_open { 3 } else { 0 }) + c_len % 3,
            _ => unreachable!(),
        };

        let mut opener = delims[c_ix].prev;
        let mut opener_found = false;
        let mut mod_three_rule_invoked = false;
        while let Some(o_ix) = opener {
            if o_ix < openers_bottom[ix_key] {
                break;
            }
            let o = &delims[o_ix];
            if o.can_open && o.ch == c_ch {
                // Strikethrough pairs only as exactly two tildes.
                let tilde_ok = c_ch != '~' || (o.length == 2 && c_len == 2);
                // Rule 9/10: when either end of the pair could both open
                // and close, a combined length divisible by 3 forbids the
                // match unless both lengths individually are.
                let odd_match = strict
                    && (c_can_open || o.can_close)
                    && (o.length + c_len) % 3 == 0
                    && !(o.length % 3 == 0 && c_len % 3 == 0);
                if tilde_ok && !odd_match {
                    opener_found = true;
                    break;
                }
                if odd_match {
                    mod_three_rule_invoked = true;
                }
            }
            opener = o.prev;
        }

        if opener_found {
            closer = insert_emph(slots, delims, opener.unwrap(), c_ix);
        } else {
            if !mod_three_rule_invoked {
                openers_bottom[ix_key] = c_ix;
            }
            closer = delims[c_ix].next;
            if !c_can_open {
                remove_delim(delims, c_ix);
            }
        }
    }
}

// Builds the emphasis node for one matched pair, consuming one or two
// characters from each side, and hands back the closer to try again (a
// long run may participate in several pairs).
fn insert_emph(
    slots: &mut Vec<Vec<Inline>>,
    delims: &mut Vec<Delim>,
    o_ix: usize,
    c_ix: usize,
) -> Option<usize> {
    let ch = delims[o_ix].ch;
    let o_slot = delims[o_ix].slot;
    let c_slot = delims[c_ix].slot;

    let o_rem = text_char_len(&slots[o_slot][0]);
    let c_rem = text_char_len(&slots[c_slot][0]);
    let use_delims = if ch == '~' || (o_rem >= 2 && c_rem >= 2) {
        2
    } else {
        1
    };

    let emph_span = Span::new(
        slots[o_slot][0].span.to - use_delims,
        slots[c_slot][0].span.from + use_delims,
    );

    {
        let opener_text = &mut slots[o_slot][0];
        opener_text.span.to -= use_delims;
        if let InlineValue::Text(ref mut t) = opener_text.value {
            t.truncate(t.len() - use_delims);
        }
    }
    {
        let closer_text = &mut slots[c_slot][0];
        closer_text.span.from += use_delims;
        if let InlineValue::Text(ref mut t) = closer_text.value {
            t.drain(..use_delims);
        }
    }

    // Candidate delimiters between the pair were scanned already and can
    // never match anything; their texts stay behind as literal content.
    let mut p = delims[c_ix].prev;
    while let Some(ix) = p {
        if ix == o_ix {
            break;
        }
        let pp = delims[ix].prev;
        remove_delim(delims, ix);
        p = pp;
    }

    let mut children = Vec::new();
    for slot in slots.iter_mut().take(c_slot).skip(o_slot + 1) {
        for node in slot.drain(..) {
            push_coalesced(&mut children, node);
        }
    }

    let value = if ch == '~' {
        InlineValue::Strikethrough(children)
    } else if use_delims == 2 {
        InlineValue::Strong(NodeEmph {
            marker: ch as u8,
            children,
        })
    } else {
        InlineValue::Emph(NodeEmph {
            marker: ch as u8,
            children,
        })
    };
    slots[o_slot + 1].push(Inline {
        value,
        span: emph_span,
    });

    if o_rem - use_delims == 0 {
        slots[o_slot].clear();
        remove_delim(delims, o_ix);
    }
    if c_rem - use_delims == 0 {
        slots[c_slot].clear();
        let next = delims[c_ix].next;
        remove_delim(delims, c_ix);
        next
    } else {
        Some(c_ix)
    }
}
