//! Line-level scanners for the block parser.
//!
//! Each scanner inspects the remainder of a line (starting at the first
//! non-space position; the caller slices) and reports how much it matched.
//! They do a cheap first-byte check before anything else, since the common
//! case by far is "no match".

use crate::ctype::{isalnum, isalpha, isspace};
use crate::strings::is_space_or_tab;

/// ATX heading opener: 1 to 6 `#` followed by a space, tab, or the end of
/// the line. Returns `(consumed, level)`; exactly one following space is
/// consumed so heading content keeps any additional whitespace verbatim.
pub fn atx_heading_start(line: &str) -> Option<(usize, u32)> {
    let b = line.as_bytes();
    if b.first() != Some(&b'#') {
        return None;
    }
    let mut level = 0;
    while level < b.len() && b[level] == b'#' {
        level += 1;
    }
    if level > 6 {
        return None;
    }
    match b.get(level) {
        None => Some((level, level as u32)),
        Some(&c) if is_space_or_tab(c) => Some((level + 1, level as u32)),
        _ => None,
    }
}

/// Opening code fence: at least three `` ` `` or `~`. An info string on a
/// backtick fence must not itself contain a backtick.
/// Returns `(fence_char, fence_length)`.
pub fn open_code_fence(line: &str) -> Option<(u8, usize)> {
    let b = line.as_bytes();
    let c = *b.first()?;
    if c != b'`' && c != b'~' {
        return None;
    }
    let mut len = 0;
    while len < b.len() && b[len] == c {
        len += 1;
    }
    if len < 3 {
        return None;
    }
    if c == b'`' && b[len..].contains(&b'`') {
        return None;
    }
    Some((c, len))
}

/// Closing code fence: a run of the opening character at least as long as
/// the opening fence, with nothing but whitespace after it. Returns the
/// run length.
pub fn close_code_fence(line: &str, fence_char: u8, min_len: usize) -> Option<usize> {
    let b = line.as_bytes();
    if b.first() != Some(&fence_char) {
        return None;
    }
    let mut len = 0;
    while len < b.len() && b[len] == fence_char {
        len += 1;
    }
    if len < min_len || !b[len..].iter().all(|&c| is_space_or_tab(c)) {
        return None;
    }
    Some(len)
}

/// Thematic break: three or more of the same `-`, `*` or `_`, interleaved
/// with spaces and tabs only. Returns the marker character.
pub fn thematic_break(line: &str) -> Option<u8> {
    let b = line.as_bytes();
    let marker = *b.first()?;
    if marker != b'-' && marker != b'*' && marker != b'_' {
        return None;
    }
    let mut count = 0;
    for &c in b {
        if c == marker {
            count += 1;
        } else if !is_space_or_tab(c) {
            return None;
        }
    }
    if count >= 3 {
        Some(marker)
    } else {
        None
    }
}

const BLOCK_TAGS: [&str; 62] = [
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link", "main", "menu",
    "menuitem", "nav", "noframes", "ol", "optgroup", "option", "p", "param", "section", "source",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "track", "ul",
];

const VERBATIM_TAGS: [&str; 4] = ["script", "pre", "style", "textarea"];

fn scan_tag_name(b: &[u8]) -> Option<usize> {
    if b.is_empty() || !isalpha(b[0]) {
        return None;
    }
    let mut i = 1;
    while i < b.len() && (isalnum(b[i]) || b[i] == b'-') {
        i += 1;
    }
    Some(i)
}

/// Recognizes the opening line of HTML block types 1 through 6.
pub fn html_block_start(line: &str) -> Option<u8> {
    let b = line.as_bytes();
    if b.first() != Some(&b'<') {
        return None;
    }

    for tag in VERBATIM_TAGS {
        let n = tag.len();
        if b.len() > n && b[1..1 + n].eq_ignore_ascii_case(tag.as_bytes()) {
            match b.get(1 + n) {
                None => return Some(1),
                Some(&c) if is_space_or_tab(c) || c == b'>' => return Some(1),
                _ => {}
            }
        }
    }
    if line.starts_with("<!--") {
        return Some(2);
    }
    if line.starts_with("<?") {
        return Some(3);
    }
    if line.starts_with("<![CDATA[") {
        return Some(5);
    }
    if b.len() > 2 && b[1] == b'!' && isalpha(b[2]) {
        return Some(4);
    }

    let rest = if b.get(1) == Some(&b'/') { 2 } else { 1 };
    if let Some(name_len) = scan_tag_name(&b[rest..]) {
        let name = line[rest..rest + name_len].to_ascii_lowercase();
        if BLOCK_TAGS.contains(&name.as_str()) {
            let after = &b[rest + name_len..];
            match after.first() {
                None => return Some(6),
                Some(&c) if is_space_or_tab(c) || c == b'>' => return Some(6),
                Some(&b'/') if after.get(1) == Some(&b'>') => return Some(6),
                _ => {}
            }
        }
    }

    None
}

fn scan_attribute(b: &[u8], mut i: usize) -> Option<usize> {
    // at least one space before the attribute name
    if i >= b.len() || !isspace(b[i]) {
        return None;
    }
    while i < b.len() && isspace(b[i]) {
        i += 1;
    }
    if i >= b.len() || !(isalpha(b[i]) || b[i] == b'_' || b[i] == b':') {
        return None;
    }
    i += 1;
    while i < b.len() && (isalnum(b[i]) || matches!(b[i], b'_' | b'.' | b':' | b'-')) {
        i += 1;
    }
    let mut j = i;
    while j < b.len() && isspace(b[j]) {
        j += 1;
    }
    if j >= b.len() || b[j] != b'=' {
        return Some(i);
    }
    j += 1;
    while j < b.len() && isspace(b[j]) {
        j += 1;
    }
    match b.get(j) {
        Some(&q) if q == b'"' || q == b'\'' => {
            j += 1;
            while j < b.len() && b[j] != q {
                j += 1;
            }
            if j >= b.len() {
                return None;
            }
            Some(j + 1)
        }
        Some(_) => {
            let start = j;
            while j < b.len() && !isspace(b[j]) && !matches!(b[j], b'"' | b'\'' | b'=' | b'<' | b'>' | b'`')
            {
                j += 1;
            }
            if j == start {
                return None;
            }
            Some(j)
        }
        None => None,
    }
}

/// One complete open tag starting at `b[0] == b'<'`; returns the index
/// just past the closing `>`.
pub(crate) fn scan_open_tag(b: &[u8]) -> Option<usize> {
    if b.first() != Some(&b'<') {
        return None;
    }
    let mut i = 1 + scan_tag_name(&b[1..])?;
    while let Some(next) = scan_attribute(b, i) {
        i = next;
    }
    while i < b.len() && isspace(b[i]) {
        i += 1;
    }
    if b.get(i) == Some(&b'/') {
        i += 1;
    }
    if b.get(i) == Some(&b'>') {
        Some(i + 1)
    } else {
        None
    }
}

/// One complete close tag starting at `b[0] == b'<'`.
pub(crate) fn scan_close_tag(b: &[u8]) -> Option<usize> {
    if b.len() < 2 || b[0] != b'<' || b[1] != b'/' {
        return None;
    }
    let mut i = 2 + scan_tag_name(&b[2..])?;
    while i < b.len() && isspace(b[i]) {
        i += 1;
    }
    if b.get(i) == Some(&b'>') {
        Some(i + 1)
    } else {
        None
    }
}

/// HTML block type 7: the line consists of a single complete open or close
/// tag (any tag name) followed by whitespace only.
pub fn html_block_start_7(line: &str) -> bool {
    let b = line.as_bytes();
    let end = match scan_open_tag(b).or_else(|| scan_close_tag(b)) {
        Some(end) => end,
        None => return false,
    };
    b[end..].iter().all(|&c| is_space_or_tab(c))
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    if haystack.len() < needle.len() {
        return false;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

/// End condition for HTML block types 1 through 5 (6 and 7 end on a blank
/// line, which the block parser handles).
pub fn html_block_end(block_type: u8, line: &str) -> bool {
    match block_type {
        1 => {
            contains_ignore_ascii_case(line, "</script>")
                || contains_ignore_ascii_case(line, "</pre>")
                || contains_ignore_ascii_case(line, "</style>")
                || contains_ignore_ascii_case(line, "</textarea>")
        }
        2 => line.contains("-->"),
        3 => line.contains("?>"),
        4 => line.contains('>'),
        5 => line.contains("]]>"),
        _ => false,
    }
}

/// Footnote definition opener `[^label]:`. Returns the label and the
/// number of bytes consumed through the colon.
pub fn footnote_definition_start(line: &str) -> Option<(String, usize)> {
    let b = line.as_bytes();
    if !line.starts_with("[^") {
        return None;
    }
    let mut i = 2;
    while i < b.len() && b[i] != b']' && !isspace(b[i]) {
        i += 1;
    }
    if i == 2 || b.get(i) != Some(&b']') || b.get(i + 1) != Some(&b':') {
        return None;
    }
    Some((line[2..i].to_string(), i + 2))
}

/// Task-list item marker `[ ] `, `[x] ` or `[X] ` at the start of item
/// content. Returns the character between the brackets.
pub fn task_item_marker(line: &str) -> Option<char> {
    let b = line.as_bytes();
    if b.len() >= 4
        && b[0] == b'['
        && matches!(b[1], b' ' | b'x' | b'X')
        && b[2] == b']'
        && is_space_or_tab(b[3])
    {
        Some(b[1] as char)
    } else {
        None
    }
}

/// The pieces of a single-line link reference definition.
#[derive(Debug)]
pub struct RefDefParts {
    pub label: String,
    pub dest: String,
    pub title: Option<String>,
    pub title_quote: Option<u8>,
}

/// Matches a whole line of the form `[label]: dest` or
/// `[label]: dest "title"` (single-line definitions only).
pub fn link_reference_definition(line: &str) -> Option<RefDefParts> {
    let b = line.as_bytes();
    if b.first() != Some(&b'[') {
        return None;
    }

    let mut i = 1;
    while i < b.len() && b[i] != b']' {
        if b[i] == b'[' {
            return None;
        }
        if b[i] == b'\\' && i + 1 < b.len() {
            i += 1;
        }
        i += 1;
        if i > 1000 {
            return None;
        }
    }
    if i >= b.len() || b.get(i + 1) != Some(&b':') {
        return None;
    }
    let label = &line[1..i];
    if label.trim().is_empty() {
        return None;
    }
    i += 2;

    while i < b.len() && is_space_or_tab(b[i]) {
        i += 1;
    }

    let dest_start = i;
    if b.get(i) == Some(&b'<') {
        i += 1;
        while i < b.len() && b[i] != b'>' && b[i] != b'<' {
            if b[i] == b'\\' && i + 1 < b.len() {
                i += 1;
            }
            i += 1;
        }
        if b.get(i) != Some(&b'>') {
            return None;
        }
        i += 1;
    } else {
        while i < b.len() && !is_space_or_tab(b[i]) {
            if b[i] == b'\\' && i + 1 < b.len() {
                i += 1;
            }
            i += 1;
        }
        if i == dest_start {
            return None;
        }
    }
    let dest = &line[dest_start..i];

    while i < b.len() && is_space_or_tab(b[i]) {
        i += 1;
    }
    if i == b.len() {
        return Some(RefDefParts {
            label: label.to_string(),
            dest: dest.to_string(),
            title: None,
            title_quote: None,
        });
    }

    let quote = b[i];
    let close = match quote {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };
    i += 1;
    let title_start = i;
    while i < b.len() && b[i] != close {
        if b[i] == b'\\' && i + 1 < b.len() {
            i += 1;
        }
        i += 1;
    }
    if i >= b.len() {
        return None;
    }
    let title = &line[title_start..i];
    i += 1;
    if !b[i..].iter().all(|&c| is_space_or_tab(c)) {
        return None;
    }

    Some(RefDefParts {
        label: label.to_string(),
        dest: dest.to_string(),
        title: Some(title.to_string()),
        title_quote: Some(quote),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atx_levels() {
        assert_eq!(atx_heading_start("# x"), Some((2, 1)));
        assert_eq!(atx_heading_start("######"), Some((6, 6)));
        assert_eq!(atx_heading_start("####### x"), None);
        assert_eq!(atx_heading_start("#x"), None);
    }

    #[test]
    fn fences() {
        assert_eq!(open_code_fence("```rust"), Some((b'`', 3)));
        assert_eq!(open_code_fence("~~~~"), Some((b'~', 4)));
        assert_eq!(open_code_fence("``` a`b"), None);
        assert_eq!(close_code_fence("````  ", b'`', 3), Some(4));
        assert_eq!(close_code_fence("``` x", b'`', 3), None);
    }

    #[test]
    fn breaks() {
        assert_eq!(thematic_break("- - -"), Some(b'-'));
        assert_eq!(thematic_break("***"), Some(b'*'));
        assert_eq!(thematic_break("--"), None);
        assert_eq!(thematic_break("- - x"), None);
    }

    #[test]
    fn html_starts() {
        assert_eq!(html_block_start("<script src=\"x\">"), Some(1));
        assert_eq!(html_block_start("<!-- note"), Some(2));
        assert_eq!(html_block_start("<div class=\"x\">"), Some(6));
        assert_eq!(html_block_start("</div>"), Some(6));
        assert_eq!(html_block_start("<span>"), None);
        assert!(html_block_start_7("<span class=\"x\">  "));
        assert!(!html_block_start_7("<span> text"));
    }

    #[test]
    fn ref_defs() {
        let d = link_reference_definition("[ref]: /u \"t\"").unwrap();
        assert_eq!(d.label, "ref");
        assert_eq!(d.dest, "/u");
        assert_eq!(d.title.as_deref(), Some("t"));
        assert_eq!(d.title_quote, Some(b'"'));

        assert!(link_reference_definition("[ref]: /u extra").is_none());
        assert!(link_reference_definition("[]: /u").is_none());
    }
}
