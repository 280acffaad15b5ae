//! Code-point-indexed random access over a source string.
//!
//! Every offset exchanged at the crate boundary (spans, [`EditInfo`]) is a
//! Unicode code-point index. The scanner materializes the code points once
//! so that indexing and slicing are O(1) afterwards, and keeps a UTF-16
//! offset table when the input contains non-BMP characters, for hosts
//! (e.g. JavaScript editors) that address text in UTF-16 code units.
//!
//! [`EditInfo`]: crate::EditInfo

/// O(1) code-point access and slicing over one source string.
///
/// The scanner owns no text; it borrows the source for the duration of a
/// parse call and is not shared across calls.
pub struct Scanner<'s> {
    source: &'s str,
    chars: Vec<char>,
    byte_offsets: Vec<usize>,
    utf16_offsets: Option<Vec<usize>>,
    pos: usize,
}

impl<'s> Scanner<'s> {
    pub fn new(source: &'s str) -> Self {
        let mut chars = Vec::with_capacity(source.len());
        let mut byte_offsets = Vec::with_capacity(source.len());
        let mut non_bmp = false;
        for (b, c) in source.char_indices() {
            chars.push(c);
            byte_offsets.push(b);
            non_bmp |= c as u32 > 0xffff;
        }
        byte_offsets.push(source.len());

        let utf16_offsets = if non_bmp {
            let mut v = Vec::with_capacity(chars.len() + 1);
            let mut off = 0;
            for &c in &chars {
                v.push(off);
                off += c.len_utf16();
            }
            v.push(off);
            Some(v)
        } else {
            None
        };

        Scanner {
            source,
            chars,
            byte_offsets,
            utf16_offsets,
            pos: 0,
        }
    }

    /// Number of code points in the source.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(pos <= self.chars.len());
        self.pos = pos;
    }

    pub fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn peek_at(&self, k: usize) -> Option<char> {
        self.chars.get(k).copied()
    }

    pub fn advance(&mut self) {
        self.pos += 1;
    }

    /// The original source substring covering the code-point range
    /// `[from, to)`.
    pub fn slice(&self, from: usize, to: usize) -> &'s str {
        &self.source[self.byte_offsets[from]..self.byte_offsets[to]]
    }

    /// UTF-16 code-unit offset of the code point at index `k`.
    ///
    /// When the input is BMP-only this equals `k`; the offset table is
    /// only materialized when a non-BMP code point was seen.
    pub fn utf16_offset(&self, k: usize) -> usize {
        match self.utf16_offsets {
            Some(ref v) => v[k],
            None => k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_is_code_point_addressed() {
        let s = Scanner::new("aé🦀b");
        assert_eq!(s.len(), 4);
        assert_eq!(s.slice(1, 3), "é🦀");
        assert_eq!(s.peek_at(2), Some('🦀'));
    }

    #[test]
    fn utf16_offsets_track_surrogate_pairs() {
        let s = Scanner::new("a🦀b");
        assert_eq!(s.utf16_offset(0), 0);
        assert_eq!(s.utf16_offset(1), 1);
        assert_eq!(s.utf16_offset(2), 3);
        assert_eq!(s.utf16_offset(3), 4);

        let bmp = Scanner::new("aéb");
        assert_eq!(bmp.utf16_offset(2), 2);
    }
}
