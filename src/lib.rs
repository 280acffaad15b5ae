//! A lossless, block-incremental Markdown parser.
//!
//! `incmark` parses Markdown into a concrete syntax tree that keeps every
//! marker and style choice the author made, so serialization reproduces
//! the input byte-for-byte for the supported subset. Edits are repaired
//! incrementally: only the top-level blocks overlapping an edit are
//! re-parsed, the rest of the tree is reused with rebased spans.
//!
//! ```
//! use incmark::{parse_document, parse_incremental, serialize, EditInfo, Options};
//!
//! let options = Options::default();
//! let source = "# Title\n\nHello *world*.\n";
//! let doc = parse_document(source, &options);
//! assert_eq!(serialize(&doc, &options), source);
//!
//! // An edit inside the paragraph re-parses only that block; the
//! // heading is reused untouched.
//! let edited = "# Title\n\nHello *there*.\n";
//! let edit = EditInfo::replace(16, 21, 5);
//! let doc2 = parse_incremental(&doc, source, edited, &edit, &options);
//! assert_eq!(doc2, parse_document(edited, &options));
//! assert_eq!(serialize(&doc2, &options), edited);
//! ```
//!
//! All offsets at the crate boundary — node spans and [`EditInfo`] — are
//! Unicode code-point indices over the source. Hosts that address text in
//! UTF-16 units (e.g. JavaScript editors) translate through
//! [`Scanner::utf16_offset`].

mod cm;
mod ctype;
mod incremental;
pub mod nodes;
mod parser;
mod scanner;
mod scanners;
mod strings;

pub use cm::format_document;
pub use incremental::{parse_incremental, EditInfo};
pub use parser::{
    parse_document, FenceCharStyle, ListStyleType, Options, ParseOptions, RefMap,
    ResolvedReference, SerializeOptions, TitleQuoteStyle,
};
pub use scanner::Scanner;

/// Serializes a [`Document`](nodes::Document) to a string; the infallible
/// convenience wrapper around [`format_document`].
pub fn serialize(doc: &nodes::Document, options: &Options) -> String {
    let mut out = Vec::new();
    format_document(doc, options, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}
