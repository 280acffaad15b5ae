use crate::nodes::HardBreakStyle;

/// Umbrella options struct.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Options {
    /// Configure parse-time options.
    pub parse: ParseOptions,

    /// Configure serialization options.
    pub serialize: SerializeOptions,
}

/// Options for parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Selects the two-phase delimiter-stack algorithm for emphasis
    /// pairing, including CommonMark's rule 9/10 "multiple of 3"
    /// restriction. The default fast mode pairs delimiter runs greedily
    /// inside-out with the same flanking classification.
    ///
    /// ```
    /// # use incmark::{parse_document, Options};
    /// # use incmark::nodes::{BlockValue, InlineValue};
    /// let mut options = Options::default();
    /// options.parse.strict = true;
    /// let doc = parse_document("*a**b*\n", &options);
    /// let para = match &doc.blocks[0].value {
    ///     BlockValue::Paragraph(p) => p,
    ///     _ => unreachable!(),
    /// };
    /// assert!(matches!(para.children[0].value, InlineValue::Emph(..)));
    /// ```
    pub strict: bool,

    /// Enables the GitHub Flavored Markdown extensions: tables,
    /// strikethrough, task-list items, footnotes. On by default.
    ///
    /// ```
    /// # use incmark::{parse_document, Options};
    /// # use incmark::nodes::BlockValue;
    /// let doc = parse_document("| a | b |\n| --- | --- |\n", &Options::default());
    /// assert!(matches!(doc.blocks[0].value, BlockValue::Table(..)));
    /// ```
    pub gfm: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            strict: false,
            gfm: true,
        }
    }
}

/// Options for serialization. With everything off, output is byte-identical
/// to the parsed source for the supported subset.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct SerializeOptions {
    /// Rewrites every style choice to its canonical form: `"` title
    /// quotes, backtick fences, `-` bullets, backslash hard breaks.
    ///
    /// ```
    /// # use incmark::{parse_document, serialize, Options};
    /// let doc = parse_document("[x](u 'y')\n", &Options::default());
    /// let mut options = Options::default();
    /// options.serialize.normalize = true;
    /// assert_eq!(serialize(&doc, &options), "[x](u \"y\")\n");
    /// ```
    pub normalize: bool,

    /// Overrides the bullet marker of every bullet list.
    pub list_style: Option<ListStyleType>,

    /// Overrides the fence character of every fenced code block. The
    /// fence length grows past the longest same-character run in the body
    /// when required.
    pub fence_char: Option<FenceCharStyle>,

    /// Overrides the spelling of every hard break.
    pub hardbreak: Option<HardBreakStyle>,

    /// Overrides the quote style of every link and image title.
    pub title_quote: Option<TitleQuoteStyle>,
}

/// Bullet markers for list serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListStyleType {
    /// The `-` character.
    #[default]
    Dash = 45,
    /// The `+` character.
    Plus = 43,
    /// The `*` character.
    Star = 42,
}

/// Fence characters for fenced code block serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FenceCharStyle {
    #[default]
    Backtick,
    Tilde,
}

/// Quote styles for link and image titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleQuoteStyle {
    /// `"title"`
    #[default]
    Double,
    /// `'title'`
    Single,
    /// `(title)`
    Paren,
}
