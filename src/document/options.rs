//! Registry-wide document options.

use crate::parser::ParseOptions;

/// Options applied to every document a [`crate::Tixi`] registry opens or
/// creates.
///
/// ```
/// use tixi::TixiOptions;
///
/// let opts = TixiOptions::default().pretty_print(false).xpath_cache(true);
/// assert!(!opts.pretty_print);
/// assert_eq!(opts.indent, "  ");
/// ```
#[derive(Debug, Clone)]
pub struct TixiOptions {
    /// Initial pretty-print flag of new documents.
    pub pretty_print: bool,
    /// Indentation written per nesting level when pretty printing.
    pub indent: String,
    /// Keep whitespace-only text between elements on load.
    pub keep_blanks: bool,
    /// Enable the single-entry query cache on new documents.
    pub xpath_cache: bool,
    /// Maximum element nesting depth accepted by the parser.
    pub max_depth: u32,
}

impl Default for TixiOptions {
    fn default() -> Self {
        Self {
            pretty_print: true,
            indent: "  ".to_string(),
            keep_blanks: false,
            xpath_cache: false,
            max_depth: 256,
        }
    }
}

impl TixiOptions {
    #[must_use]
    pub fn pretty_print(mut self, yes: bool) -> Self {
        self.pretty_print = yes;
        self
    }

    #[must_use]
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    #[must_use]
    pub fn keep_blanks(mut self, yes: bool) -> Self {
        self.keep_blanks = yes;
        self
    }

    #[must_use]
    pub fn xpath_cache(mut self, yes: bool) -> Self {
        self.xpath_cache = yes;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    pub(crate) fn parse_options(&self) -> ParseOptions {
        ParseOptions::default()
            .no_blanks(!self.keep_blanks)
            .max_depth(self.max_depth)
    }
}
