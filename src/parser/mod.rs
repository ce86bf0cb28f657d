//! XML 1.0 parser.
//!
//! Recursive descent straight into a [`Document`]. Character references
//! and the five predefined entities are expanded; a DOCTYPE internal
//! subset is skipped and nothing outside the input is ever read.

pub(crate) mod input;
mod xml;

pub(crate) use input::{is_name_char, is_name_start_char};

use crate::error::ParseError;
use crate::tree::Document;

use input::DEFAULT_MAX_DEPTH;

/// How a document is loaded.
///
/// [`crate::TixiOptions`] builds one of these for every document a
/// registry opens.
///
/// ```
/// use tixi::parser::ParseOptions;
///
/// let opts = ParseOptions::default().no_blanks(true);
/// assert!(opts.no_blanks);
/// assert_eq!(opts.max_depth, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Drop whitespace-only text between elements.
    pub no_blanks: bool,
    /// Deepest element nesting accepted.
    pub max_depth: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            no_blanks: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn no_blanks(mut self, yes: bool) -> Self {
        self.no_blanks = yes;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }
}

/// Parses `input` keeping all whitespace.
///
/// # Errors
///
/// `ParseError` with the location of the first well-formedness error.
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    parse_str_with_options(input, &ParseOptions::default())
}

/// # Errors
///
/// As [`parse_str`], plus a depth error past `options.max_depth`.
pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    xml::XmlParser::new(input, options).parse()
}
