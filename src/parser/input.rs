//! Low-level input handling for the XML parser.
//!
//! [`ParserInput`] owns the byte stream and position (line, column,
//! offset) and provides the shared primitives: peeking, advancing, name
//! parsing, and reference resolution.

use crate::error::{ErrorSeverity, ParseDiagnostic, ParseError, SourceLocation};

// -------------------------------------------------------------------------
// Limits
// -------------------------------------------------------------------------

pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

pub(crate) const DEFAULT_MAX_NAME_LENGTH: usize = 50_000;

// -------------------------------------------------------------------------
// XML Name character classes (XML 1.0 §2.3)
// -------------------------------------------------------------------------

/// Returns `true` if `c` is a valid `Char` per XML 1.0 §2.2 `[2]`.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// Returns `true` if `c` is a valid `NameStartChar` per XML 1.0 §2.3 `[4]`.
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` is a valid `NameChar` per XML 1.0 §2.3 `[4a]`.
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

// -------------------------------------------------------------------------
// ParserInput
// -------------------------------------------------------------------------

pub(crate) struct ParserInput<'a> {
    input: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    depth: u32,
    max_depth: u32,
    max_name_length: usize,
    pub(crate) diagnostics: Vec<ParseDiagnostic>,
}

impl<'a> ParserInput<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            diagnostics: Vec::new(),
        }
    }

    pub fn set_max_depth(&mut self, max: u32) {
        self.max_depth = max;
    }

    #[cfg(test)]
    pub fn set_max_name_length(&mut self, max: usize) {
        self.max_name_length = max;
    }

    // -- Depth tracking --

    pub fn increment_depth(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        Ok(())
    }

    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -- Position queries --

    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    // -- Peek operations --

    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    pub fn peek_char(&self) -> Option<char> {
        let rest = self.input.get(self.pos..)?;
        // Decode at most one scalar; a UTF-8 sequence is never longer than 4 bytes.
        let window = &rest[..rest.len().min(4)];
        match std::str::from_utf8(window) {
            Ok(s) => s.chars().next(),
            Err(e) => std::str::from_utf8(&window[..e.valid_up_to()])
                .ok()
                .and_then(|s| s.chars().next()),
        }
    }

    // -- Advance operations --

    /// Advances by `count` bytes, updating line and column.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            if self.pos < self.input.len() {
                if self.input[self.pos] == b'\n' {
                    self.line += 1;
                    self.column = 1;
                } else {
                    self.column += 1;
                }
                self.pos += 1;
            }
        }
    }

    pub fn advance_char(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += ch.len_utf8();
    }

    pub fn next_byte(&mut self) -> Result<u8, ParseError> {
        let b = self
            .peek()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        self.advance(1);
        Ok(b)
    }

    /// Consumes the next character with `\r\n` normalization (XML 1.0
    /// §2.11) and character validation (XML 1.0 §2.2).
    pub fn next_char(&mut self) -> Result<char, ParseError> {
        let ch = self
            .peek_char()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        self.advance_char(ch);
        if ch == '\r' {
            if self.peek() == Some(b'\n') {
                self.advance(1);
            }
            return Ok('\n');
        }
        if !is_xml_char(ch) {
            return Err(self.fatal(format!("invalid XML character: U+{:04X}", ch as u32)));
        }
        Ok(ch)
    }

    // -- Expect operations --

    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ParseError> {
        let b = self.next_byte()?;
        if b != expected {
            return Err(self.fatal(format!(
                "expected '{}', found '{}'",
                expected as char, b as char
            )));
        }
        Ok(())
    }

    pub fn expect_str(&mut self, expected: &[u8]) -> Result<(), ParseError> {
        for &b in expected {
            self.expect_byte(b)?;
        }
        Ok(())
    }

    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.input[self.pos.min(self.input.len())..].starts_with(s)
    }

    // -- Whitespace --

    /// Skips whitespace characters. Returns `true` if any were consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.peek() {
            self.advance(1);
        }
        self.pos > start
    }

    pub fn skip_whitespace_required(&mut self) -> Result<(), ParseError> {
        if !self.skip_whitespace() {
            return Err(self.fatal("whitespace required"));
        }
        Ok(())
    }

    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.advance(1);
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    // -- Name parsing (XML 1.0 §2.3) --

    /// Parses an XML `Name` per XML 1.0 §2.3 production `[5]`.
    pub fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let first = self
            .peek_char()
            .ok_or_else(|| self.fatal("expected name, found end of input"))?;
        if !is_name_start_char(first) {
            return Err(self.fatal(format!("invalid name start character: '{first}'")));
        }
        self.advance_char(first);

        while let Some(ch) = self.peek_char() {
            if !is_name_char(ch) {
                break;
            }
            self.advance_char(ch);
        }

        let len = self.pos - start;
        if len > self.max_name_length {
            return Err(self.fatal(format!(
                "name length ({len}) exceeds maximum ({})",
                self.max_name_length
            )));
        }

        std::str::from_utf8(&self.input[start..self.pos])
            .map(str::to_string)
            .map_err(|_| self.fatal("invalid UTF-8 in name"))
    }

    // -- Reference parsing (XML 1.0 §4.1) --

    /// Parses `&name;`, `&#N;` or `&#xH;` and returns the replacement text.
    /// Only the five predefined entities are known.
    pub fn parse_reference(&mut self) -> Result<String, ParseError> {
        self.expect_byte(b'&')?;

        if self.peek() == Some(b'#') {
            self.advance(1);
            let value = if self.peek() == Some(b'x') {
                self.advance(1);
                let hex = self.take_while(|b| b.is_ascii_hexdigit());
                u32::from_str_radix(&hex, 16)
                    .map_err(|_| self.fatal("invalid hex character reference"))?
            } else {
                let dec = self.take_while(|b| b.is_ascii_digit());
                dec.parse::<u32>()
                    .map_err(|_| self.fatal("invalid decimal character reference"))?
            };
            self.expect_byte(b';')?;

            let ch = char::from_u32(value)
                .filter(|&c| is_xml_char(c))
                .ok_or_else(|| {
                    self.fatal(format!("character reference U+{value:04X} is not a valid XML character"))
                })?;
            return Ok(ch.to_string());
        }

        let name = self.parse_name()?;
        self.expect_byte(b';')?;
        match name.as_str() {
            "amp" => Ok("&".to_string()),
            "lt" => Ok("<".to_string()),
            "gt" => Ok(">".to_string()),
            "apos" => Ok("'".to_string()),
            "quot" => Ok("\"".to_string()),
            _ => Err(self.fatal(format!("unknown entity reference: &{name};"))),
        }
    }

    // -- Attribute value parsing (XML 1.0 §3.3.3) --

    /// Parses a quoted attribute value, resolving references and
    /// normalizing literal whitespace to spaces.
    pub fn parse_attribute_value(&mut self) -> Result<String, ParseError> {
        let quote = self.next_byte()?;
        if quote != b'"' && quote != b'\'' {
            return Err(self.fatal("attribute value must be quoted"));
        }

        let mut value = String::new();
        loop {
            let b = self
                .peek()
                .ok_or_else(|| self.fatal("unexpected end of input in attribute value"))?;
            if b == quote {
                self.advance(1);
                break;
            }
            match b {
                b'&' => value.push_str(&self.parse_reference()?),
                b'<' => return Err(self.fatal("'<' not allowed in attribute values")),
                _ => {
                    let ch = self.next_char()?;
                    if matches!(ch, '\n' | '\t') {
                        value.push(' ');
                    } else {
                        value.push(ch);
                    }
                }
            }
        }

        Ok(value)
    }

    /// Parses a quoted literal without reference resolution.
    pub fn parse_quoted_value(&mut self) -> Result<String, ParseError> {
        let quote = self.next_byte()?;
        if quote != b'"' && quote != b'\'' {
            return Err(self.fatal("expected quoted value"));
        }
        let start = self.pos;
        while !self.at_end() && self.peek() != Some(quote) {
            self.advance(1);
        }
        let value = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.fatal("invalid UTF-8 in quoted value"))?
            .to_string();
        self.expect_byte(quote)?;
        Ok(value)
    }

    // -- Error helpers --

    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location(),
            diagnostics: self.diagnostics.clone(),
        }
    }

    pub fn push_diagnostic(&mut self, severity: ErrorSeverity, message: String) {
        self.diagnostics.push(ParseDiagnostic {
            severity,
            message,
            location: self.location(),
        });
    }
}

// -------------------------------------------------------------------------
// Namespace resolver
// -------------------------------------------------------------------------

/// A stack of namespace binding frames mirroring element nesting.
pub(crate) struct NamespaceResolver {
    stack: Vec<Vec<(Option<String>, String)>>,
}

impl NamespaceResolver {
    pub fn new() -> Self {
        let initial = vec![(
            Some("xml".to_string()),
            crate::tree::XML_NAMESPACE.to_string(),
        )];
        Self {
            stack: vec![initial],
        }
    }

    pub fn push_scope(&mut self) {
        self.stack.push(Vec::new());
    }

    pub fn pop_scope(&mut self) {
        self.stack.pop();
    }

    /// Binds a prefix in the current scope; `None` is the default namespace.
    pub fn bind(&mut self, prefix: Option<String>, uri: String) {
        if let Some(frame) = self.stack.last_mut() {
            frame.push((prefix, uri));
        }
    }

    /// Resolves a prefix to its URI. `xmlns=""` undeclares the default.
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        self.stack
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(p, _)| p.as_deref() == prefix)
            .and_then(|(_, uri)| (!uri.is_empty()).then_some(uri.as_str()))
    }
}

// -------------------------------------------------------------------------
// Markup helpers
// -------------------------------------------------------------------------

/// Parses `<!-- ... -->` and returns the content.
pub(crate) fn parse_comment_content(input: &mut ParserInput<'_>) -> Result<String, ParseError> {
    input.expect_str(b"<!--")?;
    let mut content = String::new();
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in comment"));
        }
        if input.looking_at(b"-->") {
            input.advance(3);
            break;
        }
        if input.looking_at(b"--") {
            return Err(input.fatal("'--' not allowed inside comments"));
        }
        content.push(input.next_char()?);
    }
    Ok(content)
}

/// Parses `<![CDATA[ ... ]]>` and returns the content.
pub(crate) fn parse_cdata_content(input: &mut ParserInput<'_>) -> Result<String, ParseError> {
    input.expect_str(b"<![CDATA[")?;
    let mut content = String::new();
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in CDATA section"));
        }
        if input.looking_at(b"]]>") {
            input.advance(3);
            break;
        }
        content.push(input.next_char()?);
    }
    Ok(content)
}

/// Parses `<?target data?>` and returns `(target, data)`.
pub(crate) fn parse_pi_content(
    input: &mut ParserInput<'_>,
) -> Result<(String, Option<String>), ParseError> {
    input.expect_str(b"<?")?;
    let target = input.parse_name()?;
    if target.eq_ignore_ascii_case("xml") {
        return Err(input.fatal("PI target 'xml' is reserved"));
    }

    if !input.skip_whitespace() {
        input.expect_str(b"?>")?;
        return Ok((target, None));
    }
    let mut data = String::new();
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in processing instruction"));
        }
        if input.looking_at(b"?>") {
            input.advance(2);
            break;
        }
        data.push(input.next_char()?);
    }
    Ok((target, (!data.is_empty()).then_some(data)))
}

#[derive(Debug, Clone)]
pub(crate) struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

/// Parses `<?xml version="1.0" ...?>`.
pub(crate) fn parse_xml_decl(input: &mut ParserInput<'_>) -> Result<XmlDeclaration, ParseError> {
    input.expect_str(b"<?xml")?;
    input.skip_whitespace_required()?;

    input.expect_str(b"version")?;
    pseudo_attribute_eq(input)?;
    let version = input.parse_quoted_value()?;
    if !version.starts_with("1.") {
        return Err(input.fatal(format!("unsupported XML version '{version}'")));
    }

    input.skip_whitespace();
    let encoding = if input.looking_at(b"encoding") {
        input.expect_str(b"encoding")?;
        pseudo_attribute_eq(input)?;
        Some(input.parse_quoted_value()?)
    } else {
        None
    };

    input.skip_whitespace();
    let standalone = if input.looking_at(b"standalone") {
        input.expect_str(b"standalone")?;
        pseudo_attribute_eq(input)?;
        match input.parse_quoted_value()?.as_str() {
            "yes" => Some(true),
            "no" => Some(false),
            _ => return Err(input.fatal("standalone must be 'yes' or 'no'")),
        }
    } else {
        None
    };

    input.skip_whitespace();
    input.expect_str(b"?>")?;

    Ok(XmlDeclaration {
        version,
        encoding,
        standalone,
    })
}

fn pseudo_attribute_eq(input: &mut ParserInput<'_>) -> Result<(), ParseError> {
    input.skip_whitespace();
    input.expect_byte(b'=')?;
    input.skip_whitespace();
    Ok(())
}

/// Skips a DOCTYPE internal subset `[ ... ]`, honouring quoted literals
/// and comments. The opening `[` must be the next byte.
pub(crate) fn skip_internal_subset(input: &mut ParserInput<'_>) -> Result<(), ParseError> {
    input.expect_byte(b'[')?;
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in DOCTYPE internal subset"));
        }
        if input.looking_at(b"<!--") {
            parse_comment_content(input)?;
            continue;
        }
        match input.peek() {
            Some(b']') => {
                input.advance(1);
                return Ok(());
            }
            Some(b'"' | b'\'') => {
                input.parse_quoted_value()?;
            }
            _ => {
                input.next_char()?;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_column_tracking() {
        let mut input = ParserInput::new("ab\ncd");
        input.advance(3);
        assert_eq!(input.location().line, 2);
        assert_eq!(input.location().column, 1);
        assert_eq!(input.location().byte_offset, 3);
    }

    #[test]
    fn test_next_char_normalizes_crlf() {
        let mut input = ParserInput::new("\r\nx");
        assert_eq!(input.next_char().unwrap(), '\n');
        assert_eq!(input.next_char().unwrap(), 'x');
    }

    #[test]
    fn test_parse_name_and_limit() {
        let mut input = ParserInput::new("c:wing rest");
        assert_eq!(input.parse_name().unwrap(), "c:wing");

        let mut input = ParserInput::new("abcdef");
        input.set_max_name_length(3);
        assert!(input.parse_name().is_err());
    }

    #[test]
    fn test_parse_reference_kinds() {
        for (src, expected) in [("&amp;", "&"), ("&#65;", "A"), ("&#x42;", "B"), ("&quot;", "\"")] {
            let mut input = ParserInput::new(src);
            assert_eq!(input.parse_reference().unwrap(), expected);
        }
        let mut input = ParserInput::new("&nbsp;");
        assert!(input.parse_reference().is_err());
        let mut input = ParserInput::new("&#0;");
        assert!(input.parse_reference().is_err());
    }

    #[test]
    fn test_attribute_value_normalizes_whitespace() {
        let mut input = ParserInput::new("\"a\tb\nc &lt;\"");
        assert_eq!(input.parse_attribute_value().unwrap(), "a b c <");
    }

    #[test]
    fn test_namespace_resolver_scopes() {
        let mut ns = NamespaceResolver::new();
        ns.push_scope();
        ns.bind(Some("c".into()), "urn:c".into());
        ns.bind(None, "urn:d".into());
        ns.push_scope();
        ns.bind(None, String::new());
        assert_eq!(ns.resolve(Some("c")), Some("urn:c"));
        assert_eq!(ns.resolve(None), None);
        ns.pop_scope();
        assert_eq!(ns.resolve(None), Some("urn:d"));
        assert_eq!(ns.resolve(Some("xml")), Some(crate::tree::XML_NAMESPACE));
    }

    #[test]
    fn test_markup_helpers() {
        let mut input = ParserInput::new("<!-- hi -->");
        assert_eq!(parse_comment_content(&mut input).unwrap(), " hi ");

        let mut input = ParserInput::new("<![CDATA[<a>]]>");
        assert_eq!(parse_cdata_content(&mut input).unwrap(), "<a>");

        let mut input = ParserInput::new("<?tool run it?>");
        let (target, data) = parse_pi_content(&mut input).unwrap();
        assert_eq!(target, "tool");
        assert_eq!(data.as_deref(), Some("run it"));
    }

    #[test]
    fn test_parse_xml_decl() {
        let mut input = ParserInput::new("<?xml version=\"1.0\" encoding='utf-8' standalone=\"no\"?>");
        let decl = parse_xml_decl(&mut input).unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.encoding.as_deref(), Some("utf-8"));
        assert_eq!(decl.standalone, Some(false));
    }

    #[test]
    fn test_skip_internal_subset() {
        let mut input = ParserInput::new("[<!ENTITY x \"]\"><!-- ] -->]>");
        skip_internal_subset(&mut input).unwrap();
        assert!(input.looking_at(b">"));
    }
}
