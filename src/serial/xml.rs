//! XML serializer.
//!
//! Writes a `Document` (or a single subtree) back to XML text. With
//! `indent` enabled, element-only content is placed on separate lines;
//! elements holding text are written inline so their values are kept
//! byte for byte.

use crate::tree::{Document, NodeId, NodeKind};

/// Options controlling XML serialization output.
///
/// # Examples
///
/// ```
/// use tixi::Document;
/// use tixi::serial::{serialize_with_options, SerializeOptions};
///
/// let doc = Document::parse_str("<a><b>1</b></a>").unwrap();
/// let xml = serialize_with_options(&doc, &SerializeOptions::default().indent(true));
/// assert_eq!(xml, "<?xml version=\"1.0\"?>\n<a>\n  <b>1</b>\n</a>\n");
/// ```
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Whether to produce indented output. Defaults to `false`.
    pub indent: bool,
    /// The string written per nesting level. Defaults to two spaces.
    pub indent_str: String,
    /// Encoding written into the XML declaration. Falls back to the
    /// document's own declared encoding when `None`.
    pub encoding: Option<String>,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: false,
            indent_str: "  ".to_string(),
            encoding: None,
        }
    }
}

impl SerializeOptions {
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }

    /// Sets the encoding name written into the XML declaration.
    #[must_use]
    pub fn encoding(mut self, encoding: &str) -> Self {
        self.encoding = Some(encoding.to_string());
        self
    }
}

/// Serializes a document with default options.
#[must_use]
pub fn serialize(doc: &Document) -> String {
    serialize_with_options(doc, &SerializeOptions::default())
}

/// Serializes a document: the XML declaration, then each top-level node
/// on its own line.
#[must_use]
pub fn serialize_with_options(doc: &Document, options: &SerializeOptions) -> String {
    let mut out = String::new();

    let version = doc.version.as_deref().unwrap_or("1.0");
    out.push_str("<?xml version=\"");
    out.push_str(version);
    out.push('"');
    if let Some(encoding) = options.encoding.as_ref().or(doc.encoding.as_ref()) {
        out.push_str(" encoding=\"");
        out.push_str(encoding);
        out.push('"');
    }
    if let Some(standalone) = doc.standalone {
        out.push_str(" standalone=\"");
        out.push_str(if standalone { "yes" } else { "no" });
        out.push('"');
    }
    out.push_str("?>\n");

    let writer = Writer { doc, options };
    for child in doc.children(doc.root()) {
        writer.node(child, &mut out, 0, false);
        out.push('\n');
    }
    out
}

/// Serializes a single node and its subtree, without a declaration.
#[must_use]
pub fn serialize_node(doc: &Document, id: NodeId, options: &SerializeOptions) -> String {
    let mut out = String::new();
    Writer { doc, options }.node(id, &mut out, 0, false);
    out
}

struct Writer<'a> {
    doc: &'a Document,
    options: &'a SerializeOptions,
}

impl Writer<'_> {
    /// Indentation is only safe when no child carries character data.
    fn is_element_only(&self, id: NodeId) -> bool {
        let mut has_markup = false;
        for child in self.doc.children(id) {
            match &self.doc.node(child).kind {
                NodeKind::Text { content } if !content.trim().is_empty() => return false,
                NodeKind::CData { .. } => return false,
                NodeKind::Text { .. } => {}
                _ => has_markup = true,
            }
        }
        has_markup
    }

    fn pad(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str(&self.options.indent_str);
        }
    }

    fn node(&self, id: NodeId, out: &mut String, depth: usize, formatted: bool) {
        let indent = self.options.indent && formatted;
        match &self.doc.node(id).kind {
            NodeKind::Element {
                name,
                prefix,
                namespaces,
                attributes,
                ..
            } => {
                if indent {
                    self.pad(out, depth);
                }
                out.push('<');
                if let Some(pfx) = prefix {
                    out.push_str(pfx);
                    out.push(':');
                }
                out.push_str(name);

                for decl in namespaces {
                    out.push_str(" xmlns");
                    if let Some(p) = &decl.prefix {
                        out.push(':');
                        out.push_str(p);
                    }
                    out.push_str("=\"");
                    write_escaped_attr(out, &decl.uri);
                    out.push('"');
                }
                for attr in attributes {
                    out.push(' ');
                    if let Some(pfx) = &attr.prefix {
                        out.push_str(pfx);
                        out.push(':');
                    }
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    write_escaped_attr(out, &attr.value);
                    out.push('"');
                }

                if self.doc.first_child(id).is_none() {
                    out.push_str("/>");
                } else {
                    out.push('>');
                    let element_only = self.options.indent && self.is_element_only(id);
                    if element_only {
                        out.push('\n');
                    }
                    for child in self.doc.children(id) {
                        if element_only && matches!(self.doc.node(child).kind, NodeKind::Text { .. })
                        {
                            continue;
                        }
                        self.node(child, out, depth + 1, element_only);
                    }
                    if element_only {
                        self.pad(out, depth);
                    }
                    out.push_str("</");
                    if let Some(pfx) = prefix {
                        out.push_str(pfx);
                        out.push(':');
                    }
                    out.push_str(name);
                    out.push('>');
                }
            }
            NodeKind::Text { content } => write_escaped_text(out, content),
            NodeKind::CData { content } => {
                out.push_str("<![CDATA[");
                out.push_str(content);
                out.push_str("]]>");
            }
            NodeKind::Comment { content } => {
                if indent {
                    self.pad(out, depth);
                }
                out.push_str("<!--");
                out.push_str(content);
                out.push_str("-->");
            }
            NodeKind::ProcessingInstruction { target, data } => {
                if indent {
                    self.pad(out, depth);
                }
                out.push_str("<?");
                out.push_str(target);
                if let Some(d) = data {
                    out.push(' ');
                    out.push_str(d);
                }
                out.push_str("?>");
            }
            NodeKind::DocumentType {
                name,
                system_id,
                public_id,
            } => {
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                match (public_id, system_id) {
                    (Some(p), Some(s)) => {
                        out.push_str(&format!(" PUBLIC \"{p}\" \"{s}\""));
                    }
                    (None, Some(s)) => out.push_str(&format!(" SYSTEM \"{s}\"")),
                    _ => {}
                }
                out.push('>');
            }
            NodeKind::Document => {
                for child in self.doc.children(id) {
                    self.node(child, out, depth, false);
                    out.push('\n');
                }
            }
        }
        if indent && !matches!(self.doc.node(id).kind, NodeKind::Text { .. }) {
            out.push('\n');
        }
    }
}

/// Escapes character data.
pub(crate) fn write_escaped_text(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes an attribute value for a double-quoted literal.
pub(crate) fn write_escaped_attr(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\r' => out.push_str("&#13;"),
            '\n' => out.push_str("&#10;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pretty() -> SerializeOptions {
        SerializeOptions::default().indent(true)
    }

    #[test]
    fn test_compact_output() {
        let doc = Document::parse_str("<a><b x=\"1\">t</b><c/></a>").unwrap();
        assert_eq!(
            serialize(&doc),
            "<?xml version=\"1.0\"?>\n<a><b x=\"1\">t</b><c/></a>\n"
        );
    }

    #[test]
    fn test_pretty_output_nested() {
        let doc = Document::parse_str("<a><b><c>1</c><d/></b><!--n--></a>").unwrap();
        assert_eq!(
            serialize_with_options(&doc, &pretty()),
            "<?xml version=\"1.0\"?>\n<a>\n  <b>\n    <c>1</c>\n    <d/>\n  </b>\n  <!--n-->\n</a>\n"
        );
    }

    #[test]
    fn test_mixed_content_is_not_indented() {
        let doc = Document::parse_str("<a>x<b/>y</a>").unwrap();
        assert_eq!(
            serialize_with_options(&doc, &pretty()),
            "<?xml version=\"1.0\"?>\n<a>x<b/>y</a>\n"
        );
    }

    #[test]
    fn test_encoding_override_and_escaping() {
        let doc = Document::parse_str("<a k=\"&quot;&lt;\">1 &amp; 2 &gt; 0</a>").unwrap();
        let xml = serialize_with_options(&doc, &SerializeOptions::default().encoding("utf-8"));
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<a k=\"&quot;&lt;\">1 &amp; 2 &gt; 0</a>\n"
        );
    }

    #[test]
    fn test_namespace_declarations_come_first() {
        let doc = Document::parse_str(r#"<c:a k="v" xmlns:c="urn:c"/>"#).unwrap();
        assert_eq!(
            serialize(&doc),
            "<?xml version=\"1.0\"?>\n<c:a xmlns:c=\"urn:c\" k=\"v\"/>\n"
        );
    }

    #[test]
    fn test_serialize_subtree() {
        let doc = Document::parse_str("<a><b><c>1</c></b></a>").unwrap();
        let b = doc.first_child(doc.root_element().unwrap()).unwrap();
        assert_eq!(serialize_node(&doc, b, &pretty()), "<b>\n  <c>1</c>\n</b>");
        assert_eq!(
            serialize_node(&doc, b, &SerializeOptions::default()),
            "<b><c>1</c></b>"
        );
    }
}
