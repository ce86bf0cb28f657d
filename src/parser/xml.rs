//! Recursive descent parser for XML 1.0 documents.

use crate::error::{ErrorSeverity, ParseError};
use crate::tree::{split_qname, Attribute, Document, NamespaceDecl, NodeId, NodeKind};

use super::input::{
    parse_cdata_content, parse_comment_content, parse_pi_content, parse_xml_decl,
    skip_internal_subset, NamespaceResolver, ParserInput,
};
use super::ParseOptions;

pub(crate) struct XmlParser<'a> {
    input: ParserInput<'a>,
    doc: Document,
    options: ParseOptions,
    ns: NamespaceResolver,
}

impl<'a> XmlParser<'a> {
    pub fn new(input: &'a str, options: &ParseOptions) -> Self {
        let mut pi = ParserInput::new(input);
        pi.set_max_depth(options.max_depth);

        Self {
            input: pi,
            doc: Document::new(),
            options: options.clone(),
            ns: NamespaceResolver::new(),
        }
    }

    /// Parses the entire document.
    pub fn parse(&mut self) -> Result<Document, ParseError> {
        if self.input.looking_at(b"<?xml")
            && self
                .input
                .peek_at(5)
                .is_some_and(|b| b.is_ascii_whitespace())
        {
            let decl = parse_xml_decl(&mut self.input)?;
            self.doc.version = Some(decl.version);
            self.doc.encoding = decl.encoding;
            self.doc.standalone = decl.standalone;
        }

        let root = self.doc.root();
        self.parse_misc(root)?;

        if self.input.looking_at(b"<!DOCTYPE") {
            self.parse_doctype(root)?;
            self.parse_misc(root)?;
        }

        if self.input.peek() == Some(b'<') {
            self.parse_element(root)?;
        } else {
            return Err(self.input.fatal("missing root element"));
        }

        self.parse_misc(root)?;
        if !self.input.at_end() {
            return Err(self.input.fatal("content after document element"));
        }

        self.doc.diagnostics = std::mem::take(&mut self.input.diagnostics);
        Ok(std::mem::take(&mut self.doc))
    }

    /// Comments, PIs and whitespace outside the root element. Whitespace at
    /// document level never produces text nodes.
    fn parse_misc(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            self.input.skip_whitespace();
            if self.input.looking_at(b"<!--") {
                self.parse_comment(parent)?;
            } else if self.input.looking_at(b"<?") {
                self.parse_processing_instruction(parent)?;
            } else {
                return Ok(());
            }
        }
    }

    // --- DOCTYPE ---
    // See XML 1.0 §2.8: [28] doctypedecl

    fn parse_doctype(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.input.expect_str(b"<!DOCTYPE")?;
        self.input.skip_whitespace_required()?;
        let name = self.input.parse_name()?;
        self.input.skip_whitespace();

        let (mut public_id, mut system_id) = (None, None);
        if self.input.looking_at(b"SYSTEM") {
            self.input.advance(6);
            self.input.skip_whitespace_required()?;
            system_id = Some(self.input.parse_quoted_value()?);
        } else if self.input.looking_at(b"PUBLIC") {
            self.input.advance(6);
            self.input.skip_whitespace_required()?;
            public_id = Some(self.input.parse_quoted_value()?);
            self.input.skip_whitespace_required()?;
            system_id = Some(self.input.parse_quoted_value()?);
        }
        self.input.skip_whitespace();

        if self.input.peek() == Some(b'[') {
            skip_internal_subset(&mut self.input)?;
            self.input.push_diagnostic(
                ErrorSeverity::Warning,
                format!("internal subset of DOCTYPE '{name}' ignored"),
            );
            self.input.skip_whitespace();
        }
        self.input.expect_byte(b'>')?;

        let id = self.doc.create_node(NodeKind::DocumentType {
            name,
            system_id,
            public_id,
        });
        self.doc.append_child(parent, id);
        Ok(())
    }

    // --- Elements ---
    // See XML 1.0 §3.1: [39] element

    fn parse_element(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        self.input.increment_depth()?;
        self.input.expect_byte(b'<')?;
        let qname = self.input.parse_name()?;

        let mut attributes: Vec<Attribute> = Vec::new();
        let mut namespaces: Vec<NamespaceDecl> = Vec::new();
        loop {
            let had_ws = self.input.skip_whitespace();
            if self.input.peek() == Some(b'>') || self.input.looking_at(b"/>") {
                break;
            }
            if !had_ws {
                return Err(self.input.fatal("whitespace required between attributes"));
            }
            let (name, value) = self.parse_attribute()?;
            if name == "xmlns" {
                namespaces.push(NamespaceDecl {
                    prefix: None,
                    uri: value,
                });
            } else if let Some(p) = name.strip_prefix("xmlns:") {
                if value.is_empty() {
                    return Err(self
                        .input
                        .fatal(format!("namespace prefix '{p}' cannot be undeclared")));
                }
                namespaces.push(NamespaceDecl {
                    prefix: Some(p.to_string()),
                    uri: value,
                });
            } else {
                if attributes.iter().any(|a| a.matches_qname(&name)) {
                    return Err(self
                        .input
                        .fatal(format!("duplicate attribute: '{name}'")));
                }
                attributes.push(Attribute::new(&name, value));
            }
        }

        self.ns.push_scope();
        for decl in &namespaces {
            self.ns.bind(decl.prefix.clone(), decl.uri.clone());
        }

        let (prefix, local) = split_qname(&qname);
        let namespace = self.resolve_prefix(prefix, &qname);
        for attr in &mut attributes {
            if let Some(p) = attr.prefix.clone() {
                attr.namespace = self.resolve_prefix(Some(&p), &attr.qualified_name());
            }
        }

        let elem_id = self.doc.create_node(NodeKind::Element {
            name: local.to_string(),
            prefix: prefix.map(str::to_string),
            namespace,
            namespaces,
            attributes,
        });
        self.doc.append_child(parent, elem_id);

        if self.input.looking_at(b"/>") {
            self.input.advance(2);
        } else {
            self.input.expect_byte(b'>')?;
            self.parse_content(elem_id)?;

            self.input.expect_str(b"</")?;
            let end_name = self.input.parse_name()?;
            if end_name != qname {
                return Err(self.input.fatal(format!(
                    "mismatched end tag: expected </{qname}>, found </{end_name}>"
                )));
            }
            self.input.skip_whitespace();
            self.input.expect_byte(b'>')?;
        }

        self.ns.pop_scope();
        self.input.decrement_depth();
        Ok(elem_id)
    }

    /// Resolves a prefix in the current scope. An undeclared prefix is a
    /// namespace error, not a well-formedness error, so it only warns.
    fn resolve_prefix(&mut self, prefix: Option<&str>, qname: &str) -> Option<String> {
        let uri = self.ns.resolve(prefix).map(str::to_string);
        if let (Some(p), None) = (prefix, &uri) {
            self.input.push_diagnostic(
                ErrorSeverity::Warning,
                format!("namespace prefix '{p}' on '{qname}' is not defined"),
            );
        }
        uri
    }

    // --- Content ---
    // See XML 1.0 §3.1: [43] content

    fn parse_content(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            if self.input.at_end() {
                return Err(self
                    .input
                    .fatal("unexpected end of input in element content"));
            }
            if self.input.looking_at(b"</") {
                return Ok(());
            }

            if self.input.looking_at(b"<![CDATA[") {
                let content = parse_cdata_content(&mut self.input)?;
                let id = self.doc.create_node(NodeKind::CData { content });
                self.doc.append_child(parent, id);
            } else if self.input.looking_at(b"<!--") {
                self.parse_comment(parent)?;
            } else if self.input.looking_at(b"<?") {
                self.parse_processing_instruction(parent)?;
            } else if self.input.peek() == Some(b'<') {
                self.parse_element(parent)?;
            } else {
                self.parse_char_data(parent)?;
            }
        }
    }

    // --- Character Data ---
    // See XML 1.0 §2.4: [14] CharData

    fn parse_char_data(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let mut text = String::new();

        while let Some(b) = self.input.peek() {
            match b {
                b'<' => break,
                b'&' => text.push_str(&self.input.parse_reference()?),
                b']' if self.input.looking_at(b"]]>") => {
                    return Err(self.input.fatal("']]>' not allowed in character data"));
                }
                _ => text.push(self.input.next_char()?),
            }
        }

        // A blank run is only kept when it is the whole content of its element.
        let blank = text.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
        if self.options.no_blanks
            && blank
            && (self.doc.first_child(parent).is_some() || !self.input.looking_at(b"</"))
        {
            return Ok(());
        }

        if !text.is_empty() {
            let id = self.doc.create_node(NodeKind::Text { content: text });
            self.doc.append_child(parent, id);
        }
        Ok(())
    }

    // --- Attributes ---
    // See XML 1.0 §3.1: [41] Attribute

    fn parse_attribute(&mut self) -> Result<(String, String), ParseError> {
        let name = self.input.parse_name()?;
        self.input.skip_whitespace();
        self.input.expect_byte(b'=')?;
        self.input.skip_whitespace();
        let value = self.input.parse_attribute_value()?;
        Ok((name, value))
    }

    fn parse_comment(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let content = parse_comment_content(&mut self.input)?;
        let id = self.doc.create_node(NodeKind::Comment { content });
        self.doc.append_child(parent, id);
        Ok(())
    }

    fn parse_processing_instruction(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let (target, data) = parse_pi_content(&mut self.input)?;
        let id = self
            .doc
            .create_node(NodeKind::ProcessingInstruction { target, data });
        self.doc.append_child(parent, id);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::{parse_str, parse_str_with_options};
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Document {
        parse_str(input).unwrap()
    }

    #[test]
    fn test_parse_nested_with_text_and_attributes() {
        let doc = parse(r#"<?xml version="1.0"?><a x='1' y="2"><b>hi &amp; bye</b><c/></a>"#);
        let a = doc.root_element().unwrap();
        assert_eq!(doc.node_name(a), Some("a"));
        assert_eq!(doc.attribute(a, "x"), Some("1"));
        assert_eq!(doc.attribute(a, "y"), Some("2"));
        let kids: Vec<_> = doc.children(a).collect();
        assert_eq!(kids.len(), 2);
        assert_eq!(doc.text_content(kids[0]), "hi & bye");
        assert_eq!(doc.version.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_comment_cdata_pi() {
        let doc = parse("<a><!--c--><![CDATA[<raw>]]><?pi d?></a>");
        let a = doc.root_element().unwrap();
        let kinds: Vec<_> = doc
            .children(a)
            .map(|c| doc.node(c).kind.dom_type_name())
            .collect();
        assert_eq!(
            kinds,
            vec!["COMMENT_NODE", "CDATA_SECTION_NODE", "PROCESSING_INSTRUCTION_NODE"]
        );
    }

    #[test]
    fn test_namespace_declarations_are_not_attributes() {
        let doc = parse(r#"<c:a xmlns:c="urn:c" xmlns="urn:d" c:k="v" n="m"><b/></c:a>"#);
        let a = doc.root_element().unwrap();
        assert_eq!(doc.attributes(a).len(), 2);
        assert_eq!(doc.namespace_decls(a).len(), 2);
        assert_eq!(doc.node_namespace(a), Some("urn:c"));
        assert_eq!(doc.attributes(a)[0].namespace.as_deref(), Some("urn:c"));
        let b = doc.first_child(a).unwrap();
        assert_eq!(doc.node_namespace(b), Some("urn:d"));
    }

    #[test]
    fn test_undeclared_prefix_warns() {
        let doc = parse("<p:a/>");
        let a = doc.root_element().unwrap();
        assert_eq!(doc.node_prefix(a), Some("p"));
        assert_eq!(doc.node_namespace(a), None);
        assert_eq!(doc.diagnostics.len(), 1);
    }

    #[test]
    fn test_no_blanks_keeps_whitespace_only_content() {
        let opts = ParseOptions::default().no_blanks(true);
        let doc = parse_str_with_options("<a>\n  <b>  </b>\n  <c>x</c>\n</a>", &opts).unwrap();
        let a = doc.root_element().unwrap();
        let kids: Vec<_> = doc.children(a).collect();
        assert_eq!(kids.len(), 2);
        assert_eq!(doc.text_content(kids[0]), "  ");

        let keep = parse("<a>\n  <b/>\n</a>");
        let a = keep.root_element().unwrap();
        assert_eq!(keep.children(a).count(), 3);
    }

    #[test]
    fn test_doctype_is_recorded() {
        let doc = parse(r#"<!DOCTYPE a SYSTEM "a.dtd" [<!ELEMENT a ANY>]><a/>"#);
        let first = doc.first_child(doc.root()).unwrap();
        assert!(matches!(
            &doc.node(first).kind,
            NodeKind::DocumentType { name, system_id: Some(s), .. } if name == "a" && s == "a.dtd"
        ));
    }

    #[test]
    fn test_well_formedness_errors() {
        for bad in [
            "",
            "<a>",
            "<a></b>",
            "<a x='1' x='2'/>",
            "<a/><b/>",
            "<a>]]></a>",
            "<a>&unknown;</a>",
            "text",
        ] {
            assert!(parse_str(bad).is_err(), "expected error for {bad:?}");
        }
    }

    #[test]
    fn test_error_location() {
        let err = parse_str("<a>\n<b></c></a>").unwrap_err();
        assert_eq!(err.location.line, 2);
    }

    #[test]
    fn test_depth_limit() {
        let opts = ParseOptions::default().max_depth(2);
        assert!(parse_str_with_options("<a><b><c/></b></a>", &opts).is_err());
        assert!(parse_str_with_options("<a><b/></a>", &opts).is_ok());
    }
}
