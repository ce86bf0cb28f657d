//! Node type definitions.
//!
//! `NodeKind` carries the per-type payload of a node. Navigation links
//! (parent, children, siblings) live in `NodeData`, not here.

use super::{Attribute, NamespaceDecl};

/// The kind of an XML node and its associated data.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document,

    /// An element node, e.g. `<wing uID="w1">`.
    Element {
        /// The element's local name.
        name: String,
        /// Namespace prefix (e.g. `"c"` in `c:wing`), if any.
        prefix: Option<String>,
        /// Namespace URI, if the element is in a namespace.
        namespace: Option<String>,
        /// `xmlns` / `xmlns:p` declarations made on this element.
        namespaces: Vec<NamespaceDecl>,
        /// Attributes on this element, excluding namespace declarations.
        attributes: Vec<Attribute>,
    },

    /// Character data.
    Text { content: String },

    /// A CDATA section. Content is stored without escaping.
    CData { content: String },

    /// A comment, without the `<!--` and `-->` delimiters.
    Comment { content: String },

    /// A processing instruction, e.g. `<?target data?>`.
    ProcessingInstruction {
        target: String,
        data: Option<String>,
    },

    /// A `<!DOCTYPE ...>` declaration. Any internal subset is discarded.
    DocumentType {
        name: String,
        system_id: Option<String>,
        public_id: Option<String>,
    },
}

impl NodeKind {
    /// Creates an element payload with no namespace and no attributes.
    #[must_use]
    pub fn element(name: impl Into<String>) -> Self {
        Self::Element {
            name: name.into(),
            prefix: None,
            namespace: None,
            namespaces: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Creates a text payload.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Returns the DOM node type name, e.g. `ELEMENT_NODE`.
    #[must_use]
    pub fn dom_type_name(&self) -> &'static str {
        match self {
            Self::Document => "DOCUMENT_NODE",
            Self::Element { .. } => "ELEMENT_NODE",
            Self::Text { .. } => "TEXT_NODE",
            Self::CData { .. } => "CDATA_SECTION_NODE",
            Self::Comment { .. } => "COMMENT_NODE",
            Self::ProcessingInstruction { .. } => "PROCESSING_INSTRUCTION_NODE",
            Self::DocumentType { .. } => "DOCUMENT_TYPE_NODE",
        }
    }
}
