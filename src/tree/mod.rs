//! Arena-based XML document tree.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the `Document`
//! and are referenced by `NodeId`, a newtype over `NonZeroU32`. Links
//! (parent, first\_child, last\_child, next\_sibling, prev\_sibling) are
//! arena indices, so the tree can be edited freely without reference
//! counting. Detached nodes stay allocated until the document is dropped.
//!
//! Namespace declarations are stored per element, separately from the
//! attribute list, so attribute counts and indices never see `xmlns`.

mod node;

pub use node::NodeKind;

use std::collections::HashMap;
use std::num::NonZeroU32;

use crate::error::{ParseDiagnostic, ParseError};
use crate::parser::ParseOptions;

/// The namespace URI bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A typed index into the document's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The local part of the attribute name.
    pub name: String,
    pub value: String,
    pub prefix: Option<String>,
    /// Namespace URI resolved from `prefix`, if any.
    pub namespace: Option<String>,
}

impl Attribute {
    /// Creates an attribute from a possibly prefixed name.
    #[must_use]
    pub fn new(qname: &str, value: impl Into<String>) -> Self {
        let (prefix, local) = split_qname(qname);
        Self {
            name: local.to_string(),
            value: value.into(),
            prefix: prefix.map(str::to_string),
            namespace: None,
        }
    }

    /// Returns `prefix:name`, or just `name` when unprefixed.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{p}:{}", self.name),
            None => self.name.clone(),
        }
    }

    pub(crate) fn matches_qname(&self, qname: &str) -> bool {
        match &self.prefix {
            None => self.name == qname,
            Some(p) => {
                qname.len() == p.len() + 1 + self.name.len()
                    && qname.starts_with(p.as_str())
                    && qname[p.len()..].starts_with(':')
                    && qname.ends_with(self.name.as_str())
            }
        }
    }
}

/// A namespace declaration made on an element. `prefix == None` is the
/// default namespace (`xmlns="..."`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    pub prefix: Option<String>,
    pub uri: String,
}

/// Splits `"p:local"` into `(Some("p"), "local")`.
#[must_use]
pub fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.find(':') {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

/// Returns `true` if `name` is a valid XML `Name` with at most one colon
/// that neither starts nor ends the name.
#[must_use]
pub fn is_valid_qname(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !crate::parser::is_name_start_char(first) || first == ':' {
        return false;
    }
    if !chars.all(crate::parser::is_name_char) {
        return false;
    }
    name.matches(':').count() <= 1 && !name.ends_with(':')
}

/// An XML document.
///
/// The `Document` owns every node in an arena. Navigation goes through
/// `&Document`, mutation through `&mut Document`.
///
/// # Examples
///
/// ```
/// use tixi::Document;
///
/// let doc = Document::parse_str("<cpacs><header/></cpacs>").unwrap();
/// let root = doc.root_element().unwrap();
/// assert_eq!(doc.node_name(root), Some("cpacs"));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    /// The node arena. Index 0 is a placeholder for `NonZeroU32`.
    nodes: Vec<NodeData>,
    root: NodeId,
    /// XML version from the declaration.
    pub version: Option<String>,
    /// Encoding from the declaration.
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
    /// Warnings collected while parsing.
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl Document {
    /// Creates a new document containing only the document node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(NodeData::new(NodeKind::Document));
        nodes.push(NodeData::new(NodeKind::Document));
        Self {
            nodes,
            root: NodeId::from_index(1),
            version: None,
            encoding: None,
            standalone: None,
            diagnostics: Vec::new(),
        }
    }

    /// Parses an XML string with default options.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not well-formed XML.
    pub fn parse_str(input: &str) -> Result<Self, ParseError> {
        Self::parse_str_with_options(input, &ParseOptions::default())
    }

    /// Parses an XML string with the given options.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not well-formed XML.
    pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Result<Self, ParseError> {
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
        crate::parser::parse_str_with_options(input, options)
    }

    /// Parses raw bytes, detecting the encoding from a BOM or the XML
    /// declaration and transcoding to UTF-8 first.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the bytes cannot be decoded or the
    /// resulting text is not well-formed XML.
    pub fn parse_bytes_with_options(input: &[u8], options: &ParseOptions) -> Result<Self, ParseError> {
        let text = crate::encoding::decode_to_utf8(input).map_err(|e| ParseError {
            message: e.to_string(),
            location: crate::error::SourceLocation::default(),
            diagnostics: Vec::new(),
        })?;
        Self::parse_str_with_options(&text, options)
    }

    /// Returns the document node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the single top-level element, if present.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root).find(|&id| self.is_element(id))
    }

    /// Returns the `NodeData` for the given node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element { .. })
    }

    /// Returns the local name of an element or the target of a PI.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. }
            | NodeKind::ProcessingInstruction { target: name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns `prefix:name` for elements, or the local name when unprefixed.
    #[must_use]
    pub fn qualified_name(&self, id: NodeId) -> Option<String> {
        match &self.node(id).kind {
            NodeKind::Element {
                name,
                prefix: Some(p),
                ..
            } => Some(format!("{p}:{name}")),
            NodeKind::Element { name, .. } => Some(name.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn node_prefix(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { prefix, .. } => prefix.as_deref(),
            _ => None,
        }
    }

    /// Returns the namespace URI of an element node, if any.
    #[must_use]
    pub fn node_namespace(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    /// Returns the content of a text, CDATA, comment or PI node.
    #[must_use]
    pub fn node_text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { content }
            | NodeKind::Comment { content }
            | NodeKind::CData { content } => Some(content),
            NodeKind::ProcessingInstruction { data, .. } => data.as_deref(),
            _ => None,
        }
    }

    /// Returns the concatenated text of a node and all its descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        match &self.node(id).kind {
            NodeKind::Text { content } | NodeKind::CData { content } => content.clone(),
            NodeKind::Comment { content } => content.clone(),
            NodeKind::ProcessingInstruction { data, .. } => data.clone().unwrap_or_default(),
            _ => {
                let mut buf = String::new();
                for d in self.descendants(id) {
                    if let NodeKind::Text { content } | NodeKind::CData { content } =
                        &self.node(d).kind
                    {
                        buf.push_str(content);
                    }
                }
                buf
            }
        }
    }

    /// Returns the concatenation of the direct text and CDATA children.
    #[must_use]
    pub fn direct_text(&self, id: NodeId) -> String {
        let mut buf = String::new();
        for child in self.children(id) {
            if let NodeKind::Text { content } | NodeKind::CData { content } = &self.node(child).kind
            {
                buf.push_str(content);
            }
        }
        buf
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    /// Returns the attributes of an element node, or an empty slice.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Returns the value of an attribute by its (possibly prefixed) name.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.matches_qname(name))
            .map(|a| a.value.as_str())
    }

    /// Sets an attribute, replacing the value if it already exists.
    /// Returns `false` if `id` is not an element.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let (prefix, _) = split_qname(name);
        let namespace = prefix
            .and_then(|p| self.lookup_namespace(id, Some(p)))
            .map(str::to_string);
        let NodeKind::Element { attributes, .. } = &mut self.node_mut(id).kind else {
            return false;
        };
        if let Some(existing) = attributes.iter_mut().find(|a| a.matches_qname(name)) {
            existing.value = value.to_string();
        } else {
            let mut attr = Attribute::new(name, value);
            attr.namespace = namespace;
            attributes.push(attr);
        }
        true
    }

    /// Removes an attribute. Returns `true` if it existed.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        let NodeKind::Element { attributes, .. } = &mut self.node_mut(id).kind else {
            return false;
        };
        let before = attributes.len();
        attributes.retain(|a| !a.matches_qname(name));
        attributes.len() != before
    }

    // ---------------------------------------------------------------------
    // Namespaces
    // ---------------------------------------------------------------------

    /// Returns the namespace declarations made directly on an element.
    #[must_use]
    pub fn namespace_decls(&self, id: NodeId) -> &[NamespaceDecl] {
        match &self.node(id).kind {
            NodeKind::Element { namespaces, .. } => namespaces,
            _ => &[],
        }
    }

    /// Adds (or overwrites) a namespace declaration on an element.
    pub fn declare_namespace(&mut self, id: NodeId, prefix: Option<&str>, uri: &str) {
        if let NodeKind::Element { namespaces, .. } = &mut self.node_mut(id).kind {
            if let Some(decl) = namespaces.iter_mut().find(|d| d.prefix.as_deref() == prefix) {
                decl.uri = uri.to_string();
            } else {
                namespaces.push(NamespaceDecl {
                    prefix: prefix.map(str::to_string),
                    uri: uri.to_string(),
                });
            }
        }
    }

    /// Resolves a prefix to a URI using the declarations in scope at `id`.
    /// `None` looks up the default namespace.
    #[must_use]
    pub fn lookup_namespace(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        for anc in self.ancestors(id) {
            for decl in self.namespace_decls(anc) {
                if decl.prefix.as_deref() == prefix {
                    return if decl.uri.is_empty() {
                        None
                    } else {
                        Some(decl.uri.as_str())
                    };
                }
            }
        }
        None
    }

    /// Finds an in-scope, unshadowed prefix bound to `uri`. The outer
    /// `Option` is whether one exists; the inner one is `None` for the
    /// default namespace.
    #[must_use]
    pub fn lookup_prefix(&self, id: NodeId, uri: &str) -> Option<Option<String>> {
        for anc in self.ancestors(id) {
            for decl in self.namespace_decls(anc) {
                if decl.uri == uri
                    && self.lookup_namespace(id, decl.prefix.as_deref()) == Some(uri)
                {
                    return Some(decl.prefix.clone());
                }
            }
        }
        None
    }

    /// Puts an element into a namespace under the given prefix.
    pub fn set_element_namespace(&mut self, id: NodeId, prefix: Option<&str>, uri: Option<&str>) {
        if let NodeKind::Element {
            prefix: p,
            namespace,
            ..
        } = &mut self.node_mut(id).kind
        {
            *p = prefix.map(str::to_string);
            *namespace = uri.map(str::to_string);
        }
    }

    /// Renames an element. A prefix in `qname` is kept as the element's
    /// prefix and resolved against the declarations in scope.
    pub fn rename(&mut self, id: NodeId, qname: &str) {
        let (prefix, local) = split_qname(qname);
        let namespace = self.lookup_namespace(id, prefix).map(str::to_string);
        if let NodeKind::Element {
            name,
            prefix: p,
            namespace: ns,
            ..
        } = &mut self.node_mut(id).kind
        {
            *name = local.to_string();
            *p = prefix.map(str::to_string);
            *ns = namespace;
        }
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns the element children of a node called `name` (qualified).
    pub fn child_elements_named<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .filter(move |&c| self.qualified_name(c).is_some_and(|n| n == name))
    }

    /// Returns an iterator over a node and its ancestors.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns an iterator over all descendants of a node (depth-first).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    /// Returns `true` if `ancestor` is a proper ancestor of `id`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).skip(1).any(|a| a == ancestor)
    }

    /// Maps every node reachable from the document node to its position in
    /// document order.
    #[must_use]
    pub fn document_order(&self) -> HashMap<NodeId, usize> {
        let mut order = HashMap::with_capacity(self.nodes.len());
        order.insert(self.root, 0);
        for (i, id) in self.descendants(self.root).enumerate() {
            order.insert(id, i + 1);
        }
        order
    }

    /// Builds an XPath that addresses `id` uniquely, e.g.
    /// `/cpacs/vehicles/aircraft/model[2]`.
    ///
    /// Positional predicates are only added when same-named siblings exist.
    /// Elements in a default namespace are written as `*`.
    #[must_use]
    pub fn node_path(&self, id: NodeId) -> String {
        let mut steps: Vec<String> = Vec::new();
        let mut cur = Some(id);
        while let Some(node) = cur {
            if node == self.root {
                break;
            }
            let (name, generic) = match &self.node(node).kind {
                NodeKind::Element {
                    name,
                    prefix,
                    namespace,
                    ..
                } => match (namespace, prefix) {
                    (Some(_), Some(p)) => (format!("{p}:{name}"), false),
                    (Some(_), None) => ("*".to_string(), true),
                    _ => (name.clone(), false),
                },
                NodeKind::Text { .. } | NodeKind::CData { .. } => ("text()".to_string(), false),
                NodeKind::Comment { .. } => ("comment()".to_string(), false),
                NodeKind::ProcessingInstruction { target, .. } => {
                    (format!("processing-instruction('{target}')"), false)
                }
                NodeKind::Document | NodeKind::DocumentType { .. } => (String::new(), false),
            };
            let index = self.sibling_position(node, generic);
            steps.push(match index {
                Some(i) => format!("{name}[{i}]"),
                None => name,
            });
            cur = self.parent(node);
        }
        if steps.is_empty() {
            return "/".to_string();
        }
        steps.reverse();
        format!("/{}", steps.join("/"))
    }

    /// Path of an attribute node, addressed by element and index.
    #[must_use]
    pub fn attribute_path(&self, element: NodeId, index: usize) -> String {
        let name = self
            .attributes(element)
            .get(index)
            .map(Attribute::qualified_name)
            .unwrap_or_default();
        format!("{}/@{name}", self.node_path(element))
    }

    /// 1-based position among siblings of the same kind and name, or `None`
    /// if the node has no such siblings.
    fn sibling_position(&self, id: NodeId, generic: bool) -> Option<usize> {
        let same = |other: NodeId| -> bool {
            let a = &self.node(id).kind;
            let b = &self.node(other).kind;
            match (a, b) {
                (NodeKind::Element { .. }, NodeKind::Element { .. }) => {
                    generic
                        || (self.node_name(id) == self.node_name(other)
                            && self.node_prefix(id) == self.node_prefix(other))
                }
                (
                    NodeKind::Text { .. } | NodeKind::CData { .. },
                    NodeKind::Text { .. } | NodeKind::CData { .. },
                )
                | (NodeKind::Comment { .. }, NodeKind::Comment { .. }) => true,
                (
                    NodeKind::ProcessingInstruction { target: t1, .. },
                    NodeKind::ProcessingInstruction { target: t2, .. },
                ) => t1 == t2,
                _ => false,
            }
        };
        let mut before = 0;
        let mut sib = self.prev_sibling(id);
        while let Some(s) = sib {
            if same(s) {
                before += 1;
            }
            sib = self.prev_sibling(s);
        }
        if before > 0 {
            return Some(before + 1);
        }
        let mut sib = self.next_sibling(id);
        while let Some(s) = sib {
            if same(s) {
                return Some(1);
            }
            sib = self.next_sibling(s);
        }
        None
    }

    // ---------------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------------

    /// Allocates a new, detached node.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        NodeId::from_index(index)
    }

    /// Appends `child` to the end of `parent`'s child list.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            self.node(child).parent.is_none(),
            "child already has a parent; detach it first"
        );

        self.node_mut(child).parent = Some(parent);

        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
            self.node_mut(parent).last_child = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
            self.node_mut(parent).last_child = Some(child);
        }
    }

    /// Inserts `new_child` before `reference`. Does nothing if `reference`
    /// is detached.
    pub fn insert_before(&mut self, reference: NodeId, new_child: NodeId) {
        debug_assert!(
            self.node(new_child).parent.is_none(),
            "new_child already has a parent; detach it first"
        );
        let Some(parent) = self.node(reference).parent else {
            return;
        };
        self.node_mut(new_child).parent = Some(parent);

        if let Some(prev) = self.node(reference).prev_sibling {
            self.node_mut(prev).next_sibling = Some(new_child);
            self.node_mut(new_child).prev_sibling = Some(prev);
        } else {
            self.node_mut(parent).first_child = Some(new_child);
        }

        self.node_mut(new_child).next_sibling = Some(reference);
        self.node_mut(reference).prev_sibling = Some(new_child);
    }

    /// Inserts `child` so that it becomes the `index`-th child (1-based) of
    /// `parent`, or appends it if `index` is past the end.
    pub fn insert_child_at(&mut self, parent: NodeId, child: NodeId, index: usize) {
        let reference = index
            .checked_sub(1)
            .and_then(|i| self.children(parent).nth(i));
        match reference {
            Some(r) => self.insert_before(r, child),
            None => self.append_child(parent, child),
        }
    }

    /// Replaces `old` with `new` in `old`'s parent.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) {
        self.insert_before(old, new);
        self.detach(old);
    }

    /// Detaches a node from its parent. The node stays allocated.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };

        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }

        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        let data = self.node_mut(id);
        data.parent = None;
        data.prev_sibling = None;
        data.next_sibling = None;
    }

    /// Exchanges the tree positions of two nodes. Neither may be an
    /// ancestor of the other.
    pub fn swap(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        let mark_a = self.create_node(NodeKind::text(""));
        let mark_b = self.create_node(NodeKind::text(""));
        self.insert_before(a, mark_a);
        self.insert_before(b, mark_b);
        self.detach(a);
        self.detach(b);
        self.insert_before(mark_b, a);
        self.insert_before(mark_a, b);
        self.detach(mark_a);
        self.detach(mark_b);
    }

    /// Deep-copies the subtree at `id` within this document. The copy is
    /// detached.
    pub fn duplicate(&mut self, id: NodeId) -> NodeId {
        let copy = self.create_node(self.node(id).kind.clone());
        let kids: Vec<NodeId> = self.children(id).collect();
        for kid in kids {
            let c = self.duplicate(kid);
            self.append_child(copy, c);
        }
        copy
    }

    /// Deep-copies the subtree at `id` of `src` into this document. The
    /// copy is detached.
    pub fn import(&mut self, src: &Document, id: NodeId) -> NodeId {
        let copy = self.create_node(src.node(id).kind.clone());
        for kid in src.children(id) {
            let c = self.import(src, kid);
            self.append_child(copy, c);
        }
        copy
    }

    /// Returns the number of nodes in the arena, detached ones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Iterators
// ---------------------------------------------------------------------------

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Depth-first iterator over all descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        if let Some(sibling) = self.doc.next_sibling(current) {
            self.next = Some(sibling);
            return Some(current);
        }

        let mut ancestor = self.doc.parent(current);
        while let Some(anc) = ancestor {
            if anc == self.root {
                self.next = None;
                return Some(current);
            }
            if let Some(sibling) = self.doc.next_sibling(anc) {
                self.next = Some(sibling);
                return Some(current);
            }
            ancestor = self.doc.parent(anc);
        }

        self.next = None;
        Some(current)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(doc: &mut Document, parent: NodeId, name: &str) -> NodeId {
        let id = doc.create_node(NodeKind::element(name));
        doc.append_child(parent, id);
        id
    }

    #[test]
    fn test_new_document_has_root() {
        let doc = Document::new();
        assert!(matches!(doc.node(doc.root()).kind, NodeKind::Document));
        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.root_element(), None);
    }

    #[test]
    fn test_append_and_navigate() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = element(&mut doc, root, "a");
        let b = element(&mut doc, a, "b");
        let c = element(&mut doc, a, "c");

        assert_eq!(doc.root_element(), Some(a));
        assert_eq!(doc.children(a).collect::<Vec<_>>(), vec![b, c]);
        assert_eq!(doc.next_sibling(b), Some(c));
        assert_eq!(doc.prev_sibling(c), Some(b));
        assert_eq!(doc.ancestors(c).collect::<Vec<_>>(), vec![c, a, root]);
        assert!(doc.is_ancestor(a, c));
        assert!(!doc.is_ancestor(c, a));
        assert!(!doc.is_ancestor(a, a));
    }

    #[test]
    fn test_descendants_stop_at_subtree_root() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = element(&mut doc, root, "a");
        let b = element(&mut doc, a, "b");
        let c = element(&mut doc, a, "c");
        let d = element(&mut doc, b, "d");

        assert_eq!(doc.descendants(a).collect::<Vec<_>>(), vec![b, d, c]);
        assert_eq!(doc.descendants(b).collect::<Vec<_>>(), vec![d]);
        assert!(doc.descendants(d).next().is_none());
    }

    #[test]
    fn test_insert_child_at_index() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = element(&mut doc, root, "p");
        let a = element(&mut doc, p, "a");
        let c = element(&mut doc, p, "c");
        let b = doc.create_node(NodeKind::element("b"));
        doc.insert_child_at(p, b, 2);
        let z = doc.create_node(NodeKind::element("z"));
        doc.insert_child_at(p, z, 99);

        assert_eq!(doc.children(p).collect::<Vec<_>>(), vec![a, b, c, z]);
    }

    #[test]
    fn test_detach_relinks_siblings() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = element(&mut doc, root, "p");
        let a = element(&mut doc, p, "a");
        let b = element(&mut doc, p, "b");
        let c = element(&mut doc, p, "c");

        doc.detach(b);
        assert_eq!(doc.children(p).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(doc.parent(b), None);
        doc.detach(a);
        doc.detach(c);
        assert_eq!(doc.first_child(p), None);
        assert_eq!(doc.last_child(p), None);
    }

    #[test]
    fn test_swap_adjacent_and_distant() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = element(&mut doc, root, "p");
        let a = element(&mut doc, p, "a");
        let b = element(&mut doc, p, "b");
        let q = element(&mut doc, root, "q");
        let c = element(&mut doc, q, "c");

        doc.swap(a, b);
        assert_eq!(doc.children(p).collect::<Vec<_>>(), vec![b, a]);

        doc.swap(a, c);
        assert_eq!(doc.children(p).collect::<Vec<_>>(), vec![b, c]);
        assert_eq!(doc.children(q).collect::<Vec<_>>(), vec![a]);
        assert_eq!(doc.parent(a), Some(q));
    }

    #[test]
    fn test_attributes_set_replace_remove() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = element(&mut doc, root, "wing");
        assert!(doc.set_attribute(e, "uID", "w1"));
        assert!(doc.set_attribute(e, "name", "main"));
        assert!(doc.set_attribute(e, "uID", "w2"));
        assert_eq!(doc.attribute(e, "uID"), Some("w2"));
        assert_eq!(doc.attributes(e).len(), 2);
        assert!(doc.remove_attribute(e, "name"));
        assert!(!doc.remove_attribute(e, "name"));
        assert_eq!(doc.attributes(e).len(), 1);
    }

    #[test]
    fn test_namespace_lookup_walks_ancestors() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = element(&mut doc, root, "a");
        doc.declare_namespace(a, Some("x"), "urn:x");
        doc.declare_namespace(a, None, "urn:default");
        let b = element(&mut doc, a, "b");
        doc.declare_namespace(b, Some("x"), "urn:other");

        assert_eq!(doc.lookup_namespace(b, Some("x")), Some("urn:other"));
        assert_eq!(doc.lookup_namespace(a, Some("x")), Some("urn:x"));
        assert_eq!(doc.lookup_namespace(b, None), Some("urn:default"));
        assert_eq!(doc.lookup_namespace(b, Some("xml")), Some(XML_NAMESPACE));
        assert_eq!(doc.lookup_prefix(b, "urn:x"), None);
        assert_eq!(doc.lookup_prefix(b, "urn:other"), Some(Some("x".into())));
        assert_eq!(doc.lookup_prefix(b, "urn:default"), Some(None));
    }

    #[test]
    fn test_node_path_indexes_only_repeated_names() {
        let doc = Document::parse_str("<a><b/><c/><b><d/></b><!--x--></a>").unwrap();
        let a = doc.root_element().unwrap();
        let kids: Vec<_> = doc.children(a).collect();
        assert_eq!(doc.node_path(a), "/a");
        assert_eq!(doc.node_path(kids[0]), "/a/b[1]");
        assert_eq!(doc.node_path(kids[1]), "/a/c");
        let d = doc.first_child(kids[2]).unwrap();
        assert_eq!(doc.node_path(d), "/a/b[2]/d");
        assert_eq!(doc.node_path(kids[3]), "/a/comment()");
        assert_eq!(doc.node_path(doc.root()), "/");
    }

    #[test]
    fn test_node_path_namespaced() {
        let doc =
            Document::parse_str(r#"<p:a xmlns:p="urn:p"><b xmlns="urn:d"/></p:a>"#).unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();
        assert_eq!(doc.node_path(b), "/p:a/*");
    }

    #[test]
    fn test_import_copies_subtree() {
        let src = Document::parse_str(r#"<x k="v"><y>t</y></x>"#).unwrap();
        let mut dst = Document::new();
        let root = dst.root();
        let copy = dst.import(&src, src.root_element().unwrap());
        dst.append_child(root, copy);
        assert_eq!(dst.attribute(copy, "k"), Some("v"));
        assert_eq!(dst.text_content(copy), "t");

        let dup = dst.duplicate(copy);
        assert_eq!(dst.parent(dup), None);
        assert_eq!(dst.text_content(dup), "t");
    }

    #[test]
    fn test_is_valid_qname() {
        assert!(is_valid_qname("wing"));
        assert!(is_valid_qname("c:wing"));
        assert!(is_valid_qname("_x-1.2"));
        assert!(!is_valid_qname(""));
        assert!(!is_valid_qname("1abc"));
        assert!(!is_valid_qname("a b"));
        assert!(!is_valid_qname("a:b:c"));
        assert!(!is_valid_qname(":a"));
        assert!(!is_valid_qname("a:"));
    }

    #[test]
    fn test_direct_text_ignores_descendants() {
        let doc = Document::parse_str("<a>one<b>two</b><![CDATA[three]]></a>").unwrap();
        let a = doc.root_element().unwrap();
        assert_eq!(doc.direct_text(a), "onethree");
        assert_eq!(doc.text_content(a), "onetwothree");
    }
}
