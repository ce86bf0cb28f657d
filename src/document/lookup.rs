//! Resolving paths and queries to nodes.
//!
//! Every element operation funnels through [`TixiDocument::check_element`],
//! which insists on exactly one element (or the document node) behind a
//! path. Query functions such as [`Tixi::xpath_evaluate_node_number`]
//! accept any node-set.

use crate::error::{Result, TixiError};
use crate::tree::{NodeId, NodeKind};
use crate::xpath::{self, XNode};

use super::{DocumentHandle, Tixi, TixiDocument};

/// Drops one trailing `/`, except from the root path itself.
fn strip_trailing_slash(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Converts a 1-based caller index into a 0-based one.
fn zero_based(index: i32, len: usize, path: &str) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .filter(|&i| i < len)
        .ok_or_else(|| TixiError::index_out_of_range(path, i64::from(index)))
}

impl TixiDocument {
    /// Evaluates `expression` against the document and returns the
    /// selected nodes in document order.
    pub(crate) fn select(&self, expression: &str) -> Result<Vec<XNode>> {
        if let Some(nodes) = self.cached(expression) {
            return Ok(nodes);
        }
        let nodes = xpath::select_nodes(&self.tree, expression, &self.namespaces)
            .map_err(|e| TixiError::invalid_xpath(expression, e))?;
        self.remember(expression, &nodes);
        Ok(nodes)
    }

    /// Resolves `path` to a non-empty node-set.
    pub(crate) fn check_existence(&self, path: &str) -> Result<Vec<XNode>> {
        let path = strip_trailing_slash(path);
        let nodes = self.select(path)?;
        if nodes.is_empty() {
            return Err(TixiError::ElementNotFound(path.to_string()));
        }
        Ok(nodes)
    }

    /// Resolves `path` to exactly one node of any kind.
    pub(crate) fn resolve_node(&self, path: &str) -> Result<XNode> {
        let nodes = self.check_existence(path)?;
        match nodes.as_slice() {
            [node] => Ok(*node),
            _ => Err(TixiError::ElementPathNotUnique {
                path: strip_trailing_slash(path).to_string(),
                count: nodes.len(),
            }),
        }
    }

    /// Resolves `path` to exactly one element or the document node.
    pub(crate) fn check_element(&self, path: &str) -> Result<NodeId> {
        match self.resolve_node(path)? {
            XNode::Node(id)
                if matches!(
                    self.tree.node(id).kind,
                    NodeKind::Element { .. } | NodeKind::Document
                ) =>
            {
                Ok(id)
            }
            _ => Err(TixiError::NotAnElement(
                strip_trailing_slash(path).to_string(),
            )),
        }
    }

    /// The text a query hit stands for: an element's direct text, an
    /// attribute's value, or the content of a text-like node.
    pub(crate) fn node_value(&self, node: XNode) -> String {
        match node {
            XNode::Attribute(owner, index) => self
                .tree
                .attributes(owner)
                .get(index)
                .map(|a| a.value.clone())
                .unwrap_or_default(),
            XNode::Node(id) if self.tree.is_element(id) => self.tree.direct_text(id),
            XNode::Node(id) => self.tree.node_text(id).unwrap_or_default().to_string(),
        }
    }

    /// The libxml-style path of a query hit.
    pub(crate) fn node_path(&self, node: XNode) -> String {
        match node {
            XNode::Node(id) => self.tree.node_path(id),
            XNode::Attribute(owner, index) => self.tree.attribute_path(owner, index),
        }
    }

    /// The `index`-th (1-based) hit of `expression`.
    fn query_hit(&self, expression: &str, index: i32) -> Result<XNode> {
        let nodes = self.check_existence(expression)?;
        let i = zero_based(index, nodes.len(), expression)?;
        Ok(nodes[i])
    }
}

impl Tixi {
    /// Checks that `path` names exactly one element.
    ///
    /// # Errors
    ///
    /// `INVALID_XPATH`, `ELEMENT_NOT_FOUND`, `ELEMENT_PATH_NOT_UNIQUE` or
    /// `NOT_AN_ELEMENT`.
    pub fn check_element(&self, handle: DocumentHandle, path: &str) -> Result<()> {
        self.read(handle, |doc| doc.check_element(path).map(|_| ()))
    }

    /// Checks that the element at `path` carries attribute `name`.
    ///
    /// # Errors
    ///
    /// The errors of [`Tixi::check_element`], then `ATTRIBUTE_NOT_FOUND`.
    pub fn check_attribute(&self, handle: DocumentHandle, path: &str, name: &str) -> Result<()> {
        self.read(handle, |doc| {
            let id = doc.check_element(path)?;
            match doc.tree.attribute(id, name) {
                Some(_) => Ok(()),
                None => Err(TixiError::attribute_not_found(path, name)),
            }
        })
    }

    /// Counts the element children of `path` named `name`.
    ///
    /// # Errors
    ///
    /// The errors of [`Tixi::check_element`] for `path`.
    pub fn get_named_children_count(
        &self,
        handle: DocumentHandle,
        path: &str,
        name: &str,
    ) -> Result<usize> {
        self.read(handle, |doc| {
            let id = doc.check_element(path)?;
            Ok(doc
                .tree
                .children(id)
                .filter(|&c| doc.tree.qualified_name(c).as_deref() == Some(name))
                .count())
        })
    }

    /// Counts all child nodes of `path`, text and comments included.
    ///
    /// # Errors
    ///
    /// The errors of [`Tixi::check_element`].
    pub fn get_number_of_childs(&self, handle: DocumentHandle, path: &str) -> Result<usize> {
        self.read(handle, |doc| {
            let id = doc.check_element(path)?;
            Ok(doc.tree.children(id).count())
        })
    }

    /// The DOM name of the `index`-th (1-based) child node of `path`:
    /// `#text`, `#cdata-section`, `#comment`, `#pi` or the element name.
    ///
    /// # Errors
    ///
    /// `INDEX_OUT_OF_RANGE` for an index outside `1..=children`, plus the
    /// errors of [`Tixi::check_element`].
    pub fn get_child_node_name(
        &self,
        handle: DocumentHandle,
        path: &str,
        index: i32,
    ) -> Result<String> {
        self.read(handle, |doc| {
            if index <= 0 {
                return Err(TixiError::index_out_of_range(path, i64::from(index)));
            }
            let id = doc.check_element(path)?;
            let children: Vec<NodeId> = doc.tree.children(id).collect();
            let child = children[zero_based(index, children.len(), path)?];
            Ok(match &doc.tree.node(child).kind {
                NodeKind::Text { .. } => "#text".to_string(),
                NodeKind::CData { .. } => "#cdata-section".to_string(),
                NodeKind::Comment { .. } => "#comment".to_string(),
                NodeKind::ProcessingInstruction { .. } => "#pi".to_string(),
                NodeKind::DocumentType { name, .. } => name.clone(),
                _ => doc.tree.qualified_name(child).unwrap_or_default(),
            })
        })
    }

    /// The DOM node type of the single node at `path`, e.g. `ELEMENT_NODE`.
    ///
    /// # Errors
    ///
    /// `INVALID_XPATH`, `ELEMENT_NOT_FOUND` or `ELEMENT_PATH_NOT_UNIQUE`.
    pub fn get_node_type(&self, handle: DocumentHandle, path: &str) -> Result<&'static str> {
        self.read(handle, |doc| {
            Ok(match doc.resolve_node(path)? {
                XNode::Attribute(..) => "ATTRIBUTE_NODE",
                XNode::Node(id) => doc.tree.node(id).kind.dom_type_name(),
            })
        })
    }

    /// The number of nodes `expression` selects. No match yields 0.
    ///
    /// # Errors
    ///
    /// `INVALID_XPATH` for a syntax error or a non-node-set result.
    pub fn xpath_evaluate_node_number(
        &self,
        handle: DocumentHandle,
        expression: &str,
    ) -> Result<usize> {
        self.read(handle, |doc| Ok(doc.select(expression)?.len()))
    }

    /// The text of the `index`-th (1-based) hit of `expression`: the
    /// direct text of an element or the value of an attribute.
    ///
    /// # Errors
    ///
    /// `INVALID_XPATH`, `ELEMENT_NOT_FOUND` when nothing matches, or
    /// `INDEX_OUT_OF_RANGE`.
    pub fn xpath_expression_get_text_by_index(
        &self,
        handle: DocumentHandle,
        expression: &str,
        index: i32,
    ) -> Result<String> {
        self.read(handle, |doc| {
            let hit = doc.query_hit(expression, index)?;
            Ok(doc.node_value(hit))
        })
    }

    /// The local name of the `index`-th (1-based) hit of `expression`.
    ///
    /// # Errors
    ///
    /// As [`Tixi::xpath_expression_get_text_by_index`], plus
    /// `NOT_AN_ELEMENT` when the hit is not an element.
    pub fn xpath_expression_get_element_name(
        &self,
        handle: DocumentHandle,
        expression: &str,
        index: i32,
    ) -> Result<String> {
        self.read(handle, |doc| match doc.query_hit(expression, index)? {
            XNode::Node(id) if doc.tree.is_element(id) => {
                Ok(doc.tree.node_name(id).unwrap_or_default().to_string())
            }
            _ => Err(TixiError::NotAnElement(expression.to_string())),
        })
    }

    /// The unique path of the `index`-th (1-based) hit of `expression`.
    ///
    /// # Errors
    ///
    /// As [`Tixi::xpath_expression_get_text_by_index`].
    pub fn xpath_expression_get_xpath(
        &self,
        handle: DocumentHandle,
        expression: &str,
        index: i32,
    ) -> Result<String> {
        self.read(handle, |doc| {
            let hit = doc.query_hit(expression, index)?;
            Ok(doc.node_path(hit))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ReturnCode;
    use pretty_assertions::assert_eq;

    const AIRCRAFT: &str = r#"<cpacs>
  <vehicles>
    <aircraft>
      <model uID="m1"><name>A</name><!-- first --><wings><wing uID="w1"/><wing uID="w2"/></wings></model>
      <model uID="m2"><name>B</name></model>
    </aircraft>
  </vehicles>
</cpacs>"#;

    fn open() -> (Tixi, DocumentHandle) {
        let mut tixi = Tixi::new();
        let h = tixi.import_from_string(AIRCRAFT).unwrap();
        (tixi, h)
    }

    fn code<T: std::fmt::Debug>(result: Result<T>) -> ReturnCode {
        result.unwrap_err().code()
    }

    #[test]
    fn test_check_element_rules() {
        let (tixi, h) = open();
        tixi.check_element(h, "/cpacs/vehicles/").unwrap();
        tixi.check_element(h, "/").unwrap();
        assert_eq!(code(tixi.check_element(h, "/cpacs/x")), ReturnCode::ElementNotFound);
        assert_eq!(code(tixi.check_element(h, "/cpacs/[")), ReturnCode::InvalidXPath);
        assert_eq!(
            code(tixi.check_element(h, "//model")),
            ReturnCode::ElementPathNotUnique
        );
        assert_eq!(
            code(tixi.check_element(h, "//model[1]/@uID")),
            ReturnCode::NotAnElement
        );
        assert_eq!(
            code(tixi.check_element(DocumentHandle::from(99), "/cpacs")),
            ReturnCode::InvalidHandle
        );
    }

    #[test]
    fn test_check_attribute() {
        let (tixi, h) = open();
        tixi.check_attribute(h, "//model[1]", "uID").unwrap();
        assert_eq!(
            code(tixi.check_attribute(h, "//model[1]", "name")),
            ReturnCode::AttributeNotFound
        );
        assert_eq!(
            code(tixi.check_attribute(h, "//model", "uID")),
            ReturnCode::ElementPathNotUnique
        );
    }

    #[test]
    fn test_children_counts_and_names() {
        let (tixi, h) = open();
        let model = "/cpacs/vehicles/aircraft/model[1]";
        assert_eq!(tixi.get_named_children_count(h, "//aircraft", "model").unwrap(), 2);
        assert_eq!(tixi.get_named_children_count(h, model, "model").unwrap(), 0);
        assert_eq!(tixi.get_number_of_childs(h, model).unwrap(), 3);
        assert_eq!(tixi.get_child_node_name(h, model, 1).unwrap(), "name");
        assert_eq!(tixi.get_child_node_name(h, model, 2).unwrap(), "#comment");
        assert_eq!(tixi.get_child_node_name(h, "//model[1]/name", 1).unwrap(), "#text");
        assert_eq!(
            code(tixi.get_child_node_name(h, model, 0)),
            ReturnCode::IndexOutOfRange
        );
        assert_eq!(
            code(tixi.get_child_node_name(h, model, 4)),
            ReturnCode::IndexOutOfRange
        );
    }

    #[test]
    fn test_node_types() {
        let (tixi, h) = open();
        assert_eq!(tixi.get_node_type(h, "/cpacs").unwrap(), "ELEMENT_NODE");
        assert_eq!(tixi.get_node_type(h, "/").unwrap(), "DOCUMENT_NODE");
        assert_eq!(tixi.get_node_type(h, "//wing[1]/@uID").unwrap(), "ATTRIBUTE_NODE");
        assert_eq!(tixi.get_node_type(h, "//model[2]/name/text()").unwrap(), "TEXT_NODE");
        assert_eq!(tixi.get_node_type(h, "//comment()").unwrap(), "COMMENT_NODE");
        assert_eq!(
            code(tixi.get_node_type(h, "//wing")),
            ReturnCode::ElementPathNotUnique
        );
    }

    #[test]
    fn test_query_functions() {
        let (tixi, h) = open();
        assert_eq!(tixi.xpath_evaluate_node_number(h, "//@uID").unwrap(), 4);
        assert_eq!(tixi.xpath_evaluate_node_number(h, "//missing").unwrap(), 0);
        assert_eq!(
            code(tixi.xpath_evaluate_node_number(h, "count(//wing)")),
            ReturnCode::InvalidXPath
        );
        assert_eq!(
            tixi.xpath_expression_get_text_by_index(h, "//name", 2).unwrap(),
            "B"
        );
        assert_eq!(
            tixi.xpath_expression_get_text_by_index(h, "//wing/@uID", 2).unwrap(),
            "w2"
        );
        assert_eq!(
            code(tixi.xpath_expression_get_text_by_index(h, "//name", 3)),
            ReturnCode::IndexOutOfRange
        );
        assert_eq!(
            code(tixi.xpath_expression_get_text_by_index(h, "//nothing", 1)),
            ReturnCode::ElementNotFound
        );
        assert_eq!(
            tixi.xpath_expression_get_xpath(h, "//wing", 2).unwrap(),
            "/cpacs/vehicles/aircraft/model[1]/wings/wing[2]"
        );
        assert_eq!(
            tixi.xpath_expression_get_xpath(h, "//model/@uID", 2).unwrap(),
            "/cpacs/vehicles/aircraft/model[2]/@uID"
        );
        assert_eq!(
            tixi.xpath_expression_get_element_name(h, "//wings/*", 1).unwrap(),
            "wing"
        );
        assert_eq!(
            code(tixi.xpath_expression_get_element_name(h, "//@uID", 1)),
            ReturnCode::NotAnElement
        );
    }
}
