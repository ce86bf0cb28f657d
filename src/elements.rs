//! Element values and structural edits.

use crate::document::{DocumentHandle, Tixi, TixiDocument};
use crate::error::{Result, TixiError};
use crate::numeric::format::{format_double, format_integer};
use crate::numeric::{parse_double, parse_integer};
use crate::tree::{is_valid_qname, Document, NodeId, NodeKind};
use crate::xpath::XNode;

/// Converts a caller index (1-based, anything below 1 meaning "append")
/// into the form [`Document::insert_child_at`] takes.
fn child_position(index: i32) -> usize {
    usize::try_from(index).unwrap_or(0)
}

fn element_boolean(path: &str, text: &str) -> Result<bool> {
    match text {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(TixiError::Failed(format!(
            "no boolean value at '{path}': '{other}'"
        ))),
    }
}

fn boolean_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

impl TixiDocument {
    /// Creates `qname` below the element at `parent`, optionally with text,
    /// at a 1-based child position (0 appends) and in namespace `uri`.
    pub(crate) fn insert_element(
        &mut self,
        parent: &str,
        qname: &str,
        uri: Option<&str>,
        text: Option<&str>,
        position: usize,
    ) -> Result<NodeId> {
        if !is_valid_qname(qname) {
            return Err(TixiError::InvalidXmlName(qname.to_string()));
        }
        if uri.is_some_and(str::is_empty) {
            return Err(TixiError::InvalidNamespaceUri(String::new()));
        }
        let parent_id = self.check_element(parent)?;
        let id = self.new_element(qname)?;
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            let content = self.tree.create_node(NodeKind::text(text));
            self.tree.append_child(id, content);
        }
        self.tree.insert_child_at(parent_id, id, position);
        match uri {
            Some(uri) => {
                let (prefix, _) = crate::tree::split_qname(qname);
                self.apply_namespace(id, prefix, uri);
            }
            None => self.tree.rename(id, qname),
        }
        Ok(id)
    }

    /// Appends a child element holding `text`. `name` must already be a
    /// valid qualified name.
    pub(crate) fn append_text_child(&mut self, parent: NodeId, name: &str, text: &str) -> NodeId {
        let id = self.tree.create_node(NodeKind::element(name));
        self.tree.append_child(parent, id);
        self.tree.rename(id, name);
        if !text.is_empty() {
            let content = self.tree.create_node(NodeKind::text(text));
            self.tree.append_child(id, content);
        }
        id
    }

    /// Replaces the first child of `id` with a text node, or adds one.
    pub(crate) fn replace_text(&mut self, id: NodeId, text: &str) {
        let content = self.tree.create_node(NodeKind::text(text));
        match self.tree.first_child(id) {
            Some(first) => self.tree.replace_node(first, content),
            None => self.tree.append_child(id, content),
        }
    }

    pub(crate) fn element_text(&self, path: &str) -> Result<String> {
        let id = self.check_element(path)?;
        Ok(self.tree.direct_text(id))
    }
}

impl Tixi {
    // ---------------------------------------------------------------------
    // Reading values
    // ---------------------------------------------------------------------

    /// The concatenated direct text and CDATA children of the element.
    ///
    /// # Errors
    ///
    /// The errors of [`Tixi::check_element`].
    pub fn get_text_element(&self, handle: DocumentHandle, path: &str) -> Result<String> {
        self.read(handle, |doc| doc.element_text(path))
    }

    /// # Errors
    ///
    /// `NO_NUMBER` when the trimmed text is not an integer, plus the errors
    /// of [`Tixi::check_element`].
    pub fn get_integer_element(&self, handle: DocumentHandle, path: &str) -> Result<i32> {
        self.read(handle, |doc| parse_integer(path, &doc.element_text(path)?))
    }

    /// # Errors
    ///
    /// `NO_NUMBER` when the trimmed text is not a number, plus the errors
    /// of [`Tixi::check_element`].
    pub fn get_double_element(&self, handle: DocumentHandle, path: &str) -> Result<f64> {
        self.read(handle, |doc| parse_double(path, &doc.element_text(path)?))
    }

    /// Reads `true`, `false`, `1` or `0`.
    ///
    /// # Errors
    ///
    /// `FAILED` for any other text, plus the errors of
    /// [`Tixi::check_element`].
    pub fn get_boolean_element(&self, handle: DocumentHandle, path: &str) -> Result<bool> {
        self.read(handle, |doc| element_boolean(path, &doc.element_text(path)?))
    }

    // ---------------------------------------------------------------------
    // Updating values
    // ---------------------------------------------------------------------

    /// Replaces the element's first child with `text`.
    ///
    /// # Errors
    ///
    /// `ALREADY_SAVED`, plus the errors of [`Tixi::check_element`].
    pub fn update_text_element(&mut self, handle: DocumentHandle, path: &str, text: &str) -> Result<()> {
        self.write(handle, |doc| {
            let id = doc.check_element(path)?;
            doc.replace_text(id, text);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// As [`Tixi::update_text_element`], plus `FAILED` for a bad format.
    pub fn update_double_element(
        &mut self,
        handle: DocumentHandle,
        path: &str,
        value: f64,
        format: Option<&str>,
    ) -> Result<()> {
        let text = format_double(format, value)?;
        self.update_text_element(handle, path, &text)
    }

    /// # Errors
    ///
    /// As [`Tixi::update_text_element`], plus `FAILED` for a bad format.
    pub fn update_integer_element(
        &mut self,
        handle: DocumentHandle,
        path: &str,
        value: i32,
        format: Option<&str>,
    ) -> Result<()> {
        let text = format_integer(format, i64::from(value))?;
        self.update_text_element(handle, path, &text)
    }

    /// # Errors
    ///
    /// As [`Tixi::update_text_element`].
    pub fn update_boolean_element(&mut self, handle: DocumentHandle, path: &str, value: bool) -> Result<()> {
        self.update_text_element(handle, path, boolean_text(value))
    }

    // ---------------------------------------------------------------------
    // Adding elements
    // ---------------------------------------------------------------------

    /// Appends `<name>text</name>` to the element at `parent`. `None`
    /// creates an empty element.
    ///
    /// # Errors
    ///
    /// `ALREADY_SAVED`, `INVALID_XML_NAME`, plus the errors of
    /// [`Tixi::check_element`] for `parent`.
    pub fn add_text_element(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        name: &str,
        text: Option<&str>,
    ) -> Result<()> {
        self.add_text_element_at_index(handle, parent, name, text, 0)
    }

    /// Inserts the new element before the `index`-th (1-based) child node
    /// of `parent`, or appends it when `index` is past the end or below 1.
    ///
    /// # Errors
    ///
    /// As [`Tixi::add_text_element`].
    pub fn add_text_element_at_index(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        name: &str,
        text: Option<&str>,
        index: i32,
    ) -> Result<()> {
        self.write(handle, |doc| {
            doc.insert_element(parent, name, None, text, child_position(index))
                .map(|_| ())
        })
    }

    /// Appends a namespaced element. A prefix in `qname` is bound to `uri`,
    /// an unprefixed name puts the element into the default namespace.
    ///
    /// # Errors
    ///
    /// As [`Tixi::add_text_element`], plus `INVALID_NAMESPACE_URI` for an
    /// empty `uri`.
    pub fn add_text_element_ns(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        qname: &str,
        uri: &str,
        text: Option<&str>,
    ) -> Result<()> {
        self.add_text_element_ns_at_index(handle, parent, qname, uri, text, 0)
    }

    /// # Errors
    ///
    /// As [`Tixi::add_text_element_ns`].
    pub fn add_text_element_ns_at_index(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        qname: &str,
        uri: &str,
        text: Option<&str>,
        index: i32,
    ) -> Result<()> {
        self.write(handle, |doc| {
            doc.insert_element(parent, qname, Some(uri), text, child_position(index))
                .map(|_| ())
        })
    }

    /// Appends `<name>true</name>` or `<name>false</name>`.
    ///
    /// # Errors
    ///
    /// As [`Tixi::add_text_element`].
    pub fn add_boolean_element(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        name: &str,
        value: bool,
    ) -> Result<()> {
        self.add_text_element(handle, parent, name, Some(boolean_text(value)))
    }

    /// # Errors
    ///
    /// As [`Tixi::add_text_element_ns`].
    pub fn add_boolean_element_ns(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        qname: &str,
        uri: &str,
        value: bool,
    ) -> Result<()> {
        self.add_text_element_ns(handle, parent, qname, uri, Some(boolean_text(value)))
    }

    /// Appends a number formatted with `format` (default `%g`).
    ///
    /// # Errors
    ///
    /// As [`Tixi::add_text_element`], plus `FAILED` for a bad format.
    pub fn add_double_element(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        name: &str,
        value: f64,
        format: Option<&str>,
    ) -> Result<()> {
        let text = format_double(format, value)?;
        self.add_text_element(handle, parent, name, Some(&text))
    }

    /// # Errors
    ///
    /// As [`Tixi::add_text_element_ns`], plus `FAILED` for a bad format.
    pub fn add_double_element_ns(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        qname: &str,
        uri: &str,
        value: f64,
        format: Option<&str>,
    ) -> Result<()> {
        let text = format_double(format, value)?;
        self.add_text_element_ns(handle, parent, qname, uri, Some(&text))
    }

    /// Appends an integer formatted with `format` (default `%d`).
    ///
    /// # Errors
    ///
    /// As [`Tixi::add_text_element`], plus `FAILED` for a bad format.
    pub fn add_integer_element(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        name: &str,
        value: i32,
        format: Option<&str>,
    ) -> Result<()> {
        let text = format_integer(format, i64::from(value))?;
        self.add_text_element(handle, parent, name, Some(&text))
    }

    /// # Errors
    ///
    /// As [`Tixi::add_text_element_ns`], plus `FAILED` for a bad format.
    pub fn add_integer_element_ns(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        qname: &str,
        uri: &str,
        value: i32,
        format: Option<&str>,
    ) -> Result<()> {
        let text = format_integer(format, i64::from(value))?;
        self.add_text_element_ns(handle, parent, qname, uri, Some(&text))
    }

    /// Appends an empty element.
    ///
    /// # Errors
    ///
    /// As [`Tixi::add_text_element`].
    pub fn create_element(&mut self, handle: DocumentHandle, parent: &str, name: &str) -> Result<()> {
        self.add_text_element(handle, parent, name, None)
    }

    /// # Errors
    ///
    /// As [`Tixi::add_text_element`].
    pub fn create_element_at_index(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        name: &str,
        index: i32,
    ) -> Result<()> {
        self.add_text_element_at_index(handle, parent, name, None, index)
    }

    /// # Errors
    ///
    /// As [`Tixi::add_text_element_ns`].
    pub fn create_element_ns(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        qname: &str,
        uri: &str,
    ) -> Result<()> {
        self.add_text_element_ns(handle, parent, qname, uri, None)
    }

    /// # Errors
    ///
    /// As [`Tixi::add_text_element_ns`].
    pub fn create_element_ns_at_index(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        qname: &str,
        uri: &str,
        index: i32,
    ) -> Result<()> {
        self.add_text_element_ns_at_index(handle, parent, qname, uri, None, index)
    }

    // ---------------------------------------------------------------------
    // Structure
    // ---------------------------------------------------------------------

    /// Renames every child of `parent` called `old` to `new`.
    ///
    /// # Errors
    ///
    /// `INVALID_XML_NAME` for a bad new name, `ELEMENT_NOT_FOUND` when no
    /// child is called `old`.
    pub fn rename_element(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        old: &str,
        new: &str,
    ) -> Result<()> {
        self.write(handle, |doc| {
            if !is_valid_qname(new) {
                return Err(TixiError::InvalidXmlName(new.to_string()));
            }
            let parent_id = doc.check_element(parent)?;
            let targets: Vec<NodeId> = doc
                .tree
                .children(parent_id)
                .filter(|&c| doc.tree.qualified_name(c).as_deref() == Some(old))
                .collect();
            if targets.is_empty() {
                return Err(TixiError::ElementNotFound(format!("{parent}/{old}")));
            }
            for id in targets {
                doc.tree.rename(id, new);
            }
            Ok(())
        })
    }

    /// Unlinks the node at `path`.
    ///
    /// # Errors
    ///
    /// `ELEMENT_PATH_NOT_UNIQUE` when `path` matches several nodes,
    /// `NOT_AN_ELEMENT` for attributes and the document node.
    pub fn remove_element(&mut self, handle: DocumentHandle, path: &str) -> Result<()> {
        self.write(handle, |doc| match doc.resolve_node(path)? {
            XNode::Node(id) if id != doc.tree.root() => {
                doc.tree.detach(id);
                Ok(())
            }
            _ => Err(TixiError::NotAnElement(path.to_string())),
        })
    }

    /// Exchanges the positions of two elements.
    ///
    /// # Errors
    ///
    /// `FAILED` when one element contains the other, plus the errors of
    /// [`Tixi::check_element`] for both paths.
    pub fn swap_elements(&mut self, handle: DocumentHandle, a: &str, b: &str) -> Result<()> {
        self.write(handle, |doc| {
            let first = doc.check_element(a)?;
            let second = doc.check_element(b)?;
            if first == second {
                return Ok(());
            }
            if doc.tree.is_ancestor(first, second) || doc.tree.is_ancestor(second, first) {
                return Err(TixiError::Failed(format!(
                    "cannot swap '{a}' and '{b}': one contains the other"
                )));
            }
            doc.tree.swap(first, second);
            Ok(())
        })
    }

    /// Serializes the element at `path` and its subtree.
    ///
    /// # Errors
    ///
    /// The errors of [`Tixi::check_element`].
    pub fn export_element_as_string(&self, handle: DocumentHandle, path: &str) -> Result<String> {
        self.read(handle, |doc| {
            let id = doc.check_element(path)?;
            if id == doc.tree.root() {
                return Ok(doc.to_xml());
            }
            Ok(doc.subtree_to_xml(id))
        })
    }

    /// Parses `xml` and appends its root element to `parent`.
    ///
    /// # Errors
    ///
    /// `NOT_WELL_FORMED` when `xml` does not parse, plus the errors of
    /// [`Tixi::check_element`] for `parent`.
    pub fn import_element_from_string(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        xml: &str,
    ) -> Result<()> {
        self.import_element_from_string_at_index(handle, parent, xml, 0)
    }

    /// # Errors
    ///
    /// As [`Tixi::import_element_from_string`].
    pub fn import_element_from_string_at_index(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        xml: &str,
        index: i32,
    ) -> Result<()> {
        self.write(handle, |doc| {
            let fragment = Document::parse_str_with_options(xml, &doc.parse_options)?;
            let parent_id = doc.check_element(parent)?;
            let Some(root) = fragment.root_element() else {
                return Err(TixiError::Failed("imported string has no element".into()));
            };
            let copy = doc.tree.import(&fragment, root);
            doc.tree.insert_child_at(parent_id, copy, child_position(index));
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ReturnCode;
    use pretty_assertions::assert_eq;

    fn compact(xml: &str) -> (Tixi, DocumentHandle) {
        let mut tixi = Tixi::new();
        let h = tixi.import_from_string(xml).unwrap();
        tixi.use_pretty_print(h, 0).unwrap();
        (tixi, h)
    }

    fn body(tixi: &Tixi, h: DocumentHandle) -> String {
        let xml = tixi.export_document_as_string(h).unwrap();
        xml.trim_start_matches("<?xml version=\"1.0\"?>\n")
            .trim_end()
            .to_string()
    }

    #[test]
    fn test_typed_reads() {
        let (tixi, h) = compact(
            "<a><i> 42 </i><d>-1.5e2</d><t>true</t><z>0</z><bad>4x</bad><b>yes</b><mixed>x<![CDATA[y]]><c/>z</mixed></a>",
        );
        assert_eq!(tixi.get_integer_element(h, "/a/i").unwrap(), 42);
        assert!((tixi.get_double_element(h, "/a/d").unwrap() + 150.0).abs() < 1e-12);
        assert!(tixi.get_boolean_element(h, "/a/t").unwrap());
        assert!(!tixi.get_boolean_element(h, "/a/z").unwrap());
        assert_eq!(
            tixi.get_integer_element(h, "/a/bad").unwrap_err().code(),
            ReturnCode::NoNumber
        );
        assert_eq!(
            tixi.get_boolean_element(h, "/a/b").unwrap_err().code(),
            ReturnCode::Failed
        );
        assert_eq!(tixi.get_text_element(h, "/a/mixed").unwrap(), "xyz");
        assert_eq!(tixi.get_text_element(h, "/a/mixed/c").unwrap(), "");
    }

    #[test]
    fn test_add_elements_at_index() {
        let (mut tixi, h) = compact("<a><x/><y/></a>");
        tixi.add_text_element(h, "/a", "end", Some("1")).unwrap();
        tixi.add_text_element_at_index(h, "/a", "first", None, 1).unwrap();
        tixi.create_element_at_index(h, "/a", "third", 3).unwrap();
        tixi.create_element_at_index(h, "/a", "last", 99).unwrap();
        assert_eq!(
            body(&tixi, h),
            "<a><first/><x/><third/><y/><end>1</end><last/></a>"
        );
        assert_eq!(
            tixi.create_element(h, "/a", "1bad").unwrap_err().code(),
            ReturnCode::InvalidXmlName
        );
        assert_eq!(
            tixi.create_element(h, "/a/nothing", "ok").unwrap_err().code(),
            ReturnCode::ElementNotFound
        );
    }

    #[test]
    fn test_add_typed_elements() {
        let (mut tixi, h) = compact("<a/>");
        tixi.add_double_element(h, "/a", "d", 0.5, None).unwrap();
        tixi.add_double_element(h, "/a", "f", 2.0, Some("%.2f")).unwrap();
        tixi.add_integer_element(h, "/a", "i", 7, Some("%03d")).unwrap();
        tixi.add_boolean_element(h, "/a", "b", false).unwrap();
        assert_eq!(
            body(&tixi, h),
            "<a><d>0.5</d><f>2.00</f><i>007</i><b>false</b></a>"
        );
        assert_eq!(
            tixi.add_double_element(h, "/a", "e", 1.0, Some("%s")).unwrap_err().code(),
            ReturnCode::Failed
        );
    }

    #[test]
    fn test_update_elements() {
        let (mut tixi, h) = compact("<a><v>old<k/></v><e/></a>");
        tixi.update_text_element(h, "/a/v", "new").unwrap();
        tixi.update_integer_element(h, "/a/e", 3, None).unwrap();
        assert_eq!(body(&tixi, h), "<a><v>new<k/></v><e>3</e></a>");
        tixi.update_boolean_element(h, "/a/e", true).unwrap();
        tixi.update_double_element(h, "/a/v", 1.26, Some("%.1f")).unwrap();
        assert_eq!(tixi.get_text_element(h, "/a/e").unwrap(), "true");
        assert_eq!(tixi.get_text_element(h, "/a/v").unwrap(), "1.3");
        assert_eq!(
            tixi.update_text_element(h, "/a/none", "x").unwrap_err().code(),
            ReturnCode::ElementNotFound
        );
    }

    #[test]
    fn test_namespaced_elements() {
        let (mut tixi, h) = compact(r#"<a xmlns:c="urn:c"/>"#);
        tixi.add_text_element_ns(h, "/a", "c:wing", "urn:c", Some("w")).unwrap();
        tixi.create_element_ns(h, "/a", "d:body", "urn:d").unwrap();
        tixi.create_element_ns(h, "/a", "plain", "urn:p").unwrap();
        tixi.add_integer_element_ns(h, "/a", "c:n", "urn:c", 2, None).unwrap();
        assert_eq!(
            body(&tixi, h),
            r#"<a xmlns:c="urn:c"><c:wing>w</c:wing><d:body xmlns:d="urn:d"/><plain xmlns="urn:p"/><c:n>2</c:n></a>"#
        );
        assert_eq!(
            tixi.create_element_ns(h, "/a", "x", "").unwrap_err().code(),
            ReturnCode::InvalidNamespaceUri
        );
    }

    #[test]
    fn test_rename_remove_swap() {
        let (mut tixi, h) = compact("<a><x>1</x><y><z/></y><x>2</x></a>");
        tixi.rename_element(h, "/a", "x", "w").unwrap();
        assert_eq!(body(&tixi, h), "<a><w>1</w><y><z/></y><w>2</w></a>");
        assert_eq!(
            tixi.rename_element(h, "/a", "x", "v").unwrap_err().code(),
            ReturnCode::ElementNotFound
        );
        assert_eq!(
            tixi.rename_element(h, "/a", "w", "<").unwrap_err().code(),
            ReturnCode::InvalidXmlName
        );
        tixi.swap_elements(h, "/a/w[1]", "/a/y").unwrap();
        assert_eq!(body(&tixi, h), "<a><y><z/></y><w>1</w><w>2</w></a>");
        assert_eq!(
            tixi.swap_elements(h, "/a/y", "/a/y/z").unwrap_err().code(),
            ReturnCode::Failed
        );
        assert_eq!(
            tixi.remove_element(h, "/a/w").unwrap_err().code(),
            ReturnCode::ElementPathNotUnique
        );
        tixi.remove_element(h, "/a/w[2]").unwrap();
        assert_eq!(body(&tixi, h), "<a><y><z/></y><w>1</w></a>");
    }

    #[test]
    fn test_export_and_import_elements() {
        let (mut tixi, h) = compact("<a><b><c>1</c></b></a>");
        assert_eq!(
            tixi.export_element_as_string(h, "/a/b").unwrap(),
            "<b><c>1</c></b>"
        );
        tixi.import_element_from_string(h, "/a", "<d><e/></d>").unwrap();
        tixi.import_element_from_string_at_index(h, "/a", "<f/>", 1).unwrap();
        assert_eq!(body(&tixi, h), "<a><f/><b><c>1</c></b><d><e/></d></a>");
        assert_eq!(
            tixi.import_element_from_string(h, "/a", "<d>").unwrap_err().code(),
            ReturnCode::NotWellFormed
        );
        tixi.use_pretty_print(h, 1).unwrap();
        assert_eq!(
            tixi.export_element_as_string(h, "/a/b").unwrap(),
            "<b>\n  <c>1</c>\n</b>"
        );
    }

    #[test]
    fn test_saved_document_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let (mut tixi, h) = compact("<a/>");
        tixi.save_document(h, dir.path().join("a.xml")).unwrap();
        assert_eq!(
            tixi.create_element(h, "/a", "b").unwrap_err().code(),
            ReturnCode::AlreadySaved
        );
        assert_eq!(tixi.get_text_element(h, "/a").unwrap(), "");
    }
}
