//! Namespace registration and declaration.
//!
//! Prefixes used in XPath expressions are independent of the prefixes in
//! the tree: they come from [`Tixi::register_namespace`] or are collected
//! with [`Tixi::register_namespaces_from_document`].

use crate::document::{DocumentHandle, Tixi, TixiDocument};
use crate::error::{Result, TixiError};
use crate::tree::{is_valid_qname, NodeId};

fn check_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() || prefix.contains(':') || !is_valid_qname(prefix) {
        return Err(TixiError::InvalidNamespacePrefix(prefix.to_string()));
    }
    Ok(())
}

fn check_uri(uri: &str) -> Result<()> {
    if uri.is_empty() {
        return Err(TixiError::InvalidNamespaceUri(uri.to_string()));
    }
    Ok(())
}

impl TixiDocument {
    /// Puts the element `id` into namespace `uri` under `prefix` (`None`
    /// for the default namespace). A binding in scope at the parent is
    /// reused, otherwise the declaration is made on `id` itself.
    pub(crate) fn apply_namespace(&mut self, id: NodeId, prefix: Option<&str>, uri: &str) {
        let inherited = self
            .tree
            .parent(id)
            .and_then(|parent| self.tree.lookup_namespace(parent, prefix))
            == Some(uri);
        let declared_here = self
            .tree
            .namespace_decls(id)
            .iter()
            .any(|d| d.prefix.as_deref() == prefix && d.uri == uri);
        if !inherited && !declared_here {
            self.tree.declare_namespace(id, prefix, uri);
        }
        self.tree.set_element_namespace(id, prefix, Some(uri));
    }
}

impl Tixi {
    /// Binds `prefix` to `uri` for XPath expressions on this document.
    ///
    /// ```
    /// use tixi::Tixi;
    ///
    /// let mut tixi = Tixi::new();
    /// let h = tixi
    ///     .import_from_string(r#"<a xmlns="urn:x"><b>1</b></a>"#)
    ///     .unwrap();
    /// tixi.register_namespace(h, "urn:x", "x").unwrap();
    /// assert_eq!(tixi.get_text_element(h, "/x:a/x:b").unwrap(), "1");
    /// ```
    ///
    /// # Errors
    ///
    /// `INVALID_NAMESPACE_PREFIX` for an empty or malformed prefix,
    /// `INVALID_NAMESPACE_URI` for an empty URI.
    pub fn register_namespace(&mut self, handle: DocumentHandle, uri: &str, prefix: &str) -> Result<()> {
        self.configure(handle, |doc| {
            check_prefix(prefix)?;
            check_uri(uri)?;
            doc.namespaces.insert(prefix.to_string(), uri.to_string());
            Ok(())
        })
    }

    /// Registers every prefixed declaration in the tree. Default namespace
    /// declarations have no prefix to register and are skipped.
    ///
    /// # Errors
    ///
    /// `INVALID_HANDLE` for an unknown handle.
    pub fn register_namespaces_from_document(&mut self, handle: DocumentHandle) -> Result<()> {
        self.modify(handle, false, |doc, messages| {
            let root = doc.tree.root();
            let mut found = Vec::new();
            for id in doc.tree.descendants(root) {
                for decl in doc.tree.namespace_decls(id) {
                    match decl.prefix.as_deref() {
                        Some("xml") => {}
                        Some(prefix) => found.push((prefix.to_string(), decl.uri.clone())),
                        None => messages.status(&format!(
                            "default namespace '{}' not registered, it has no prefix",
                            decl.uri
                        )),
                    }
                }
            }
            for (prefix, uri) in found {
                doc.namespaces.insert(prefix, uri);
            }
            Ok(())
        })
    }

    /// Moves the element at `path` into namespace `uri`. An empty prefix
    /// means the default namespace.
    ///
    /// # Errors
    ///
    /// `INVALID_NAMESPACE_URI` for an empty URI, `INVALID_NAMESPACE_PREFIX`
    /// for a malformed prefix, plus the errors of [`Tixi::check_element`].
    pub fn set_element_namespace(
        &mut self,
        handle: DocumentHandle,
        path: &str,
        uri: &str,
        prefix: &str,
    ) -> Result<()> {
        self.write(handle, |doc| {
            check_uri(uri)?;
            let prefix = Some(prefix).filter(|p| !p.is_empty());
            if let Some(prefix) = prefix {
                check_prefix(prefix)?;
            }
            let id = doc.check_element(path)?;
            if !doc.tree.is_element(id) {
                return Err(TixiError::NotAnElement(path.to_string()));
            }
            doc.apply_namespace(id, prefix, uri);
            Ok(())
        })
    }

    /// Declares `xmlns:prefix="uri"` on the element without changing its
    /// own namespace. Nothing is added when the binding is already in scope.
    ///
    /// # Errors
    ///
    /// `INVALID_NAMESPACE_PREFIX` for an empty or malformed prefix,
    /// `INVALID_NAMESPACE_URI` for an empty URI, plus the errors of
    /// [`Tixi::check_element`].
    pub fn declare_namespace(
        &mut self,
        handle: DocumentHandle,
        path: &str,
        uri: &str,
        prefix: &str,
    ) -> Result<()> {
        self.write(handle, |doc| {
            check_prefix(prefix)?;
            check_uri(uri)?;
            let id = doc.check_element(path)?;
            if !doc.tree.is_element(id) {
                return Err(TixiError::NotAnElement(path.to_string()));
            }
            if doc.tree.lookup_namespace(id, Some(prefix)) != Some(uri) {
                doc.tree.declare_namespace(id, Some(prefix), uri);
            }
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
    fn test_register_namespace_validation() {
        let (mut tixi, h) = compact("<a/>");
        assert_eq!(
            tixi.register_namespace(h, "urn:x", "").unwrap_err().code(),
            ReturnCode::InvalidNamespacePrefix
        );
        assert_eq!(
            tixi.register_namespace(h, "", "x").unwrap_err().code(),
            ReturnCode::InvalidNamespaceUri
        );
        tixi.register_namespace(h, "urn:x", "x").unwrap();
        let doc = tixi.document(h).unwrap();
        assert_eq!(
            doc.registered_namespaces().get("x").map(String::as_str),
            Some("urn:x")
        );
    }

    #[test]
    fn test_unregistered_prefix_is_an_invalid_xpath() {
        let (tixi, h) = compact(r#"<p:a xmlns:p="urn:p"/>"#);
        assert_eq!(
            tixi.check_element(h, "/p:a").unwrap_err().code(),
            ReturnCode::InvalidXPath
        );
    }

    #[test]
    fn test_register_from_document() {
        let (mut tixi, h) = compact(
            r#"<p:a xmlns:p="urn:p" xmlns="urn:default"><q:b xmlns:q="urn:q"><q:c>v</q:c></q:b></p:a>"#,
        );
        tixi.register_namespaces_from_document(h).unwrap();
        let doc = tixi.document(h).unwrap();
        let mut prefixes: Vec<_> = doc.registered_namespaces().keys().cloned().collect();
        prefixes.sort();
        assert_eq!(prefixes, vec!["p", "q"]);
        assert_eq!(tixi.get_text_element(h, "/p:a/q:b/q:c").unwrap(), "v");
    }

    #[test]
    fn test_set_element_namespace() {
        let (mut tixi, h) = compact(r#"<a xmlns:c="urn:c"><b/><d/><e/></a>"#);
        tixi.set_element_namespace(h, "/a/b", "urn:c", "c").unwrap();
        tixi.set_element_namespace(h, "/a/d", "urn:n", "n").unwrap();
        tixi.set_element_namespace(h, "/a/e", "urn:e", "").unwrap();
        assert_eq!(
            body(&tixi, h),
            r#"<a xmlns:c="urn:c"><c:b/><n:d xmlns:n="urn:n"/><e xmlns="urn:e"/></a>"#
        );
        tixi.register_namespace(h, "urn:n", "x").unwrap();
        tixi.check_element(h, "/a/x:d").unwrap();
        assert_eq!(
            tixi.set_element_namespace(h, "/a/b", "", "c").unwrap_err().code(),
            ReturnCode::InvalidNamespaceUri
        );
    }

    #[test]
    fn test_declare_namespace() {
        let (mut tixi, h) = compact(r#"<a xmlns:c="urn:c"><b/></a>"#);
        tixi.declare_namespace(h, "/a/b", "urn:c", "c").unwrap();
        tixi.declare_namespace(h, "/a/b", "urn:d", "d").unwrap();
        assert_eq!(
            body(&tixi, h),
            r#"<a xmlns:c="urn:c"><b xmlns:d="urn:d"/></a>"#
        );
        assert_eq!(
            tixi.declare_namespace(h, "/a/b", "urn:d", "").unwrap_err().code(),
            ReturnCode::InvalidNamespacePrefix
        );
    }
}
