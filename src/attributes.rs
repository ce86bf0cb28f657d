//! Attribute values.

use crate::document::{DocumentHandle, Tixi, TixiDocument};
use crate::error::{Result, TixiError};
use crate::numeric::format::{format_double, format_integer};
use crate::numeric::{parse_double, parse_integer};
use crate::tree::{is_valid_qname, split_qname};
use crate::xpath::XNode;

fn attribute_boolean(path: &str, name: &str, text: &str) -> Result<bool> {
    match text {
        "true" | "True" | "1" => Ok(true),
        "false" | "False" | "0" => Ok(false),
        other => Err(TixiError::Failed(format!(
            "attribute '{name}' at '{path}' is not a boolean: '{other}'"
        ))),
    }
}

impl TixiDocument {
    pub(crate) fn attribute_text(&self, path: &str, name: &str) -> Result<String> {
        let id = self.check_element(path)?;
        self.tree
            .attribute(id, name)
            .map(str::to_string)
            .ok_or_else(|| TixiError::attribute_not_found(path, name))
    }

    /// Sets `name` on the element at `path`, creating or overwriting it.
    pub(crate) fn set_attribute_checked(&mut self, path: &str, name: &str, value: &str) -> Result<()> {
        if name.is_empty() {
            return Err(TixiError::NoAttributeName);
        }
        if !is_valid_qname(name) {
            return Err(TixiError::InvalidXmlName(name.to_string()));
        }
        let id = self.check_element(path)?;
        if !self.tree.is_element(id) {
            return Err(TixiError::NotAnElement(path.to_string()));
        }
        if let (Some(prefix), _) = split_qname(name) {
            if self.tree.lookup_namespace(id, Some(prefix)).is_none() {
                return Err(TixiError::InvalidNamespacePrefix(prefix.to_string()));
            }
        }
        self.tree.set_attribute(id, name, value);
        Ok(())
    }
}

impl Tixi {
    /// # Errors
    ///
    /// `ATTRIBUTE_NOT_FOUND` when the element lacks the attribute, plus the
    /// errors of [`Tixi::check_element`].
    pub fn get_text_attribute(&self, handle: DocumentHandle, path: &str, name: &str) -> Result<String> {
        self.read(handle, |doc| doc.attribute_text(path, name))
    }

    /// # Errors
    ///
    /// As [`Tixi::get_text_attribute`], plus `NO_NUMBER`.
    pub fn get_integer_attribute(&self, handle: DocumentHandle, path: &str, name: &str) -> Result<i32> {
        self.read(handle, |doc| {
            parse_integer(&format!("{path}/@{name}"), &doc.attribute_text(path, name)?)
        })
    }

    /// # Errors
    ///
    /// As [`Tixi::get_text_attribute`], plus `NO_NUMBER`.
    pub fn get_double_attribute(&self, handle: DocumentHandle, path: &str, name: &str) -> Result<f64> {
        self.read(handle, |doc| {
            parse_double(&format!("{path}/@{name}"), &doc.attribute_text(path, name)?)
        })
    }

    /// Reads `true`, `True`, `1`, `false`, `False` or `0`.
    ///
    /// # Errors
    ///
    /// As [`Tixi::get_text_attribute`], plus `FAILED` for other values.
    pub fn get_boolean_attribute(&self, handle: DocumentHandle, path: &str, name: &str) -> Result<bool> {
        self.read(handle, |doc| {
            attribute_boolean(path, name, &doc.attribute_text(path, name)?)
        })
    }

    /// Sets or overwrites an attribute. A prefixed name must be bound in
    /// scope of the element and puts the attribute in that namespace.
    ///
    /// # Errors
    ///
    /// `NO_ATTRIBUTE_NAME` for an empty name, `INVALID_XML_NAME` for a bad
    /// one, `INVALID_NAMESPACE_PREFIX` for an unbound prefix,
    /// `ALREADY_SAVED`, plus the errors of [`Tixi::check_element`].
    pub fn add_text_attribute(
        &mut self,
        handle: DocumentHandle,
        path: &str,
        name: &str,
        value: &str,
    ) -> Result<()> {
        self.write(handle, |doc| doc.set_attribute_checked(path, name, value))
    }

    /// # Errors
    ///
    /// As [`Tixi::add_text_attribute`], plus `FAILED` for a bad format.
    pub fn add_double_attribute(
        &mut self,
        handle: DocumentHandle,
        path: &str,
        name: &str,
        value: f64,
        format: Option<&str>,
    ) -> Result<()> {
        let text = format_double(format, value)?;
        self.add_text_attribute(handle, path, name, &text)
    }

    /// # Errors
    ///
    /// As [`Tixi::add_text_attribute`], plus `FAILED` for a bad format.
    pub fn add_integer_attribute(
        &mut self,
        handle: DocumentHandle,
        path: &str,
        name: &str,
        value: i32,
        format: Option<&str>,
    ) -> Result<()> {
        let text = format_integer(format, i64::from(value))?;
        self.add_text_attribute(handle, path, name, &text)
    }

    /// Removes an attribute from the node at `path`. Nodes without
    /// attributes and absent attributes are left alone.
    ///
    /// # Errors
    ///
    /// `ELEMENT_NOT_FOUND` or `ELEMENT_PATH_NOT_UNIQUE` when `path` does not
    /// name exactly one node.
    pub fn remove_attribute(&mut self, handle: DocumentHandle, path: &str, name: &str) -> Result<()> {
        self.write(handle, |doc| {
            if let XNode::Node(id) = doc.resolve_node(path)? {
                doc.tree.remove_attribute(id, name);
            }
            Ok(())
        })
    }

    /// # Errors
    ///
    /// The errors of [`Tixi::check_element`].
    pub fn get_number_of_attributes(&self, handle: DocumentHandle, path: &str) -> Result<usize> {
        self.read(handle, |doc| {
            let id = doc.check_element(path)?;
            Ok(doc.tree.attributes(id).len())
        })
    }

    /// The qualified name of the `index`-th (1-based) attribute.
    ///
    /// # Errors
    ///
    /// `INDEX_OUT_OF_RANGE` for an index outside `1..=count`, plus the
    /// errors of [`Tixi::check_element`].
    pub fn get_attribute_name(&self, handle: DocumentHandle, path: &str, index: i32) -> Result<String> {
        self.read(handle, |doc| {
            let id = doc.check_element(path)?;
            usize::try_from(index)
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| doc.tree.attributes(id).get(i))
                .map(|a| a.qualified_name())
                .ok_or_else(|| TixiError::index_out_of_range(path, i64::from(index)))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ReturnCode;
    use pretty_assertions::assert_eq;

    const XML: &str = r#"<a xmlns:c="urn:c"><b n="4" d=" 2.5 " t="True" f="0" x="no" c:q="ns"/><b/></a>"#;

    fn open() -> (Tixi, DocumentHandle) {
        let mut tixi = Tixi::new();
        let h = tixi.import_from_string(XML).unwrap();
        tixi.use_pretty_print(h, 0).unwrap();
        (tixi, h)
    }

    #[test]
    fn test_typed_attribute_reads() {
        let (tixi, h) = open();
        assert_eq!(tixi.get_integer_attribute(h, "/a/b[1]", "n").unwrap(), 4);
        assert!((tixi.get_double_attribute(h, "/a/b[1]", "d").unwrap() - 2.5).abs() < 1e-12);
        assert!(tixi.get_boolean_attribute(h, "/a/b[1]", "t").unwrap());
        assert!(!tixi.get_boolean_attribute(h, "/a/b[1]", "f").unwrap());
        assert_eq!(tixi.get_text_attribute(h, "/a/b[1]", "c:q").unwrap(), "ns");
        assert_eq!(
            tixi.get_boolean_attribute(h, "/a/b[1]", "x").unwrap_err().code(),
            ReturnCode::Failed
        );
        assert_eq!(
            tixi.get_integer_attribute(h, "/a/b[1]", "x").unwrap_err().code(),
            ReturnCode::NoNumber
        );
        assert_eq!(
            tixi.get_text_attribute(h, "/a/b[1]", "missing").unwrap_err().code(),
            ReturnCode::AttributeNotFound
        );
        assert_eq!(
            tixi.get_text_attribute(h, "/a/b", "n").unwrap_err().code(),
            ReturnCode::ElementPathNotUnique
        );
    }

    #[test]
    fn test_add_attributes() {
        let (mut tixi, h) = open();
        tixi.add_text_attribute(h, "/a/b[2]", "name", "v").unwrap();
        tixi.add_text_attribute(h, "/a/b[2]", "name", "w").unwrap();
        tixi.add_double_attribute(h, "/a/b[2]", "d", 0.25, None).unwrap();
        tixi.add_integer_attribute(h, "/a/b[2]", "i", 3, Some("%02d")).unwrap();
        assert_eq!(
            tixi.export_element_as_string(h, "/a/b[2]").unwrap(),
            r#"<b name="w" d="0.25" i="03"/>"#
        );
        assert_eq!(
            tixi.add_text_attribute(h, "/a/b[2]", "", "v").unwrap_err().code(),
            ReturnCode::NoAttributeName
        );
        assert_eq!(
            tixi.add_text_attribute(h, "/a/b[2]", "a b", "v").unwrap_err().code(),
            ReturnCode::InvalidXmlName
        );
    }

    #[test]
    fn test_prefixed_attribute_needs_bound_prefix() {
        let (mut tixi, h) = open();
        assert_eq!(
            tixi.add_text_attribute(h, "/a/b[2]", "q:y", "1").unwrap_err().code(),
            ReturnCode::InvalidNamespacePrefix
        );
        assert_eq!(tixi.get_number_of_attributes(h, "/a/b[2]").unwrap(), 0);

        tixi.add_text_attribute(h, "/a/b[2]", "c:y", "1").unwrap();
        tixi.add_text_attribute(h, "/a/b[2]", "xml:lang", "en").unwrap();
        assert_eq!(
            tixi.export_element_as_string(h, "/a/b[2]").unwrap(),
            r#"<b c:y="1" xml:lang="en"/>"#
        );
        tixi.register_namespace(h, "urn:c", "c").unwrap();
        assert_eq!(
            tixi.xpath_evaluate_node_number(h, "/a/b[@c:y='1']").unwrap(),
            1
        );
    }

    #[test]
    fn test_remove_attribute() {
        let (mut tixi, h) = open();
        tixi.remove_attribute(h, "/a/b[1]", "n").unwrap();
        tixi.remove_attribute(h, "/a/b[1]", "n").unwrap();
        assert_eq!(tixi.get_number_of_attributes(h, "/a/b[1]").unwrap(), 5);
        tixi.remove_attribute(h, "/a/b[1]/@d", "d").unwrap();
        assert_eq!(
            tixi.remove_attribute(h, "/a/none", "n").unwrap_err().code(),
            ReturnCode::ElementNotFound
        );
    }

    #[test]
    fn test_attribute_names_by_index() {
        let (tixi, h) = open();
        assert_eq!(tixi.get_number_of_attributes(h, "/a").unwrap(), 0);
        assert_eq!(tixi.get_attribute_name(h, "/a/b[1]", 1).unwrap(), "n");
        assert_eq!(tixi.get_attribute_name(h, "/a/b[1]", 6).unwrap(), "c:q");
        for index in [0, -1, 7] {
            assert_eq!(
                tixi.get_attribute_name(h, "/a/b[1]", index).unwrap_err().code(),
                ReturnCode::IndexOutOfRange
            );
        }
    }
}
