//! Document headers and external links.

use chrono::Local;

use crate::document::{DocumentHandle, Tixi, TixiDocument};
use crate::error::{Result, TixiError};
use crate::tree::NodeId;

const HEADER: &str = "header";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

impl TixiDocument {
    /// Appends an empty `header` element to the root element.
    fn append_header(&mut self) -> Result<NodeId> {
        let Some(root) = self.tree.root_element() else {
            return Err(TixiError::Failed("document has no root element".into()));
        };
        Ok(self.append_text_child(root, HEADER, ""))
    }
}

impl Tixi {
    /// Appends
    ///
    /// ```xml
    /// <header>
    ///   <tool><toolName>..</toolName><version>..</version></tool>
    ///   <author>..</author>
    ///   <timestamp>2024-05-01T12:00:00</timestamp>
    /// </header>
    /// ```
    ///
    /// to the root element. The timestamp is local time.
    ///
    /// # Errors
    ///
    /// `INVALID_HANDLE`, `ALREADY_SAVED`.
    pub fn add_header(
        &mut self,
        handle: DocumentHandle,
        tool_name: &str,
        version: &str,
        author: &str,
    ) -> Result<()> {
        self.write(handle, |doc| {
            let header = doc.append_header()?;
            let tool = doc.append_text_child(header, "tool", "");
            doc.append_text_child(tool, "toolName", tool_name);
            doc.append_text_child(tool, "version", version);
            doc.append_text_child(header, "author", author);
            doc.append_text_child(header, "timestamp", &timestamp());
            Ok(())
        })
    }

    /// Appends a CPACS header with `name`, `version`, `cpacsVersion`,
    /// `creator`, `description` and `timestamp` children to the root
    /// element.
    ///
    /// # Errors
    ///
    /// `INVALID_HANDLE`, `ALREADY_SAVED`.
    pub fn add_cpacs_header(
        &mut self,
        handle: DocumentHandle,
        name: &str,
        creator: &str,
        version: &str,
        description: &str,
        cpacs_version: &str,
    ) -> Result<()> {
        self.write(handle, |doc| {
            let header = doc.append_header()?;
            for (child, text) in [
                ("name", name),
                ("version", version),
                ("cpacsVersion", cpacs_version),
                ("creator", creator),
                ("description", description),
            ] {
                doc.append_text_child(header, child, text);
            }
            doc.append_text_child(header, "timestamp", &timestamp());
            Ok(())
        })
    }

    /// Appends `<externalFile format="..">url</externalFile>` to `parent`.
    ///
    /// # Errors
    ///
    /// The errors of [`Tixi::add_text_element`].
    pub fn add_external_link(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        url: &str,
        file_format: Option<&str>,
    ) -> Result<()> {
        self.write(handle, |doc| {
            let link = doc.insert_element(parent, "externalFile", None, Some(url), 0)?;
            if let Some(format) = file_format {
                doc.tree.set_attribute(link, "format", format);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;

    fn new_doc() -> (Tixi, DocumentHandle) {
        let mut tixi = Tixi::new();
        let h = tixi.create_document("cpacs").unwrap();
        tixi.use_pretty_print(h, 0).unwrap();
        (tixi, h)
    }

    fn assert_timestamp(tixi: &Tixi, h: DocumentHandle, path: &str) {
        let stamp = tixi.get_text_element(h, path).unwrap();
        assert!(
            NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT).is_ok(),
            "{stamp}"
        );
    }

    #[test]
    fn test_add_header() {
        let (mut tixi, h) = new_doc();
        tixi.add_header(h, "tool", "1.0", "me").unwrap();
        assert_eq!(
            tixi.get_text_element(h, "/cpacs/header/tool/toolName").unwrap(),
            "tool"
        );
        assert_eq!(
            tixi.get_text_element(h, "/cpacs/header/tool/version").unwrap(),
            "1.0"
        );
        assert_eq!(tixi.get_text_element(h, "/cpacs/header/author").unwrap(), "me");
        assert_timestamp(&tixi, h, "/cpacs/header/timestamp");
    }

    #[test]
    fn test_add_cpacs_header() {
        let (mut tixi, h) = new_doc();
        tixi.add_cpacs_header(h, "D150", "me", "1", "demo", "3.0").unwrap();
        let names: Vec<String> = (1..=6)
            .map(|i| tixi.get_child_node_name(h, "/cpacs/header", i).unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["name", "version", "cpacsVersion", "creator", "description", "timestamp"]
        );
        assert_eq!(
            tixi.get_text_element(h, "/cpacs/header/cpacsVersion").unwrap(),
            "3.0"
        );
        assert_timestamp(&tixi, h, "/cpacs/header/timestamp");
    }

    #[test]
    fn test_add_external_link() {
        let (mut tixi, h) = new_doc();
        tixi.add_external_link(h, "/cpacs", "http://host/f.stp", Some("STEP"))
            .unwrap();
        tixi.add_external_link(h, "/cpacs", "f.igs", None).unwrap();
        assert_eq!(
            tixi.export_element_as_string(h, "/cpacs").unwrap(),
            r#"<cpacs><externalFile format="STEP">http://host/f.stp</externalFile><externalFile>f.igs</externalFile></cpacs>"#
        );
    }
}
