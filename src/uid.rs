//! UID bookkeeping.
//!
//! Elements carry a document-wide identifier in a `uID` attribute and
//! refer to each other through `isLink` attributes holding such an
//! identifier. The table is rebuilt from the tree on every call, so it
//! always reflects the current state of the document.

use std::collections::HashMap;

use crate::document::{DocumentHandle, Tixi, TixiDocument};
use crate::error::{Result, TixiError};
use crate::message::Messenger;
use crate::tree::{is_valid_qname, NodeId};

pub const UID_ATTRIBUTE: &str = "uID";
pub const LINK_ATTRIBUTE: &str = "isLink";

/// What [`Tixi::uid_add_link`] does besides creating the link element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddLinkMode {
    /// Append a new link element.
    #[default]
    Create,
    /// Reuse a matching link element if present and return the target path.
    CreateAndOpen,
}

impl AddLinkMode {
    /// Converts the numeric mode (0 create, 1 create and open).
    ///
    /// # Errors
    ///
    /// `FAILED` for any other value.
    pub fn from_i32(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Create),
            1 => Ok(Self::CreateAndOpen),
            other => Err(TixiError::Failed(format!("unknown link mode {other}"))),
        }
    }
}

/// `(uid, owner)` for every element with a `uID` attribute, in document
/// order.
fn uid_table(doc: &TixiDocument) -> Vec<(&str, NodeId)> {
    let tree = &doc.tree;
    tree.descendants(tree.root())
        .filter_map(|id| tree.attribute(id, UID_ATTRIBUTE).map(|uid| (uid, id)))
        .collect()
}

fn check_duplicates(doc: &TixiDocument, messages: &Messenger) -> Result<()> {
    let mut seen: HashMap<&str, NodeId> = HashMap::new();
    let mut warned = false;
    for (uid, id) in uid_table(doc) {
        if uid.is_empty() {
            if !warned {
                messages.warn("empty uID found, this might lead to unexpected errors");
                warned = true;
            }
            continue;
        }
        if seen.insert(uid, id).is_some() {
            return Err(TixiError::UidNotUnique(uid.to_string()));
        }
    }
    Ok(())
}

fn find_uid(doc: &TixiDocument, uid: &str) -> Option<NodeId> {
    uid_table(doc)
        .into_iter()
        .find_map(|(value, id)| (value == uid).then_some(id))
}

impl Tixi {
    /// Checks that no two elements share a `uID`. Empty values only raise a
    /// warning.
    ///
    /// # Errors
    ///
    /// `UID_NOT_UNIQUE` naming the first duplicated value.
    pub fn uid_check_duplicates(&self, handle: DocumentHandle) -> Result<()> {
        self.read(handle, |doc| check_duplicates(doc, self.messages()))
    }

    /// Checks that every `isLink` value names an existing `uID`.
    ///
    /// # Errors
    ///
    /// `UID_LINK_BROKEN` naming the first dangling link.
    pub fn uid_check_links(&self, handle: DocumentHandle) -> Result<()> {
        self.read(handle, |doc| {
            let uids: Vec<&str> = uid_table(doc).into_iter().map(|(uid, _)| uid).collect();
            let tree = &doc.tree;
            for id in tree.descendants(tree.root()) {
                if let Some(link) = tree.attribute(id, LINK_ATTRIBUTE) {
                    if !uids.contains(&link) {
                        return Err(TixiError::UidLinkBroken(link.to_string()));
                    }
                }
            }
            Ok(())
        })
    }

    /// The path of the element carrying `uid`. Duplicates are reported as a
    /// warning only.
    ///
    /// ```
    /// use tixi::Tixi;
    ///
    /// let mut tixi = Tixi::new();
    /// let h = tixi
    ///     .import_from_string(r#"<a><wing uID="w1"/><wing uID="w2"/></a>"#)
    ///     .unwrap();
    /// assert_eq!(tixi.uid_get_xpath(h, "w2").unwrap(), "/a/wing[2]");
    /// ```
    ///
    /// # Errors
    ///
    /// `UID_DONT_EXISTS` when no element carries `uid`.
    pub fn uid_get_xpath(&self, handle: DocumentHandle, uid: &str) -> Result<String> {
        self.read(handle, |doc| {
            if let Err(e) = check_duplicates(doc, self.messages()) {
                self.messages()
                    .warn(&format!("there are duplicated uIDs in the document: {e}"));
            }
            find_uid(doc, uid)
                .map(|id| doc.tree.node_path(id))
                .ok_or_else(|| TixiError::UidDontExists(uid.to_string()))
        })
    }

    /// # Errors
    ///
    /// `UID_NOT_UNIQUE` when the document holds duplicates,
    /// `UID_DONT_EXISTS` when no element carries `uid`.
    pub fn uid_check_exists(&self, handle: DocumentHandle, uid: &str) -> Result<()> {
        self.read(handle, |doc| {
            check_duplicates(doc, self.messages())?;
            find_uid(doc, uid)
                .map(|_| ())
                .ok_or_else(|| TixiError::UidDontExists(uid.to_string()))
        })
    }

    /// Sets the `uID` attribute of the element at `path`.
    ///
    /// # Errors
    ///
    /// `UID_NOT_UNIQUE` when the document already holds duplicates, plus
    /// the errors of [`Tixi::add_text_attribute`].
    pub fn uid_set_to_xpath(&mut self, handle: DocumentHandle, path: &str, uid: &str) -> Result<()> {
        self.modify(handle, true, |doc, messages| {
            check_duplicates(doc, messages)?;
            doc.set_attribute_checked(path, UID_ATTRIBUTE, uid)
        })
    }

    /// Adds `<name isLink="target"/>` below `parent`. With
    /// [`AddLinkMode::CreateAndOpen`] an existing link element is reused and
    /// the path of the target element is returned.
    ///
    /// # Errors
    ///
    /// `UID_DONT_EXISTS` when no element carries `target`,
    /// `INVALID_XML_NAME` for a bad name, plus the errors of
    /// [`Tixi::check_element`] for `parent`.
    pub fn uid_add_link(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        name: &str,
        target: &str,
        mode: AddLinkMode,
    ) -> Result<Option<String>> {
        self.write(handle, |doc| {
            if !is_valid_qname(name) {
                return Err(TixiError::InvalidXmlName(name.to_string()));
            }
            let Some(target_id) = find_uid(doc, target) else {
                return Err(TixiError::UidDontExists(target.to_string()));
            };
            let target_path = doc.tree.node_path(target_id);
            let parent_id = doc.check_element(parent)?;
            let existing = doc
                .tree
                .child_elements_named(parent_id, name)
                .find(|&c| doc.tree.attribute(c, LINK_ATTRIBUTE) == Some(target));
            match (mode, existing) {
                (AddLinkMode::CreateAndOpen, Some(_)) => {}
                _ => {
                    let link = doc.append_text_child(parent_id, name, "");
                    doc.tree.set_attribute(link, LINK_ATTRIBUTE, target);
                }
            }
            Ok(match mode {
                AddLinkMode::Create => None,
                AddLinkMode::CreateAndOpen => Some(target_path),
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ReturnCode;
    use crate::message::MessageType;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    const LINKED: &str = r#"<cpacs>
        <wing uID="w1"><section uID="s1"/></wing>
        <wing uID="w2"><ref isLink="s1"/></wing>
    </cpacs>"#;

    fn open(xml: &str) -> (Tixi, DocumentHandle) {
        let mut tixi = Tixi::new();
        let h = tixi.import_from_string(xml).unwrap();
        tixi.use_pretty_print(h, 0).unwrap();
        (tixi, h)
    }

    #[test]
    fn test_unique_uids_and_links() {
        let (tixi, h) = open(LINKED);
        tixi.uid_check_duplicates(h).unwrap();
        tixi.uid_check_links(h).unwrap();
        tixi.uid_check_exists(h, "s1").unwrap();
        assert_eq!(tixi.uid_get_xpath(h, "s1").unwrap(), "/cpacs/wing[1]/section");
        assert_eq!(
            tixi.uid_check_exists(h, "nope").unwrap_err().code(),
            ReturnCode::UidDontExists
        );
        assert_eq!(
            tixi.uid_get_xpath(h, "nope").unwrap_err().code(),
            ReturnCode::UidDontExists
        );
    }

    #[test]
    fn test_duplicates_and_broken_links() {
        let (tixi, h) = open(r#"<a><b uID="x"/><c uID="x" isLink="y"/></a>"#);
        assert_eq!(
            tixi.uid_check_duplicates(h).unwrap_err().code(),
            ReturnCode::UidNotUnique
        );
        assert_eq!(
            tixi.uid_check_links(h).unwrap_err().code(),
            ReturnCode::UidLinkBroken
        );
        assert_eq!(
            tixi.uid_check_exists(h, "x").unwrap_err().code(),
            ReturnCode::UidNotUnique
        );
        assert_eq!(tixi.uid_get_xpath(h, "x").unwrap(), "/a/b");
    }

    #[test]
    fn test_empty_uid_warns_once() {
        let (mut tixi, h) = open(r#"<a><b uID=""/><c uID=""/><d uID="d"/></a>"#);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        tixi.set_message_sink(move |kind: MessageType, text: &str| {
            sink.lock().unwrap().push((kind, text.to_string()));
        });
        tixi.uid_check_duplicates(h).unwrap();
        let warnings = seen
            .lock()
            .unwrap()
            .iter()
            .filter(|(kind, _)| *kind == MessageType::Warning)
            .count();
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_set_uid() {
        let (mut tixi, h) = open(LINKED);
        tixi.uid_set_to_xpath(h, "/cpacs/wing[2]/ref", "r1").unwrap();
        assert_eq!(tixi.uid_get_xpath(h, "r1").unwrap(), "/cpacs/wing[2]/ref");

        let (mut dup, h) = open(r#"<a><b uID="x"/><c uID="x"/><d/></a>"#);
        assert_eq!(
            dup.uid_set_to_xpath(h, "/a/d", "y").unwrap_err().code(),
            ReturnCode::UidNotUnique
        );
    }

    #[test]
    fn test_add_link() {
        let (mut tixi, h) = open(LINKED);
        let created = tixi
            .uid_add_link(h, "/cpacs/wing[1]", "target", "w2", AddLinkMode::Create)
            .unwrap();
        assert_eq!(created, None);
        let opened = tixi
            .uid_add_link(h, "/cpacs/wing[1]", "target", "w2", AddLinkMode::CreateAndOpen)
            .unwrap();
        assert_eq!(opened.as_deref(), Some("/cpacs/wing[2]"));
        assert_eq!(
            tixi.xpath_evaluate_node_number(h, "/cpacs/wing[1]/target[@isLink='w2']")
                .unwrap(),
            1
        );
        assert_eq!(
            tixi.uid_add_link(h, "/cpacs", "target", "missing", AddLinkMode::Create)
                .unwrap_err()
                .code(),
            ReturnCode::UidDontExists
        );
        assert_eq!(AddLinkMode::from_i32(1).unwrap(), AddLinkMode::CreateAndOpen);
        assert_eq!(AddLinkMode::from_i32(4).unwrap_err().code(), ReturnCode::Failed);
        tixi.uid_check_links(h).unwrap();
    }
}
