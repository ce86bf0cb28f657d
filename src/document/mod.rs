//! The document handle registry.
//!
//! A [`Tixi`] value owns every open document and hands out
//! [`DocumentHandle`]s for them. Handles start at 1 and are never reused
//! within one registry, so a stale handle reliably yields
//! `INVALID_HANDLE` instead of silently addressing a newer document.
//!
//! ```
//! use tixi::Tixi;
//!
//! let mut tixi = Tixi::new();
//! let h = tixi.create_document("cpacs").unwrap();
//! tixi.add_text_element(h, "/cpacs", "name", Some("D150")).unwrap();
//! assert_eq!(tixi.get_text_element(h, "/cpacs/name").unwrap(), "D150");
//! tixi.close_document(h).unwrap();
//! assert!(tixi.check_document_handle(h).is_err());
//! ```

pub(crate) mod external;
mod lookup;
mod options;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

pub use options::TixiOptions;

use crate::error::{Result, TixiError};
use crate::message::{MessageSink, Messenger};
use crate::parser::ParseOptions;
use crate::serial::{serialize_node, serialize_with_options, SerializeOptions};
use crate::tree::{is_valid_qname, Document, NodeId, NodeKind};
use crate::xpath::XNode;

use external::SaveMode;

/// File name given to documents imported from a string.
const IMPORTED_FILE_NAME: &str = "tixiDocument.xml";

/// Opaque reference to a document held by a [`Tixi`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentHandle(i32);

impl DocumentHandle {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<i32> for DocumentHandle {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Opened,
    Saved,
}

/// How [`Tixi::open_document_recursive`] treats `externaldata` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Load the file as is.
    #[default]
    Plain,
    /// Splice every referenced external file into the tree.
    Recursive,
}

impl OpenMode {
    /// Converts the numeric mode (0 plain, 1 recursive).
    ///
    /// # Errors
    ///
    /// Returns `FAILED` for any other value.
    pub fn from_i32(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Plain),
            1 => Ok(Self::Recursive),
            other => Err(TixiError::Failed(format!("unknown open mode {other}"))),
        }
    }
}

/// An open document and its bookkeeping.
#[derive(Debug)]
pub struct TixiDocument {
    pub(crate) tree: Document,
    pub(crate) file_name: Option<String>,
    pub(crate) dir_name: Option<PathBuf>,
    pub(crate) path: Option<PathBuf>,
    pub(crate) status: DocumentStatus,
    pub(crate) pretty_print: bool,
    /// Prefix to URI bindings usable in XPath expressions.
    pub(crate) namespaces: HashMap<String, String>,
    pub(crate) has_included_external_files: bool,
    pub(crate) parse_options: ParseOptions,
    indent: String,
    cache_enabled: bool,
    /// Set while a mutating operation runs.
    cache_suspended: bool,
    /// The last query and its result.
    cache: RefCell<Option<(String, Vec<XNode>)>>,
}

impl TixiDocument {
    fn new(tree: Document, options: &TixiOptions) -> Self {
        Self {
            tree,
            file_name: None,
            dir_name: None,
            path: None,
            status: DocumentStatus::Opened,
            pretty_print: options.pretty_print,
            namespaces: HashMap::new(),
            has_included_external_files: false,
            parse_options: options.parse_options(),
            indent: options.indent.clone(),
            cache_enabled: options.xpath_cache,
            cache_suspended: false,
            cache: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn tree(&self) -> &Document {
        &self.tree
    }

    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    #[must_use]
    pub fn dir_name(&self) -> Option<&Path> {
        self.dir_name.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    #[must_use]
    pub fn is_pretty_print(&self) -> bool {
        self.pretty_print
    }

    #[must_use]
    pub fn has_included_external_files(&self) -> bool {
        self.has_included_external_files
    }

    /// The registered prefix to URI bindings.
    #[must_use]
    pub fn registered_namespaces(&self) -> &HashMap<String, String> {
        &self.namespaces
    }

    pub(crate) fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions::default()
            .indent(self.pretty_print)
            .indent_str(&self.indent)
    }

    pub(crate) fn to_xml(&self) -> String {
        serialize_with_options(&self.tree, &self.serialize_options())
    }

    pub(crate) fn subtree_to_xml(&self, id: NodeId) -> String {
        serialize_node(&self.tree, id, &self.serialize_options())
    }

    /// Creates a detached element named `qname`. A prefix is kept as the
    /// element's prefix and resolved once the element is attached.
    pub(crate) fn new_element(&mut self, qname: &str) -> Result<NodeId> {
        if !is_valid_qname(qname) {
            return Err(TixiError::InvalidXmlName(qname.to_string()));
        }
        let id = self.tree.create_node(NodeKind::element(qname));
        self.tree.rename(id, qname);
        Ok(id)
    }

    fn cache_active(&self) -> bool {
        self.cache_enabled && !self.cache_suspended
    }

    fn cached(&self, expression: &str) -> Option<Vec<XNode>> {
        if !self.cache_active() {
            return None;
        }
        match &*self.cache.borrow() {
            Some((cached, nodes)) if cached == expression => Some(nodes.clone()),
            _ => None,
        }
    }

    fn remember(&self, expression: &str, nodes: &[XNode]) {
        if self.cache_active() {
            *self.cache.borrow_mut() = Some((expression.to_string(), nodes.to_vec()));
        }
    }

    fn invalidate_cache(&mut self) {
        self.cache.get_mut().take();
    }
}

/// The document registry.
#[derive(Debug)]
pub struct Tixi {
    documents: BTreeMap<DocumentHandle, TixiDocument>,
    next_handle: i32,
    options: TixiOptions,
    messages: Messenger,
}

impl Default for Tixi {
    fn default() -> Self {
        Self::new()
    }
}

impl Tixi {
    /// Creates an empty registry with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(TixiOptions::default())
    }

    #[must_use]
    pub fn with_options(options: TixiOptions) -> Self {
        Self {
            documents: BTreeMap::new(),
            next_handle: 1,
            options,
            messages: Messenger::default(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &TixiOptions {
        &self.options
    }

    /// The library version string.
    #[must_use]
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Routes every message to `sink` in addition to `tracing`.
    pub fn set_message_sink(&mut self, sink: impl MessageSink + 'static) {
        self.messages.set_sink(Box::new(sink));
    }

    pub fn clear_message_sink(&mut self) {
        self.messages.clear_sink();
    }

    /// Suppresses sink output. `tracing` still receives everything.
    pub fn silence_messages(&mut self, silenced: bool) {
        self.messages.silence(silenced);
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Opens an XML file without resolving external data.
    ///
    /// # Errors
    ///
    /// `OPEN_FAILED` when the file cannot be read, `NOT_WELL_FORMED` when
    /// it does not parse.
    pub fn open_document(&mut self, path: impl AsRef<Path>) -> Result<DocumentHandle> {
        self.open_document_recursive(path, OpenMode::Plain)
    }

    /// Opens an XML file, splicing in external data files when `mode` is
    /// [`OpenMode::Recursive`].
    ///
    /// # Errors
    ///
    /// As [`Tixi::open_document`], plus `OPEN_FAILED` when an external data
    /// node is incomplete or one of its files cannot be read. No handle is
    /// registered on failure.
    pub fn open_document_recursive(
        &mut self,
        path: impl AsRef<Path>,
        mode: OpenMode,
    ) -> Result<DocumentHandle> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| self.messages.report(TixiError::open_failed(path.display(), e)))?;
        let mut tree = Document::parse_bytes_with_options(&bytes, &self.options.parse_options())
            .map_err(|e| self.messages.report(e.into()))?;
        tree.encoding = None;
        for diagnostic in &tree.diagnostics {
            self.messages.warn(&diagnostic.to_string());
        }

        let mut doc = TixiDocument::new(tree, &self.options);
        doc.path = Some(path.to_path_buf());
        doc.file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        doc.dir_name = Some(path.parent().map(Path::to_path_buf).unwrap_or_default());

        if mode == OpenMode::Recursive {
            let count = external::include_external_files(&mut doc, &self.messages)
                .map_err(|e| self.messages.report(e))?;
            doc.has_included_external_files = count > 0;
        }
        let handle = self.insert(doc);
        self.messages
            .status(&format!("opened {} as document {handle}", path.display()));
        Ok(handle)
    }

    /// Creates a document holding only a root element.
    ///
    /// # Errors
    ///
    /// `INVALID_XML_NAME` when `root_name` is not a valid XML name.
    pub fn create_document(&mut self, root_name: &str) -> Result<DocumentHandle> {
        let mut doc = TixiDocument::new(Document::new(), &self.options);
        let root = doc
            .new_element(root_name)
            .map_err(|e| self.messages.report(e))?;
        let document_node = doc.tree.root();
        doc.tree.append_child(document_node, root);
        Ok(self.insert(doc))
    }

    /// Parses `xml` into a new document.
    ///
    /// # Errors
    ///
    /// `NOT_WELL_FORMED` when the string does not parse.
    pub fn import_from_string(&mut self, xml: &str) -> Result<DocumentHandle> {
        let mut tree = Document::parse_str_with_options(xml, &self.options.parse_options())
            .map_err(|e| self.messages.report(e.into()))?;
        tree.encoding = None;
        let mut doc = TixiDocument::new(tree, &self.options);
        doc.file_name = Some(IMPORTED_FILE_NAME.to_string());
        doc.dir_name = Some(PathBuf::from("./"));
        Ok(self.insert(doc))
    }

    /// The path the document was opened from or last saved to.
    ///
    /// # Errors
    ///
    /// `INVALID_HANDLE` for an unknown handle.
    pub fn get_document_path(&self, handle: DocumentHandle) -> Result<Option<&Path>> {
        Ok(self.document(handle)?.path.as_deref())
    }

    /// Saves the document, writing spliced-in external data back to its
    /// own files and restoring the `externaldata` nodes in the main file.
    ///
    /// # Errors
    ///
    /// `INVALID_HANDLE`, or `FAILED` when a file cannot be written.
    pub fn save_document(&mut self, handle: DocumentHandle, path: impl AsRef<Path>) -> Result<()> {
        self.save(handle, path.as_ref(), SaveMode::Split)
    }

    /// Saves the whole tree, external data included, to a single file.
    ///
    /// # Errors
    ///
    /// As [`Tixi::save_document`].
    pub fn save_complete_document(
        &mut self,
        handle: DocumentHandle,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        self.save(handle, path.as_ref(), SaveMode::Complete)
    }

    /// Saves a copy of the document without the spliced-in external data.
    ///
    /// # Errors
    ///
    /// As [`Tixi::save_document`].
    pub fn save_and_remove_document(
        &mut self,
        handle: DocumentHandle,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        self.save(handle, path.as_ref(), SaveMode::Removed)
    }

    fn save(&mut self, handle: DocumentHandle, path: &Path, mode: SaveMode) -> Result<()> {
        let Some(doc) = self.documents.get_mut(&handle) else {
            return Err(self.messages.report(TixiError::InvalidHandle(handle.0)));
        };
        external::save(doc, path, mode).map_err(|e| self.messages.report(e))?;
        doc.path = Some(path.to_path_buf());
        doc.status = DocumentStatus::Saved;
        self.messages
            .status(&format!("saved document {handle} to {}", path.display()));
        Ok(())
    }

    /// Closes a document and releases it.
    ///
    /// # Errors
    ///
    /// `INVALID_HANDLE` for an unknown handle.
    pub fn close_document(&mut self, handle: DocumentHandle) -> Result<()> {
        match self.documents.remove(&handle) {
            Some(_) => Ok(()),
            None => Err(self.messages.report(TixiError::InvalidHandle(handle.0))),
        }
    }

    pub fn close_all_documents(&mut self) {
        self.documents.clear();
    }

    /// Closes every document. The registry stays usable and keeps counting
    /// handles from where it was.
    pub fn cleanup(&mut self) {
        self.close_all_documents();
    }

    /// Serializes the document, honouring its pretty-print flag.
    ///
    /// # Errors
    ///
    /// `INVALID_HANDLE` for an unknown handle.
    pub fn export_document_as_string(&self, handle: DocumentHandle) -> Result<String> {
        self.read(handle, |doc| Ok(doc.to_xml()))
    }

    /// Sets the pretty-print flag: 1 indents output, 0 writes it compact.
    ///
    /// # Errors
    ///
    /// `INVALID_HANDLE`, or `FAILED` for any value but 0 and 1.
    pub fn use_pretty_print(&mut self, handle: DocumentHandle, flag: i32) -> Result<()> {
        self.configure(handle, |doc| {
            doc.pretty_print = match flag {
                0 => false,
                1 => true,
                other => {
                    return Err(TixiError::Failed(format!(
                        "pretty print flag must be 0 or 1, got {other}"
                    )))
                }
            };
            Ok(())
        })
    }

    /// # Errors
    ///
    /// `INVALID_HANDLE` for an unknown handle.
    pub fn check_document_handle(&self, handle: DocumentHandle) -> Result<()> {
        self.document(handle).map(|_| ())
    }

    /// Enables or disables the single-entry query cache.
    ///
    /// # Errors
    ///
    /// `INVALID_HANDLE` for an unknown handle.
    pub fn set_cache_enabled(&mut self, handle: DocumentHandle, enabled: bool) -> Result<()> {
        self.configure(handle, |doc| {
            doc.cache_enabled = enabled;
            Ok(())
        })
    }

    /// Borrows an open document.
    ///
    /// # Errors
    ///
    /// `INVALID_HANDLE` for an unknown handle.
    pub fn document(&self, handle: DocumentHandle) -> Result<&TixiDocument> {
        self.documents
            .get(&handle)
            .ok_or_else(|| self.messages.report(TixiError::InvalidHandle(handle.0)))
    }

    /// Handles of all open documents, in ascending order.
    pub fn handles(&self) -> impl Iterator<Item = DocumentHandle> + '_ {
        self.documents.keys().copied()
    }

    // ---------------------------------------------------------------------
    // Access helpers
    // ---------------------------------------------------------------------

    fn insert(&mut self, doc: TixiDocument) -> DocumentHandle {
        let handle = DocumentHandle(self.next_handle);
        self.next_handle += 1;
        self.documents.insert(handle, doc);
        handle
    }

    pub(crate) fn messages(&self) -> &Messenger {
        &self.messages
    }

    /// Runs a read-only operation. Errors are reported before returning.
    pub(crate) fn read<T>(
        &self,
        handle: DocumentHandle,
        f: impl FnOnce(&TixiDocument) -> Result<T>,
    ) -> Result<T> {
        let doc = self.document(handle)?;
        f(doc).map_err(|e| self.messages.report(e))
    }

    /// Runs a mutating operation. Saved documents are read-only; the query
    /// cache is bypassed while `f` runs and cleared afterwards.
    pub(crate) fn write<T>(
        &mut self,
        handle: DocumentHandle,
        f: impl FnOnce(&mut TixiDocument) -> Result<T>,
    ) -> Result<T> {
        self.modify(handle, true, |doc, _| f(doc))
    }

    /// Like [`Tixi::write`], but also allowed on saved documents.
    pub(crate) fn configure<T>(
        &mut self,
        handle: DocumentHandle,
        f: impl FnOnce(&mut TixiDocument) -> Result<T>,
    ) -> Result<T> {
        self.modify(handle, false, |doc, _| f(doc))
    }

    /// Mutating access with the message channel for warnings.
    pub(crate) fn modify<T>(
        &mut self,
        handle: DocumentHandle,
        reject_saved: bool,
        f: impl FnOnce(&mut TixiDocument, &Messenger) -> Result<T>,
    ) -> Result<T> {
        let Some(doc) = self.documents.get_mut(&handle) else {
            return Err(self.messages.report(TixiError::InvalidHandle(handle.0)));
        };
        if reject_saved && doc.status == DocumentStatus::Saved {
            return Err(self.messages.report(TixiError::AlreadySaved(handle.0)));
        }
        doc.cache_suspended = true;
        let result = f(doc, &self.messages);
        doc.cache_suspended = false;
        doc.invalidate_cache();
        result.map_err(|e| self.messages.report(e))
    }
}
