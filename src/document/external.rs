//! External data files.
//!
//! A document may reference other XML files through nodes like
//!
//! ```xml
//! <externaldata>
//!   <path>data/</path>
//!   <filename>wing.xml</filename>
//! </externaldata>
//! ```
//!
//! A recursive open splices the root of each file in place of the node
//! and tags it with where it came from. Saving reverses that: the tagged
//! subtrees are written back to their files and the `externaldata` node
//! is restored, on a copy so the open document stays as it is.

use std::path::{Path, PathBuf};

use crate::error::{Result, TixiError};
use crate::message::Messenger;
use crate::serial::serialize_with_options;
use crate::tree::{Document, NodeId, NodeKind};

use super::TixiDocument;

const EXTERNAL_DATA: &str = "externaldata";
const PATH: &str = "path";
const FILENAME: &str = "filename";

const ATTR_FILE_NAME: &str = "externalFileName";
const ATTR_DIRECTORY: &str = "externalDataDirectory";
const ATTR_NODE_PATH: &str = "externalDataNodePath";

const REMOTE_SCHEMES: [&str; 4] = ["http://", "https://", "ftp://", "ssh://"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SaveMode {
    /// The tree as it is.
    Complete,
    /// Spliced-in files written back, `externaldata` nodes restored.
    Split,
    /// Spliced-in subtrees dropped.
    Removed,
}

/// Replaces every `externaldata` node, including ones brought in by
/// external files themselves, and returns the number of files spliced in.
pub(crate) fn include_external_files(doc: &mut TixiDocument, messages: &Messenger) -> Result<usize> {
    let mut count = 0;
    while let Some(node) = first_external_data_node(&doc.tree) {
        count += include_node(doc, node, messages)?;
    }
    Ok(count)
}

fn first_external_data_node(tree: &Document) -> Option<NodeId> {
    tree.descendants(tree.root())
        .find(|&id| tree.is_element(id) && tree.qualified_name(id).as_deref() == Some(EXTERNAL_DATA))
}

fn child_texts(tree: &Document, parent: NodeId, name: &str) -> Vec<String> {
    tree.children(parent)
        .filter(|&c| tree.qualified_name(c).as_deref() == Some(name))
        .map(|c| tree.direct_text(c))
        .collect()
}

fn include_node(doc: &mut TixiDocument, node: NodeId, messages: &Messenger) -> Result<usize> {
    let node_path = doc.tree.node_path(node);
    let Some(directory) = child_texts(&doc.tree, node, PATH).into_iter().next() else {
        return Err(TixiError::open_failed(
            &node_path,
            "no path defined in externaldata node",
        ));
    };
    let files = child_texts(&doc.tree, node, FILENAME);
    if files.is_empty() {
        return Err(TixiError::open_failed(
            &node_path,
            "no filename defined in externaldata node",
        ));
    }
    let resolved = resolve_directory(doc.dir_name.as_deref(), &directory)
        .ok_or_else(|| TixiError::open_failed(&directory, "only local files can be included"))?;
    let parent = doc.tree.parent(node).unwrap_or_else(|| doc.tree.root());
    let parent_path = doc.tree.node_path(parent);
    let directory_uri = local_path_to_uri(&directory);

    let mut count = 0;
    for file in files {
        let full = resolved.join(&file);
        let bytes =
            std::fs::read(&full).map_err(|e| TixiError::open_failed(full.display(), e))?;
        let external = match Document::parse_bytes_with_options(&bytes, &doc.parse_options) {
            Ok(external) => external,
            Err(e) => {
                messages.warn(&format!(
                    "document {} will be ignored, not a valid XML document: {e}",
                    full.display()
                ));
                continue;
            }
        };
        let Some(root) = external.root_element() else {
            continue;
        };
        let copy = doc.tree.import(&external, root);
        doc.tree.set_attribute(copy, ATTR_FILE_NAME, &file);
        doc.tree.set_attribute(copy, ATTR_DIRECTORY, &directory_uri);
        doc.tree.set_attribute(copy, ATTR_NODE_PATH, &parent_path);
        doc.tree.insert_before(node, copy);
        count += 1;
        tracing::debug!(file = %full.display(), at = %parent_path, "included external file");
    }
    doc.tree.detach(node);
    Ok(count)
}

/// Resolves an external data directory to a local path. Relative paths
/// and relative `file://` URIs are taken relative to `base`. Remote URIs
/// yield `None`.
fn resolve_directory(base: Option<&Path>, directory: &str) -> Option<PathBuf> {
    let local = match directory.strip_prefix("file://") {
        Some(rest) => rest,
        None if REMOTE_SCHEMES.iter().any(|s| directory.starts_with(s)) => return None,
        None => directory,
    };
    let local = Path::new(local);
    if local.is_absolute() {
        return Some(local.to_path_buf());
    }
    Some(base.map_or_else(|| local.to_path_buf(), |b| b.join(local)))
}

fn local_path_to_uri(directory: &str) -> String {
    if directory.starts_with("file://") || REMOTE_SCHEMES.iter().any(|s| directory.starts_with(s)) {
        directory.to_string()
    } else {
        format!("file://{directory}")
    }
}

/// Whether `id` is the root of a spliced-in external file.
fn is_included_root(tree: &Document, id: NodeId) -> bool {
    tree.is_element(id)
        && [ATTR_FILE_NAME, ATTR_DIRECTORY, ATTR_NODE_PATH]
            .iter()
            .all(|name| tree.attribute(id, name).is_some())
}

/// Included roots, innermost first.
fn included_roots(tree: &Document) -> Vec<NodeId> {
    let mut roots: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| is_included_root(tree, id))
        .collect();
    roots.reverse();
    roots
}

/// Writes `doc` to `path` according to `mode`.
pub(crate) fn save(doc: &TixiDocument, path: &Path, mode: SaveMode) -> Result<()> {
    let options = doc.serialize_options().encoding("utf-8");
    let xml = match mode {
        SaveMode::Complete => serialize_with_options(&doc.tree, &options),
        SaveMode::Split => {
            let mut copy = doc.tree.clone();
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            split_included_files(&mut copy, base, doc)?;
            serialize_with_options(&copy, &options)
        }
        SaveMode::Removed => {
            let mut copy = doc.tree.clone();
            for id in included_roots(&copy) {
                copy.detach(id);
            }
            serialize_with_options(&copy, &options)
        }
    };
    write_file(path, &xml)
}

fn write_file(path: &Path, xml: &str) -> Result<()> {
    std::fs::write(path, xml).map_err(|source| TixiError::WriteFailed {
        path: path.display().to_string(),
        source,
    })
}

fn split_included_files(tree: &mut Document, base: &Path, doc: &TixiDocument) -> Result<()> {
    for id in included_roots(tree) {
        let file_name = tree.attribute(id, ATTR_FILE_NAME).unwrap_or_default().to_string();
        let directory = tree.attribute(id, ATTR_DIRECTORY).unwrap_or_default().to_string();
        for name in [ATTR_FILE_NAME, ATTR_DIRECTORY, ATTR_NODE_PATH] {
            tree.remove_attribute(id, name);
        }

        if let Some(dir) = resolve_directory(Some(base), &directory) {
            let mut external = Document::new();
            let root = external.import(tree, id);
            for anc in tree.ancestors(id).skip(1) {
                for decl in tree.namespace_decls(anc) {
                    let declared = external
                        .namespace_decls(root)
                        .iter()
                        .any(|d| d.prefix == decl.prefix);
                    if !declared {
                        external.declare_namespace(root, decl.prefix.as_deref(), &decl.uri);
                    }
                }
            }
            let document_node = external.root();
            external.append_child(document_node, root);
            let options = doc.serialize_options().encoding("utf-8");
            write_file(&dir.join(&file_name), &serialize_with_options(&external, &options))?;
        }

        let parent = tree.parent(id).unwrap_or_else(|| tree.root());
        let holder = restored_holder(tree, parent, &directory);
        append_text_element(tree, holder, FILENAME, &file_name);
        tree.detach(id);
    }
    Ok(())
}

/// The `externaldata` child of `parent` for `directory`, created on demand.
fn restored_holder(tree: &mut Document, parent: NodeId, directory: &str) -> NodeId {
    let existing = tree.children(parent).find(|&c| {
        tree.qualified_name(c).as_deref() == Some(EXTERNAL_DATA)
            && child_texts(tree, c, PATH).first().map(String::as_str) == Some(directory)
    });
    if let Some(holder) = existing {
        return holder;
    }
    let holder = tree.create_node(NodeKind::element(EXTERNAL_DATA));
    tree.append_child(parent, holder);
    append_text_element(tree, holder, PATH, directory);
    holder
}

fn append_text_element(tree: &mut Document, parent: NodeId, name: &str, text: &str) -> NodeId {
    let element = tree.create_node(NodeKind::element(name));
    tree.append_child(parent, element);
    if !text.is_empty() {
        let content = tree.create_node(NodeKind::text(text));
        tree.append_child(element, content);
    }
    element
}
