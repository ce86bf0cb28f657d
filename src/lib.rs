//! # tixi
//!
//! Handle-based access to XML data files. Documents are opened into a
//! [`Tixi`] registry and addressed through [`DocumentHandle`]s; every
//! element and attribute is reached by an XPath expression that has to
//! select exactly one node.
//!
//! On top of plain text access the crate reads and writes typed values,
//! vectors, points, matrices and multi-dimensional arrays, keeps `uID`
//! cross references consistent and splits documents across external
//! files.
//!
//! ## Quick Start
//!
//! ```
//! use tixi::Tixi;
//!
//! let mut tixi = Tixi::new();
//! let h = tixi.create_document("cpacs").unwrap();
//! tixi.add_double_element(h, "/cpacs", "span", 34.1, Some("%.2f")).unwrap();
//! assert_eq!(tixi.get_text_element(h, "/cpacs/span").unwrap(), "34.10");
//! assert!((tixi.get_double_element(h, "/cpacs/span").unwrap() - 34.1).abs() < 1e-12);
//! ```

pub mod document;
pub mod encoding;
pub mod error;
pub mod message;
pub mod numeric;
pub mod parser;
pub mod serial;
pub mod tree;
pub mod uid;
pub mod xpath;

mod attributes;
mod elements;
mod header;
mod namespaces;

pub use document::{DocumentHandle, DocumentStatus, OpenMode, Tixi, TixiDocument, TixiOptions};
pub use error::{ReturnCode, Result, TixiError};
pub use message::{MessageSink, MessageType};
pub use numeric::StorageMode;
pub use tree::{Attribute, Document, NodeId};
pub use uid::AddLinkMode;
