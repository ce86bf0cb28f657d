//! XML serialization.
//!
//! Turns a `Document` tree, or any subtree of it, back into XML text with
//! proper escaping and optional indentation.

pub mod xml;

pub use xml::{serialize, serialize_node, serialize_with_options, SerializeOptions};
