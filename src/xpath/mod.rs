//! `XPath` 1.0 query engine.
//!
//! Expressions are tokenized by [`lexer`], parsed into an [`ast::Expr`] by
//! [`parser`] and evaluated by [`XPathContext`]. Node-sets hold
//! [`XNode`]s so attributes can be selected, counted and addressed like
//! any other node.
//!
//! ```
//! use tixi::Document;
//! use tixi::xpath::{evaluate, XPathValue};
//!
//! let doc = Document::parse_str(r#"<a><b uID="x"/><b/></a>"#).unwrap();
//! let value = evaluate(&doc, doc.root(), "count(//@uID)").unwrap();
//! assert_eq!(value, XPathValue::Number(1.0));
//! ```
//!
//! The namespace axis always yields an empty node-set; namespace
//! declarations are not modelled as nodes.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod types;

use std::collections::HashMap;

pub use eval::XPathContext;
pub use parser::parse;
pub use types::{XNode, XPathError, XPathValue};

use crate::tree::{Document, NodeId};

/// Parses and evaluates `expression` with `context_node` as the context.
///
/// # Errors
///
/// Returns [`XPathError`] for syntax errors and evaluation failures,
/// including any prefixed name test (only `xml` is predeclared).
pub fn evaluate(
    doc: &Document,
    context_node: NodeId,
    expression: &str,
) -> Result<XPathValue, XPathError> {
    let expr = parse(expression)?;
    XPathContext::new(doc, context_node).evaluate(&expr)
}

/// Evaluates `expression` from the document node with the given
/// prefix-to-URI bindings and returns the selected nodes.
///
/// # Errors
///
/// Returns [`XPathError::TypeError`] when the expression does not yield
/// a node-set, plus every error [`evaluate`] can return.
pub fn select_nodes(
    doc: &Document,
    expression: &str,
    namespaces: &HashMap<String, String>,
) -> Result<Vec<XNode>, XPathError> {
    let expr = parse(expression)?;
    XPathContext::new(doc, doc.root())
        .with_namespaces(namespaces)
        .evaluate(&expr)?
        .into_node_set()
}
