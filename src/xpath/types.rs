//! `XPath` values, node references and errors.
//!
//! Attributes are not arena nodes, so node-sets hold [`XNode`]s: either a
//! tree node or an attribute addressed by its owning element and index.

use std::fmt;

use thiserror::Error;

use crate::tree::NodeId;

/// A member of a node-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XNode {
    Node(NodeId),
    /// The `index`-th attribute (0-based) of an element.
    Attribute(NodeId, usize),
}

impl XNode {
    /// The tree node itself, or the element owning the attribute.
    #[must_use]
    pub fn node_id(self) -> NodeId {
        match self {
            Self::Node(id) | Self::Attribute(id, _) => id,
        }
    }

    #[must_use]
    pub fn is_attribute(self) -> bool {
        matches!(self, Self::Attribute(..))
    }
}

/// One of the four `XPath` 1.0 data types.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue {
    Boolean(bool),
    Number(f64),
    String(String),
    /// Nodes in document order, without duplicates.
    NodeSet(Vec<XNode>),
}

impl XPathValue {
    /// `boolean()` conversion. Node-sets are true when non-empty.
    #[must_use]
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::NodeSet(nodes) => !nodes.is_empty(),
        }
    }

    /// `number()` conversion for scalar values. Node-sets need the
    /// document to compute a string-value and are converted by the
    /// evaluator instead; here they yield NaN.
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Boolean(true) => 1.0,
            Self::Boolean(false) => 0.0,
            Self::String(s) => parse_xpath_number(s),
            Self::NodeSet(_) => f64::NAN,
        }
    }

    /// `string()` conversion for scalar values. Node-sets yield "".
    #[must_use]
    pub fn to_xpath_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => format_xpath_number(*n),
            Self::NodeSet(_) => String::new(),
        }
    }

    #[must_use]
    pub fn as_node_set(&self) -> Option<&[XNode]> {
        match self {
            Self::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// Consumes the value, returning the node-set or the type name found.
    pub fn into_node_set(self) -> Result<Vec<XNode>, XPathError> {
        match self {
            Self::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::TypeError {
                expected: "node-set",
                found: other.type_name(),
            }),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::NodeSet(_) => "node-set",
        }
    }
}

impl fmt::Display for XPathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeSet(nodes) => write!(f, "<node-set of {} nodes>", nodes.len()),
            other => f.write_str(&other.to_xpath_string()),
        }
    }
}

/// Formats a number the way `string()` does: integers without a decimal
/// point, `NaN`, `Infinity` and `-Infinity` spelled out, and `-0` as `0`.
#[must_use]
pub fn format_xpath_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    #[allow(clippy::cast_possible_truncation)]
    if n.fract() == 0.0 && n.abs() < 1e18 {
        return (n as i64).to_string();
    }
    n.to_string()
}

/// String to number conversion: optional whitespace, an optional minus,
/// digits with an optional fraction. Anything else is NaN.
#[must_use]
pub fn parse_xpath_number(s: &str) -> f64 {
    let t = s.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n'));
    let digits = t.strip_prefix('-').unwrap_or(t);
    let valid = !digits.is_empty()
        && digits != "."
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1;
    if !valid {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// An error raised while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("type error: expected {expected}, found {found}")]
    TypeError {
        expected: &'static str,
        found: &'static str,
    },

    #[error("undefined variable: ${0}")]
    UndefinedVariable(String),

    #[error("undefined function: {0}()")]
    UndefinedFunction(String),

    #[error("{function}() expects {expected} argument(s), got {found}")]
    InvalidArgCount {
        function: String,
        expected: String,
        found: usize,
    },

    #[error("undefined namespace prefix: {0}")]
    UnknownPrefix(String),
}

impl XPathError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }
}
