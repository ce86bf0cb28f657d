//! Syntax tree for parsed `XPath` 1.0 expressions.
//!
//! Location paths are lists of [`Step`]s, each an [`Axis`], a [`NodeTest`]
//! and zero or more predicates. Name tests keep their prefix unresolved;
//! prefixes are bound to URIs at evaluation time.

use std::fmt;

/// An `XPath` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    String(String),
    /// `$name`, stored without the dollar sign.
    Variable(String),
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary minus.
    Negate(Box<Expr>),
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },
    /// A relative location path, evaluated from the context node.
    Path(Vec<Step>),
    /// An absolute location path. No steps means the bare `/`.
    RootPath(Vec<Step>),
    /// A primary expression narrowed by predicates, e.g. `(//a)[2]`.
    Filter {
        base: Box<Expr>,
        predicates: Vec<Expr>,
    },
    /// A filter expression followed by `/steps`, e.g. `(//a)[1]/b`.
    PathFrom {
        base: Box<Expr>,
        steps: Vec<Step>,
    },
    Union(Box<Expr>, Box<Expr>),
}

/// Arithmetic, comparison and boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "div",
            Self::Mod => "mod",
        })
    }
}

/// One step of a location path.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    /// A step without predicates.
    #[must_use]
    pub fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }

    /// The step that `//` expands to.
    #[must_use]
    pub fn descendant_or_self() -> Self {
        Self::new(Axis::DescendantOrSelf, NodeTest::Node)
    }
}

/// The thirteen `XPath` axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Ancestor,
    AncestorOrSelf,
    Attribute,
    Child,
    Descendant,
    DescendantOrSelf,
    Following,
    FollowingSibling,
    Namespace,
    Parent,
    Preceding,
    PrecedingSibling,
    SelfAxis,
}

impl Axis {
    const NAMES: [(&'static str, Self); 13] = [
        ("ancestor", Self::Ancestor),
        ("ancestor-or-self", Self::AncestorOrSelf),
        ("attribute", Self::Attribute),
        ("child", Self::Child),
        ("descendant", Self::Descendant),
        ("descendant-or-self", Self::DescendantOrSelf),
        ("following", Self::Following),
        ("following-sibling", Self::FollowingSibling),
        ("namespace", Self::Namespace),
        ("parent", Self::Parent),
        ("preceding", Self::Preceding),
        ("preceding-sibling", Self::PrecedingSibling),
        ("self", Self::SelfAxis),
    ];

    /// Looks up an axis by its `XPath` name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, axis)| *axis)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, axis)| *axis == self)
            .map_or("self", |(n, _)| n)
    }

    /// Reverse axes number their context positions backwards from the
    /// context node.
    #[must_use]
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Self::Ancestor
                | Self::AncestorOrSelf
                | Self::Preceding
                | Self::PrecedingSibling
                | Self::Parent
        )
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Filters the nodes an axis produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// A (possibly prefixed) name test.
    Name {
        prefix: Option<String>,
        local: String,
    },
    /// `*`
    Any,
    /// `prefix:*`
    AnyInNamespace(String),
    /// `node()`
    Node,
    /// `text()`, which also matches CDATA sections.
    Text,
    /// `comment()`
    Comment,
    /// `processing-instruction()` with an optional target literal.
    ProcessingInstruction(Option<String>),
}

impl NodeTest {
    /// Builds a name test from a `QName` token.
    #[must_use]
    pub fn from_qname(qname: &str) -> Self {
        match qname.split_once(':') {
            Some((prefix, local)) => Self::Name {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
            None => Self::Name {
                prefix: None,
                local: qname.to_string(),
            },
        }
    }
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name {
                prefix: Some(p),
                local,
            } => write!(f, "{p}:{local}"),
            Self::Name {
                prefix: None,
                local,
            } => f.write_str(local),
            Self::Any => f.write_str("*"),
            Self::AnyInNamespace(p) => write!(f, "{p}:*"),
            Self::Node => f.write_str("node()"),
            Self::Text => f.write_str("text()"),
            Self::Comment => f.write_str("comment()"),
            Self::ProcessingInstruction(None) => f.write_str("processing-instruction()"),
            Self::ProcessingInstruction(Some(t)) => write!(f, "processing-instruction('{t}')"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_axis_names_round_trip() {
        for (name, axis) in Axis::NAMES {
            assert_eq!(Axis::from_name(name), Some(axis));
            assert_eq!(axis.to_string(), name);
        }
        assert_eq!(Axis::from_name("sideways"), None);
    }

    #[test]
    fn test_reverse_axes() {
        assert!(Axis::Ancestor.is_reverse());
        assert!(Axis::PrecedingSibling.is_reverse());
        assert!(!Axis::Child.is_reverse());
        assert!(!Axis::Attribute.is_reverse());
    }

    #[test]
    fn test_node_test_from_qname() {
        assert_eq!(
            NodeTest::from_qname("c:wing"),
            NodeTest::Name {
                prefix: Some("c".to_string()),
                local: "wing".to_string()
            }
        );
        assert_eq!(NodeTest::from_qname("wing").to_string(), "wing");
        assert_eq!(NodeTest::AnyInNamespace("c".into()).to_string(), "c:*");
        assert_eq!(
            NodeTest::ProcessingInstruction(Some("pi".into())).to_string(),
            "processing-instruction('pi')"
        );
    }
}
