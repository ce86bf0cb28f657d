//! `XPath` 1.0 evaluator.
//!
//! Walks an [`Expr`] against a [`Document`]. Location steps are applied per
//! context node, so predicates see proximity positions along the axis
//! (`//section[1]` selects the first section of every parent). Results are
//! merged into document order using a traversal of the tree computed once
//! per context.
//!
//! Name tests are namespace aware: an unprefixed test only matches nodes
//! in no namespace, and a prefix must be bound through
//! [`XPathContext::with_namespaces`] (or be `xml`).

use std::cell::OnceCell;
use std::collections::HashMap;

use super::ast::{Axis, BinaryOp, Expr, NodeTest, Step};
use super::types::{parse_xpath_number, XNode, XPathError, XPathValue};
use crate::tree::{Document, NodeId, NodeKind, XML_NAMESPACE};

type EvalResult<T> = Result<T, XPathError>;

/// Evaluation context: the document, the starting node, namespace
/// bindings and variables.
///
/// ```
/// use tixi::Document;
/// use tixi::xpath::{parse, XPathContext, XPathValue};
///
/// let doc = Document::parse_str("<a><b/><b/></a>").unwrap();
/// let ctx = XPathContext::new(&doc, doc.root());
/// let value = ctx.evaluate(&parse("count(/a/b)").unwrap()).unwrap();
/// assert_eq!(value, XPathValue::Number(2.0));
/// ```
pub struct XPathContext<'a> {
    doc: &'a Document,
    node: XNode,
    namespaces: Option<&'a HashMap<String, String>>,
    variables: HashMap<String, XPathValue>,
    order: OnceCell<HashMap<NodeId, usize>>,
}

/// The context node with its position and size in the current node-set.
#[derive(Debug, Clone, Copy)]
struct Focus {
    node: XNode,
    position: usize,
    size: usize,
}

impl<'a> XPathContext<'a> {
    #[must_use]
    pub fn new(doc: &'a Document, node: NodeId) -> Self {
        Self {
            doc,
            node: XNode::Node(node),
            namespaces: None,
            variables: HashMap::new(),
            order: OnceCell::new(),
        }
    }

    /// Binds prefixes (map keys) to namespace URIs for name tests.
    #[must_use]
    pub fn with_namespaces(mut self, namespaces: &'a HashMap<String, String>) -> Self {
        self.namespaces = Some(namespaces);
        self
    }

    pub fn set_variable(&mut self, name: &str, value: XPathValue) {
        self.variables.insert(name.to_string(), value);
    }

    /// Evaluates a parsed expression.
    ///
    /// # Errors
    ///
    /// Fails on unknown functions, variables or prefixes, wrong argument
    /// counts and operations that need a node-set but got something else.
    pub fn evaluate(&self, expr: &Expr) -> EvalResult<XPathValue> {
        let focus = Focus {
            node: self.node,
            position: 1,
            size: 1,
        };
        self.eval(expr, focus)
    }

    fn eval(&self, expr: &Expr, focus: Focus) -> EvalResult<XPathValue> {
        match expr {
            Expr::Number(n) => Ok(XPathValue::Number(*n)),
            Expr::String(s) => Ok(XPathValue::String(s.clone())),
            Expr::Variable(name) => self
                .variables
                .get(name)
                .cloned()
                .ok_or_else(|| XPathError::UndefinedVariable(name.clone())),
            Expr::BinaryOp { op, left, right } => self.binary(*op, left, right, focus),
            Expr::Negate(inner) => Ok(XPathValue::Number(-self.number(inner, focus)?)),
            Expr::FunctionCall { name, args } => self.call(name, args, focus),
            Expr::Path(steps) => self.walk(vec![focus.node], steps).map(XPathValue::NodeSet),
            Expr::RootPath(steps) => self
                .walk(vec![XNode::Node(self.doc.root())], steps)
                .map(XPathValue::NodeSet),
            Expr::Filter { base, predicates } => {
                let mut nodes = self.select(base, focus)?;
                for predicate in predicates {
                    nodes = self.filter(nodes, predicate)?;
                }
                Ok(XPathValue::NodeSet(nodes))
            }
            Expr::PathFrom { base, steps } => {
                let start = self.select(base, focus)?;
                self.walk(start, steps).map(XPathValue::NodeSet)
            }
            Expr::Union(left, right) => {
                let mut nodes = self.select(left, focus)?;
                nodes.extend(self.select(right, focus)?);
                self.sort_unique(&mut nodes);
                Ok(XPathValue::NodeSet(nodes))
            }
        }
    }

    fn select(&self, expr: &Expr, focus: Focus) -> EvalResult<Vec<XNode>> {
        self.eval(expr, focus)?.into_node_set()
    }

    fn binary(&self, op: BinaryOp, left: &Expr, right: &Expr, focus: Focus) -> EvalResult<XPathValue> {
        let value = match op {
            BinaryOp::Or => {
                self.eval(left, focus)?.to_boolean() || self.eval(right, focus)?.to_boolean()
            }
            BinaryOp::And => {
                self.eval(left, focus)?.to_boolean() && self.eval(right, focus)?.to_boolean()
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let (a, b) = (self.number(left, focus)?, self.number(right, focus)?);
                return Ok(XPathValue::Number(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => a % b,
                }));
            }
            _ => {
                let lhs = self.eval(left, focus)?;
                let rhs = self.eval(right, focus)?;
                self.compare(op, &lhs, &rhs)
            }
        };
        Ok(XPathValue::Boolean(value))
    }

    // -----------------------------------------------------------------
    // Location steps
    // -----------------------------------------------------------------

    fn walk(&self, start: Vec<XNode>, steps: &[Step]) -> EvalResult<Vec<XNode>> {
        let mut nodes = start;
        for step in steps {
            nodes = self.step(&nodes, step)?;
        }
        Ok(nodes)
    }

    fn step(&self, input: &[XNode], step: &Step) -> EvalResult<Vec<XNode>> {
        let uri = match &step.test {
            NodeTest::Name {
                prefix: Some(p), ..
            }
            | NodeTest::AnyInNamespace(p) => Some(self.resolve_prefix(p)?),
            _ => None,
        };
        let mut result = Vec::new();
        for &node in input {
            let mut matched: Vec<XNode> = self
                .axis(node, step.axis)
                .into_iter()
                .filter(|&n| self.test(n, &step.test, step.axis, uri))
                .collect();
            for predicate in &step.predicates {
                matched = self.filter(matched, predicate)?;
            }
            result.extend(matched);
        }
        self.sort_unique(&mut result);
        Ok(result)
    }

    /// Keeps the nodes for which `predicate` holds. A numeric predicate is
    /// compared with the node's position.
    fn filter(&self, nodes: Vec<XNode>, predicate: &Expr) -> EvalResult<Vec<XNode>> {
        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (i, node) in nodes.into_iter().enumerate() {
            let focus = Focus {
                node,
                position: i + 1,
                size,
            };
            let keep = match self.eval(predicate, focus)? {
                #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
                XPathValue::Number(n) => n == (i + 1) as f64,
                other => other.to_boolean(),
            };
            if keep {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    /// Nodes along `axis`, nearest first for reverse axes.
    fn axis(&self, node: XNode, axis: Axis) -> Vec<XNode> {
        let doc = self.doc;
        let wrap = |ids: Vec<NodeId>| ids.into_iter().map(XNode::Node).collect::<Vec<_>>();
        let id = match node {
            XNode::Node(id) => id,
            XNode::Attribute(owner, _) => {
                return match axis {
                    Axis::SelfAxis | Axis::DescendantOrSelf => vec![node],
                    Axis::Parent => vec![XNode::Node(owner)],
                    Axis::Ancestor => wrap(doc.ancestors(owner).collect()),
                    Axis::AncestorOrSelf => {
                        let mut v = vec![node];
                        v.extend(doc.ancestors(owner).map(XNode::Node));
                        v
                    }
                    Axis::Following => {
                        let mut v = wrap(doc.descendants(owner).collect());
                        v.extend(wrap(self.following(owner)));
                        v
                    }
                    Axis::Preceding => wrap(self.preceding(owner)),
                    _ => Vec::new(),
                };
            }
        };
        match axis {
            Axis::Child => wrap(doc.children(id).collect()),
            Axis::Descendant => wrap(doc.descendants(id).collect()),
            Axis::DescendantOrSelf => {
                let mut v = vec![node];
                v.extend(doc.descendants(id).map(XNode::Node));
                v
            }
            Axis::Parent => wrap(doc.parent(id).into_iter().collect()),
            Axis::Ancestor => wrap(doc.ancestors(id).skip(1).collect()),
            Axis::AncestorOrSelf => wrap(doc.ancestors(id).collect()),
            Axis::FollowingSibling => wrap(siblings(id, |n| doc.next_sibling(n))),
            Axis::PrecedingSibling => wrap(siblings(id, |n| doc.prev_sibling(n))),
            Axis::Following => wrap(self.following(id)),
            Axis::Preceding => wrap(self.preceding(id)),
            Axis::Attribute => (0..doc.attributes(id).len())
                .map(|i| XNode::Attribute(id, i))
                .collect(),
            // Namespace nodes are not part of the tree model.
            Axis::Namespace => Vec::new(),
            Axis::SelfAxis => vec![node],
        }
    }

    /// Everything after `id` in document order, minus its descendants.
    fn following(&self, id: NodeId) -> Vec<NodeId> {
        let doc = self.doc;
        let mut out = Vec::new();
        for anc in doc.ancestors(id) {
            for sib in siblings(anc, |n| doc.next_sibling(n)) {
                out.push(sib);
                out.extend(doc.descendants(sib));
            }
        }
        out
    }

    /// Everything before `id`, minus its ancestors, nearest first.
    fn preceding(&self, id: NodeId) -> Vec<NodeId> {
        let doc = self.doc;
        let mut out = Vec::new();
        for anc in doc.ancestors(id) {
            for sib in siblings(anc, |n| doc.prev_sibling(n)) {
                let mut subtree: Vec<NodeId> = doc.descendants(sib).collect();
                subtree.reverse();
                out.extend(subtree);
                out.push(sib);
            }
        }
        out
    }

    fn test(&self, node: XNode, test: &NodeTest, axis: Axis, uri: Option<&str>) -> bool {
        let id = match node {
            XNode::Node(id) => id,
            XNode::Attribute(owner, index) => {
                let Some(attr) = self.doc.attributes(owner).get(index) else {
                    return false;
                };
                return match test {
                    NodeTest::Node => true,
                    _ if axis != Axis::Attribute => false,
                    NodeTest::Any => true,
                    NodeTest::AnyInNamespace(_) => attr.namespace.as_deref() == uri,
                    NodeTest::Name {
                        prefix: None,
                        local,
                    } => attr.prefix.is_none() && attr.namespace.is_none() && attr.name == *local,
                    NodeTest::Name { local, .. } => {
                        attr.namespace.as_deref() == uri && attr.name == *local
                    }
                    _ => false,
                };
            }
        };
        match (&self.doc.node(id).kind, test) {
            (NodeKind::DocumentType { .. }, _) => false,
            (_, NodeTest::Node) => true,
            (NodeKind::Text { .. } | NodeKind::CData { .. }, NodeTest::Text)
            | (NodeKind::Comment { .. }, NodeTest::Comment)
            | (NodeKind::ProcessingInstruction { .. }, NodeTest::ProcessingInstruction(None)) => {
                true
            }
            (
                NodeKind::ProcessingInstruction { target, .. },
                NodeTest::ProcessingInstruction(Some(wanted)),
            ) => target == wanted,
            (NodeKind::Element { .. }, _) if axis == Axis::Attribute => false,
            (NodeKind::Element { .. }, NodeTest::Any) => true,
            (NodeKind::Element { namespace, .. }, NodeTest::AnyInNamespace(_)) => {
                namespace.as_deref() == uri
            }
            (
                NodeKind::Element {
                    name,
                    prefix,
                    namespace,
                    ..
                },
                NodeTest::Name {
                    prefix: None,
                    local,
                },
            ) => prefix.is_none() && namespace.is_none() && name == local,
            (
                NodeKind::Element {
                    name, namespace, ..
                },
                NodeTest::Name { local, .. },
            ) => namespace.as_deref() == uri && name == local,
            _ => false,
        }
    }

    fn resolve_prefix(&self, prefix: &str) -> EvalResult<&'a str> {
        if prefix == "xml" {
            return Ok(XML_NAMESPACE);
        }
        self.namespaces
            .and_then(|ns| ns.get(prefix))
            .map(String::as_str)
            .ok_or_else(|| XPathError::UnknownPrefix(prefix.to_string()))
    }

    /// Sorts into document order and drops duplicates. Attributes follow
    /// their owner element.
    fn sort_unique(&self, nodes: &mut Vec<XNode>) {
        if nodes.len() < 2 {
            return;
        }
        let order = self.order.get_or_init(|| self.doc.document_order());
        let key = |n: &XNode| -> (usize, usize) {
            let (id, sub) = match *n {
                XNode::Node(id) => (id, 0),
                XNode::Attribute(id, i) => (id, i + 1),
            };
            (order.get(&id).copied().unwrap_or(usize::MAX), sub)
        };
        nodes.sort_by_key(key);
        nodes.dedup();
    }

    // -----------------------------------------------------------------
    // Conversions
    // -----------------------------------------------------------------

    /// The string-value of a node.
    fn string_value(&self, node: XNode) -> String {
        match node {
            XNode::Node(id) => self.doc.text_content(id),
            XNode::Attribute(owner, index) => self
                .doc
                .attributes(owner)
                .get(index)
                .map(|a| a.value.clone())
                .unwrap_or_default(),
        }
    }

    fn to_string(&self, value: &XPathValue) -> String {
        match value {
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map(|&n| self.string_value(n))
                .unwrap_or_default(),
            other => other.to_xpath_string(),
        }
    }

    fn to_number(&self, value: &XPathValue) -> f64 {
        match value {
            XPathValue::NodeSet(_) => parse_xpath_number(&self.to_string(value)),
            other => other.to_number(),
        }
    }

    fn string(&self, expr: &Expr, focus: Focus) -> EvalResult<String> {
        Ok(self.to_string(&self.eval(expr, focus)?))
    }

    fn number(&self, expr: &Expr, focus: Focus) -> EvalResult<f64> {
        Ok(self.to_number(&self.eval(expr, focus)?))
    }

    fn compare(&self, op: BinaryOp, lhs: &XPathValue, rhs: &XPathValue) -> bool {
        use XPathValue::{Boolean, NodeSet, String as Str};
        match (lhs, rhs) {
            (NodeSet(nodes), Boolean(_)) => compare_scalars(op, &Boolean(!nodes.is_empty()), rhs),
            (Boolean(_), NodeSet(nodes)) => compare_scalars(op, lhs, &Boolean(!nodes.is_empty())),
            (NodeSet(left), NodeSet(right)) => {
                let right: Vec<XPathValue> = right
                    .iter()
                    .map(|&n| Str(self.string_value(n)))
                    .collect();
                left.iter().any(|&n| {
                    let a = Str(self.string_value(n));
                    right.iter().any(|b| compare_scalars(op, &a, b))
                })
            }
            (NodeSet(left), _) => left
                .iter()
                .any(|&n| compare_scalars(op, &Str(self.string_value(n)), rhs)),
            (_, NodeSet(right)) => right
                .iter()
                .any(|&n| compare_scalars(op, lhs, &Str(self.string_value(n)))),
            _ => compare_scalars(op, lhs, rhs),
        }
    }

    // -----------------------------------------------------------------
    // Core function library
    // -----------------------------------------------------------------

    #[allow(clippy::too_many_lines, clippy::cast_precision_loss)]
    fn call(&self, name: &str, args: &[Expr], focus: Focus) -> EvalResult<XPathValue> {
        use XPathValue::{Boolean, NodeSet, Number, String as Str};

        let arity = |min: usize, max: usize| -> EvalResult<()> {
            if (min..=max).contains(&args.len()) {
                return Ok(());
            }
            let expected = match (min, max) {
                (a, b) if a == b => a.to_string(),
                (a, usize::MAX) => format!("at least {a}"),
                (a, b) => format!("{a} to {b}"),
            };
            Err(XPathError::InvalidArgCount {
                function: name.to_string(),
                expected,
                found: args.len(),
            })
        };
        // The first argument as a string, defaulting to the context node.
        let string_or_context = |this: &Self| -> EvalResult<String> {
            match args.first() {
                Some(arg) => this.string(arg, focus),
                None => Ok(this.string_value(focus.node)),
            }
        };
        let node_or_context = |this: &Self| -> EvalResult<Option<XNode>> {
            match args.first() {
                Some(arg) => Ok(this.select(arg, focus)?.first().copied()),
                None => Ok(Some(focus.node)),
            }
        };

        let value = match name {
            "last" => {
                arity(0, 0)?;
                Number(focus.size as f64)
            }
            "position" => {
                arity(0, 0)?;
                Number(focus.position as f64)
            }
            "count" => {
                arity(1, 1)?;
                Number(self.select(&args[0], focus)?.len() as f64)
            }
            "id" => {
                arity(1, 1)?;
                self.eval(&args[0], focus)?;
                NodeSet(Vec::new())
            }
            "local-name" | "name" | "namespace-uri" => {
                arity(0, 1)?;
                let node = node_or_context(self)?;
                Str(node.map(|n| self.name_part(n, name)).unwrap_or_default())
            }
            "string" => {
                arity(0, 1)?;
                Str(string_or_context(self)?)
            }
            "concat" => {
                arity(2, usize::MAX)?;
                let mut out = String::new();
                for arg in args {
                    out.push_str(&self.string(arg, focus)?);
                }
                Str(out)
            }
            "starts-with" | "contains" | "substring-before" | "substring-after" => {
                arity(2, 2)?;
                let s = self.string(&args[0], focus)?;
                let t = self.string(&args[1], focus)?;
                match name {
                    "starts-with" => Boolean(s.starts_with(&t)),
                    "contains" => Boolean(s.contains(&t)),
                    "substring-before" => Str(s.find(&t).map(|i| s[..i].to_string()).unwrap_or_default()),
                    _ => Str(s
                        .find(&t)
                        .map(|i| s[i + t.len()..].to_string())
                        .unwrap_or_default()),
                }
            }
            "substring" => {
                arity(2, 3)?;
                let s = self.string(&args[0], focus)?;
                let start = xpath_round(self.number(&args[1], focus)?);
                let end = match args.get(2) {
                    Some(len) => start + xpath_round(self.number(len, focus)?),
                    None => f64::INFINITY,
                };
                Str(s
                    .chars()
                    .zip(1..)
                    .filter(|&(_, pos)| {
                        let pos = f64::from(pos);
                        pos >= start && pos < end
                    })
                    .map(|(c, _)| c)
                    .collect())
            }
            "string-length" => {
                arity(0, 1)?;
                Number(string_or_context(self)?.chars().count() as f64)
            }
            "normalize-space" => {
                arity(0, 1)?;
                Str(string_or_context(self)?
                    .split_ascii_whitespace()
                    .collect::<Vec<_>>()
                    .join(" "))
            }
            "translate" => {
                arity(3, 3)?;
                let s = self.string(&args[0], focus)?;
                let from: Vec<char> = self.string(&args[1], focus)?.chars().collect();
                let to: Vec<char> = self.string(&args[2], focus)?.chars().collect();
                Str(s
                    .chars()
                    .filter_map(|c| match from.iter().position(|&f| f == c) {
                        Some(i) => to.get(i).copied(),
                        None => Some(c),
                    })
                    .collect())
            }
            "boolean" => {
                arity(1, 1)?;
                Boolean(self.eval(&args[0], focus)?.to_boolean())
            }
            "not" => {
                arity(1, 1)?;
                Boolean(!self.eval(&args[0], focus)?.to_boolean())
            }
            "true" | "false" => {
                arity(0, 0)?;
                Boolean(name == "true")
            }
            "lang" => {
                arity(1, 1)?;
                let wanted = self.string(&args[0], focus)?.to_ascii_lowercase();
                let lang = self
                    .doc
                    .ancestors(focus.node.node_id())
                    .find_map(|n| self.doc.attribute(n, "xml:lang"))
                    .map(str::to_ascii_lowercase);
                Boolean(lang.is_some_and(|l| {
                    l == wanted || l.strip_prefix(wanted.as_str()).is_some_and(|r| r.starts_with('-'))
                }))
            }
            "number" => {
                arity(0, 1)?;
                match args.first() {
                    Some(arg) => Number(self.number(arg, focus)?),
                    None => Number(parse_xpath_number(&self.string_value(focus.node))),
                }
            }
            "sum" => {
                arity(1, 1)?;
                let nodes = self.select(&args[0], focus)?;
                Number(
                    nodes
                        .iter()
                        .map(|&n| parse_xpath_number(&self.string_value(n)))
                        .sum(),
                )
            }
            "floor" | "ceiling" | "round" => {
                arity(1, 1)?;
                let n = self.number(&args[0], focus)?;
                Number(match name {
                    "floor" => n.floor(),
                    "ceiling" => n.ceil(),
                    _ => xpath_round(n),
                })
            }
            _ => return Err(XPathError::UndefinedFunction(name.to_string())),
        };
        Ok(value)
    }

    /// `name()`, `local-name()` or `namespace-uri()` of a node.
    fn name_part(&self, node: XNode, which: &str) -> String {
        let doc = self.doc;
        match node {
            XNode::Attribute(owner, index) => {
                let Some(attr) = doc.attributes(owner).get(index) else {
                    return String::new();
                };
                match which {
                    "name" => attr.qualified_name(),
                    "local-name" => attr.name.clone(),
                    _ => attr.namespace.clone().unwrap_or_default(),
                }
            }
            XNode::Node(id) => match (&doc.node(id).kind, which) {
                (NodeKind::Element { .. }, "name") => doc.qualified_name(id).unwrap_or_default(),
                (NodeKind::Element { name, .. }, "local-name") => name.clone(),
                (NodeKind::Element { namespace, .. }, "namespace-uri") => {
                    namespace.clone().unwrap_or_default()
                }
                (NodeKind::ProcessingInstruction { target, .. }, "name" | "local-name") => {
                    target.clone()
                }
                _ => String::new(),
            },
        }
    }
}

fn siblings(start: NodeId, next: impl Fn(NodeId) -> Option<NodeId>) -> Vec<NodeId> {
    std::iter::successors(next(start), |&n| next(n)).collect()
}

/// Compares two values, neither of them a node-set.
#[allow(clippy::float_cmp)]
fn compare_scalars(op: BinaryOp, a: &XPathValue, b: &XPathValue) -> bool {
    use XPathValue::{Boolean, Number};
    match op {
        BinaryOp::Eq | BinaryOp::Neq => {
            let equal = if matches!(a, Boolean(_)) || matches!(b, Boolean(_)) {
                a.to_boolean() == b.to_boolean()
            } else if matches!(a, Number(_)) || matches!(b, Number(_)) {
                a.to_number() == b.to_number()
            } else {
                a.to_xpath_string() == b.to_xpath_string()
            };
            equal == (op == BinaryOp::Eq)
        }
        _ => {
            let (x, y) = (a.to_number(), b.to_number());
            match op {
                BinaryOp::Lt => x < y,
                BinaryOp::Lte => x <= y,
                BinaryOp::Gt => x > y,
                _ => x >= y,
            }
        }
    }
}

/// `round()`: halves go towards positive infinity.
fn xpath_round(n: f64) -> f64 {
    if n.is_finite() {
        (n + 0.5).floor()
    } else {
        n
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::xpath::parse;
    use pretty_assertions::assert_eq;

    const WINGS: &str = r#"<cpacs><wings><wing uID="w1" sym="x-z"><section/><section/></wing><wing uID="w2"><section/></wing></wings><!--end--></cpacs>"#;

    fn eval(xml: &str, expr: &str) -> XPathValue {
        let doc = Document::parse_str(xml).unwrap();
        XPathContext::new(&doc, doc.root())
            .evaluate(&parse(expr).unwrap())
            .unwrap()
    }

    fn paths(xml: &str, expr: &str) -> Vec<String> {
        let doc = Document::parse_str(xml).unwrap();
        let value = XPathContext::new(&doc, doc.root())
            .evaluate(&parse(expr).unwrap())
            .unwrap();
        value
            .into_node_set()
            .unwrap()
            .into_iter()
            .map(|n| match n {
                XNode::Node(id) => doc.node_path(id),
                XNode::Attribute(id, i) => doc.attribute_path(id, i),
            })
            .collect()
    }

    #[test]
    fn test_arithmetic_and_logic() {
        assert_eq!(eval("<a/>", "1 + 2 * 3"), XPathValue::Number(7.0));
        assert_eq!(eval("<a/>", "7 mod 3 - 10 div 4"), XPathValue::Number(-1.5));
        assert_eq!(eval("<a/>", "-(2)"), XPathValue::Number(-2.0));
        assert_eq!(eval("<a/>", "1 < 2 and not(2 <= 1)"), XPathValue::Boolean(true));
        assert_eq!(eval("<a/>", "false() or 'x' = 'x'"), XPathValue::Boolean(true));
    }

    #[test]
    fn test_positional_predicates_are_per_parent() {
        assert_eq!(
            paths(WINGS, "//section[1]"),
            vec![
                "/cpacs/wings/wing[1]/section[1]",
                "/cpacs/wings/wing[2]/section"
            ]
        );
        assert_eq!(
            paths(WINGS, "(//section)[last()]"),
            vec!["/cpacs/wings/wing[2]/section"]
        );
    }

    #[test]
    fn test_attribute_nodes() {
        assert_eq!(
            paths(WINGS, "//@uID"),
            vec!["/cpacs/wings/wing[1]/@uID", "/cpacs/wings/wing[2]/@uID"]
        );
        assert_eq!(eval(WINGS, "count(//@*)"), XPathValue::Number(3.0));
        assert_eq!(eval(WINGS, "string(//wing[2]/@uID)"), XPathValue::String("w2".into()));
        assert_eq!(
            paths(WINGS, "//@uID[. = 'w2']/.."),
            vec!["/cpacs/wings/wing[2]"]
        );
        assert_eq!(paths(WINGS, "//wing[@sym]"), vec!["/cpacs/wings/wing[1]"]);
    }

    #[test]
    fn test_reverse_axis_positions() {
        assert_eq!(
            paths(WINGS, "//wing[2]/preceding-sibling::*[1]"),
            vec!["/cpacs/wings/wing[1]"]
        );
        assert_eq!(
            paths(WINGS, "//wing[2]/section/ancestor::*[2]"),
            vec!["/cpacs/wings"]
        );
        assert_eq!(paths(WINGS, "//wings/following::comment()"), vec!["/cpacs/comment()"]);
        assert_eq!(
            paths(WINGS, "//comment()/preceding::wing"),
            vec!["/cpacs/wings/wing[1]", "/cpacs/wings/wing[2]"]
        );
    }

    #[test]
    fn test_union_is_sorted_and_unique() {
        assert_eq!(
            paths(WINGS, "//wing[2] | //wings | //wing[2]"),
            vec!["/cpacs/wings", "/cpacs/wings/wing[2]"]
        );
    }

    #[test]
    fn test_namespace_aware_name_tests() {
        let xml = r#"<r xmlns:c="urn:c"><c:a/><a/><x xmlns="urn:d"><a/></x></r>"#;
        let doc = Document::parse_str(xml).unwrap();
        let mut ns = HashMap::new();
        ns.insert("p".to_string(), "urn:c".to_string());
        ns.insert("d".to_string(), "urn:d".to_string());
        let ctx = XPathContext::new(&doc, doc.root()).with_namespaces(&ns);
        let count = |e: &str| ctx.evaluate(&parse(e).unwrap()).unwrap();
        assert_eq!(count("count(//a)"), XPathValue::Number(1.0));
        assert_eq!(count("count(//p:a)"), XPathValue::Number(1.0));
        assert_eq!(count("count(//d:*)"), XPathValue::Number(2.0));
        assert_eq!(
            ctx.evaluate(&parse("//q:a").unwrap()),
            Err(XPathError::UnknownPrefix("q".into()))
        );
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(
            eval("<a/>", "concat(substring('12345', 1.5, 2.6), '|', substring-after('a=b', '='))"),
            XPathValue::String("234|b".into())
        );
        assert_eq!(
            eval("<a/>", "normalize-space('  x \n y ')"),
            XPathValue::String("x y".into())
        );
        assert_eq!(
            eval("<a/>", "translate('bar', 'abc', 'AB')"),
            XPathValue::String("BAr".into())
        );
        assert_eq!(eval("<a/>", "string-length('héllo')"), XPathValue::Number(5.0));
        assert_eq!(eval("<a/>", "string(1 div 0)"), XPathValue::String("Infinity".into()));
    }

    #[test]
    fn test_node_functions() {
        let xml = r#"<c:r xmlns:c="urn:c" xml:lang="en-GB"><v>1</v><v>2.5</v></c:r>"#;
        assert_eq!(eval(xml, "name(/*)"), XPathValue::String("c:r".into()));
        assert_eq!(eval(xml, "local-name(/*)"), XPathValue::String("r".into()));
        assert_eq!(eval(xml, "namespace-uri(/*)"), XPathValue::String("urn:c".into()));
        assert_eq!(eval(xml, "sum(//v)"), XPathValue::Number(3.5));
        assert_eq!(eval(xml, "round(2.5) + floor(-1.5) + ceiling(0.2)"), XPathValue::Number(2.0));
        assert_eq!(eval(xml, "boolean(//v[lang('en')])"), XPathValue::Boolean(true));
    }

    #[test]
    fn test_node_set_comparisons() {
        assert_eq!(eval("<a><v>1</v><v>3</v></a>", "//v = 3"), XPathValue::Boolean(true));
        assert_eq!(eval("<a><v>1</v><v>3</v></a>", "//v > 2"), XPathValue::Boolean(true));
        assert_eq!(eval("<a><v>1</v><v>3</v></a>", "//v != 1"), XPathValue::Boolean(true));
        assert_eq!(eval("<a/>", "//missing = false()"), XPathValue::Boolean(true));
    }

    #[test]
    fn test_variables_and_errors() {
        let doc = Document::parse_str("<a/>").unwrap();
        let mut ctx = XPathContext::new(&doc, doc.root());
        ctx.set_variable("n", XPathValue::Number(2.0));
        assert_eq!(ctx.evaluate(&parse("$n * 2").unwrap()).unwrap(), XPathValue::Number(4.0));
        assert_eq!(
            ctx.evaluate(&parse("$m").unwrap()),
            Err(XPathError::UndefinedVariable("m".into()))
        );
        assert_eq!(
            ctx.evaluate(&parse("nope()").unwrap()),
            Err(XPathError::UndefinedFunction("nope".into()))
        );
        assert!(matches!(
            ctx.evaluate(&parse("count(1)").unwrap()),
            Err(XPathError::TypeError { .. })
        ));
        assert!(matches!(
            ctx.evaluate(&parse("concat('a')").unwrap()),
            Err(XPathError::InvalidArgCount { .. })
        ));
    }
}
