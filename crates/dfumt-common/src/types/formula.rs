//! FormulaNode - immutable formula tree
//!
//! Trees are assembled bottom-up through the typed constructors below, which
//! fix the arity of every node kind:
//! - constants and variables are leaves
//! - operators take one or two operands
//! - functions take exactly one argument
//! - dual nodes pair exactly two formulas
//!
//! Nodes are never mutated after construction; rewriting builds new nodes.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Node type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Constant,
    Variable,
    Operator,
    Function,
    Dual,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Constant => "constant",
            NodeKind::Variable => "variable",
            NodeKind::Operator => "operator",
            NodeKind::Function => "function",
            NodeKind::Dual => "dual",
        };
        f.write_str(name)
    }
}

/// Companion values carried by a dual node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DualPair {
    pub positive: f64,
    pub negative: f64,
}

impl DualPair {
    pub fn new(positive: f64, negative: f64) -> Self {
        Self { positive, negative }
    }

    /// Symmetric pair `(+|v|, -|v|)`
    pub fn symmetric(value: f64) -> Self {
        Self {
            positive: value.abs(),
            negative: -value.abs(),
        }
    }
}

/// A node of a formula tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaNode {
    id: String,
    kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<FormulaNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dual: Option<DualPair>,
}

fn next_id() -> String {
    Uuid::now_v7().to_string()
}

impl FormulaNode {
    fn build(
        kind: NodeKind,
        value: Option<f64>,
        symbol: Option<String>,
        children: Vec<FormulaNode>,
        dual: Option<DualPair>,
    ) -> Self {
        Self {
            id: next_id(),
            kind,
            value,
            symbol,
            children,
            dual,
        }
    }

    /// Numeric constant
    pub fn constant(value: f64) -> Self {
        Self::build(NodeKind::Constant, Some(value), None, Vec::new(), None)
    }

    /// Numeric constant displayed under a symbolic label (e.g. `φ`)
    pub fn labeled_constant(value: f64, label: impl Into<String>) -> Self {
        Self::build(
            NodeKind::Constant,
            Some(value),
            Some(label.into()),
            Vec::new(),
            None,
        )
    }

    /// Named variable, resolved from the evaluation environment
    pub fn variable(name: impl Into<String>) -> Self {
        Self::build(NodeKind::Variable, None, Some(name.into()), Vec::new(), None)
    }

    /// Unary operator application
    pub fn unary(op: impl Into<String>, operand: FormulaNode) -> Self {
        Self::build(NodeKind::Operator, None, Some(op.into()), vec![operand], None)
    }

    /// Binary operator application
    pub fn binary(op: impl Into<String>, left: FormulaNode, right: FormulaNode) -> Self {
        Self::build(
            NodeKind::Operator,
            None,
            Some(op.into()),
            vec![left, right],
            None,
        )
    }

    /// Single-argument function application
    pub fn function(name: impl Into<String>, argument: FormulaNode) -> Self {
        Self::build(
            NodeKind::Function,
            None,
            Some(name.into()),
            vec![argument],
            None,
        )
    }

    /// Dual pair of two formulas with their companion values
    pub fn dual(positive: FormulaNode, negative: FormulaNode, pair: DualPair) -> Self {
        Self::build(
            NodeKind::Dual,
            None,
            Some("dual".to_string()),
            vec![positive, negative],
            Some(pair),
        )
    }

    /// Same node with a caller-chosen id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// New node of the same kind, symbol, value and dual pair over new children.
    ///
    /// The arity of `children` must match the original node's.
    pub fn rebuild(&self, children: Vec<FormulaNode>) -> Self {
        debug_assert_eq!(children.len(), self.children.len());
        Self::build(
            self.kind,
            self.value,
            self.symbol.clone(),
            children,
            self.dual,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn children(&self) -> &[FormulaNode] {
        &self.children
    }

    pub fn dual_pair(&self) -> Option<DualPair> {
        self.dual
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// True for a constant node holding exactly `value` (within `tolerance`)
    pub fn is_constant_near(&self, value: f64, tolerance: f64) -> bool {
        self.kind == NodeKind::Constant
            && self
                .value
                .map(|v| (v - value).abs() <= tolerance)
                .unwrap_or(false)
    }

    /// True for an operator node with the given symbol
    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == NodeKind::Operator && self.symbol.as_deref() == Some(op)
    }

    /// Structural node count
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Constant leaves in depth-first preorder
    pub fn constant_leaves(&self) -> Vec<&FormulaNode> {
        let mut out = Vec::new();
        self.collect_constants(&mut out);
        out
    }

    fn collect_constants<'a>(&'a self, out: &mut Vec<&'a FormulaNode>) {
        if self.kind == NodeKind::Constant {
            out.push(self);
        }
        for child in &self.children {
            child.collect_constants(out);
        }
    }
}

impl fmt::Display for FormulaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.symbol.as_deref().unwrap_or("?");
        match self.kind {
            NodeKind::Constant => match (&self.symbol, self.value) {
                (Some(label), _) => f.write_str(label),
                (None, Some(v)) => write!(f, "{}", v),
                (None, None) => f.write_str("NaN"),
            },
            NodeKind::Variable => f.write_str(symbol),
            NodeKind::Operator => match self.children.as_slice() {
                [operand] => write!(f, "({}{})", symbol, operand),
                [left, right] => write!(f, "({} {} {})", left, symbol, right),
                _ => write!(f, "{}()", symbol),
            },
            NodeKind::Function => match self.children.first() {
                Some(arg) => write!(f, "{}({})", symbol, arg),
                None => write!(f, "{}()", symbol),
            },
            NodeKind::Dual => match self.children.as_slice() {
                [pos, neg] => write!(f, "⟨{} | {}⟩", pos, neg),
                _ => f.write_str("⟨⟩"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_fix_arity() {
        let leaf = FormulaNode::constant(2.0);
        assert!(leaf.is_leaf());
        assert_eq!(FormulaNode::unary("-", leaf.clone()).children().len(), 1);
        assert_eq!(
            FormulaNode::binary("+", leaf.clone(), leaf.clone()).children().len(),
            2
        );
        let dual = FormulaNode::dual(leaf.clone(), leaf, DualPair::symmetric(2.0));
        assert_eq!(dual.kind(), NodeKind::Dual);
        assert_eq!(dual.children().len(), 2);
    }

    #[test]
    fn test_ids_unique() {
        let a = FormulaNode::constant(1.0);
        let b = FormulaNode::constant(1.0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_rebuild_gets_new_id() {
        let node = FormulaNode::binary("*", FormulaNode::constant(2.0), FormulaNode::variable("x"));
        let rebuilt = node.rebuild(vec![FormulaNode::constant(3.0), FormulaNode::variable("y")]);
        assert_ne!(node.id(), rebuilt.id());
        assert!(rebuilt.is_operator("*"));
    }

    #[test]
    fn test_display() {
        let node = FormulaNode::binary(
            "+",
            FormulaNode::labeled_constant(crate::PHI, "φ"),
            FormulaNode::function("sin", FormulaNode::variable("x")),
        );
        assert_eq!(node.to_string(), "(φ + sin(x))");
    }

    #[test]
    fn test_constant_leaves_preorder() {
        let node = FormulaNode::binary(
            "*",
            FormulaNode::constant(1.0),
            FormulaNode::binary("+", FormulaNode::variable("x"), FormulaNode::constant(2.0)),
        );
        let values: Vec<_> = node.constant_leaves().iter().filter_map(|c| c.value()).collect();
        assert_eq!(values, vec![1.0, 2.0]);
        assert_eq!(node.node_count(), 5);
    }

    #[test]
    fn test_serde_roundtrip_kind_tag() {
        let node = FormulaNode::variable("x");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["kind"], "variable");
    }
}
