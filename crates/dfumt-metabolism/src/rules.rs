//! Transform rules and the priority-ordered rule registry

use std::fmt;
use std::sync::Arc;

use dfumt_common::{FormulaNode, MetabolismError, NodeKind, PHI};

use crate::evaluator::evaluate_closed;

/// How far a constant may sit from φ and still count as φ
const GOLDEN_TOLERANCE: f64 = 1e-9;

/// Rule predicate
pub type Pattern = Arc<dyn Fn(&FormulaNode) -> bool + Send + Sync>;
/// Rule rewrite
pub type Transform = Arc<dyn Fn(&FormulaNode) -> FormulaNode + Send + Sync>;

/// A named rewrite with a priority
#[derive(Clone)]
pub struct TransformRule {
    pub name: String,
    pub priority: i32,
    /// Whether the rewrite has a meaningful inverse (metadata only)
    pub reversible: bool,
    pattern: Pattern,
    transform: Transform,
}

impl TransformRule {
    pub fn new(
        name: impl Into<String>,
        priority: i32,
        reversible: bool,
        pattern: impl Fn(&FormulaNode) -> bool + Send + Sync + 'static,
        transform: impl Fn(&FormulaNode) -> FormulaNode + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            reversible,
            pattern: Arc::new(pattern),
            transform: Arc::new(transform),
        }
    }

    #[inline]
    pub fn matches(&self, node: &FormulaNode) -> bool {
        (self.pattern)(node)
    }

    #[inline]
    pub fn apply(&self, node: &FormulaNode) -> FormulaNode {
        (self.transform)(node)
    }
}

impl fmt::Debug for TransformRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRule")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("reversible", &self.reversible)
            .finish()
    }
}

/// Rules ordered by descending priority; equal priorities keep insertion order
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<TransformRule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the default rule set
    pub fn with_defaults(precision: f64) -> Self {
        let mut registry = Self::new();
        for rule in default_rules(precision) {
            registry.register(rule);
        }
        registry
    }

    /// Insert after every rule of greater or equal priority
    pub fn register(&mut self, rule: TransformRule) {
        let position = self
            .rules
            .iter()
            .position(|r| r.priority < rule.priority)
            .unwrap_or(self.rules.len());
        self.rules.insert(position, rule);
    }

    pub fn unregister(&mut self, name: &str) -> Result<TransformRule, MetabolismError> {
        let index = self
            .rules
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| MetabolismError::RuleNotFound(name.to_string()))?;
        Ok(self.rules.remove(index))
    }

    pub fn rules(&self) -> &[TransformRule] {
        &self.rules
    }

    /// First rule (in priority order) whose pattern matches `node`
    pub fn first_match(&self, node: &FormulaNode) -> Option<&TransformRule> {
        self.rules.iter().find(|r| r.matches(node))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn both_constants(node: &FormulaNode) -> Option<(f64, f64)> {
    match node.children() {
        [a, b] if a.kind() == NodeKind::Constant && b.kind() == NodeKind::Constant => {
            Some((a.value()?, b.value()?))
        }
        _ => None,
    }
}

/// The other operand when one side of a binary node is the constant `identity`
fn strip_identity(node: &FormulaNode, identity: f64, precision: f64) -> Option<FormulaNode> {
    match node.children() {
        [a, b] if a.is_constant_near(identity, precision) => Some(b.clone()),
        [a, b] if b.is_constant_near(identity, precision) => Some(a.clone()),
        _ => None,
    }
}

fn is_golden_square(node: &FormulaNode, precision: f64) -> bool {
    node.is_operator("^")
        && matches!(node.children(), [base, exponent]
            if base.is_constant_near(PHI, GOLDEN_TOLERANCE)
                && exponent.is_constant_near(2.0, precision))
}

/// Default rules, highest priority first:
/// constant folding, identity elimination, dual cancellation, `φ² → φ + 1`
pub fn default_rules(precision: f64) -> Vec<TransformRule> {
    vec![
        TransformRule::new(
            "constant-fold-add",
            100,
            false,
            |n| n.is_operator("+") && both_constants(n).is_some(),
            |n| match both_constants(n) {
                Some((a, b)) => FormulaNode::constant(a + b),
                None => n.clone(),
            },
        ),
        TransformRule::new(
            "constant-fold-mul",
            100,
            false,
            |n| n.is_operator("*") && both_constants(n).is_some(),
            |n| match both_constants(n) {
                Some((a, b)) => FormulaNode::constant(a * b),
                None => n.clone(),
            },
        ),
        TransformRule::new(
            "identity-add-zero",
            90,
            true,
            move |n| n.is_operator("+") && strip_identity(n, 0.0, precision).is_some(),
            move |n| strip_identity(n, 0.0, precision).unwrap_or_else(|| n.clone()),
        ),
        TransformRule::new(
            "identity-mul-one",
            90,
            true,
            move |n| n.is_operator("*") && strip_identity(n, 1.0, precision).is_some(),
            move |n| strip_identity(n, 1.0, precision).unwrap_or_else(|| n.clone()),
        ),
        TransformRule::new(
            "dual-cancel",
            80,
            false,
            move |n| {
                n.kind() == NodeKind::Dual
                    && match n.children() {
                        [p, q] => match (evaluate_closed(p), evaluate_closed(q)) {
                            (Some(a), Some(b)) => (a + b).abs() < precision,
                            _ => false,
                        },
                        _ => false,
                    }
            },
            |_| FormulaNode::constant(0.0),
        ),
        TransformRule::new(
            "golden-square",
            70,
            true,
            move |n| is_golden_square(n, precision),
            |_| {
                FormulaNode::binary(
                    "+",
                    FormulaNode::labeled_constant(PHI, "φ"),
                    FormulaNode::constant(1.0),
                )
            },
        ),
    ]
}
