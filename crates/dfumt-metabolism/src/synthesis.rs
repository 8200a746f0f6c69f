//! Formula synthesis and structural analysis

use std::fmt;
use std::str::FromStr;

use dfumt_common::{DualPair, FormulaNode, MetabolismError, NodeKind, PHI};
use serde::{Deserialize, Serialize};

use crate::evaluator::evaluate_closed;

/// How two formulas are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisMode {
    #[default]
    Add,
    Mul,
    Dual,
    Compose,
}

impl FromStr for SynthesisMode {
    type Err = MetabolismError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "mul" => Ok(Self::Mul),
            "dual" => Ok(Self::Dual),
            "compose" => Ok(Self::Compose),
            other => Err(MetabolismError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for SynthesisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Mul => "mul",
            Self::Dual => "dual",
            Self::Compose => "compose",
        };
        f.write_str(name)
    }
}

/// A formula together with its derived metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisResult {
    pub formula: FormulaNode,
    pub complexity: usize,
    pub depth: usize,
    /// In `[-1, 1]`
    pub dual_balance: f64,
    /// Non-negative
    pub energy: f64,
    /// Closed evaluation of `formula`; `None` when undefined
    pub value: Option<f64>,
}

/// Derive depth, complexity, dual balance and energy for `formula`.
///
/// An undefined value counts as 0.
pub fn analyze(formula: &FormulaNode, precision: f64) -> SynthesisResult {
    let value = evaluate_closed(formula);
    let v = value.unwrap_or(0.0);
    let complexity = complexity(formula);

    let ratio = if v.is_finite() {
        v / v.abs().max(precision)
    } else {
        v.signum()
    };

    SynthesisResult {
        formula: formula.clone(),
        complexity,
        depth: depth(formula),
        dual_balance: ratio.tanh(),
        energy: v.abs() * (1.0 + complexity as f64 / 10.0),
        value,
    }
}

/// Leaves have depth 0
pub fn depth(node: &FormulaNode) -> usize {
    node.children()
        .iter()
        .map(|c| depth(c) + 1)
        .max()
        .unwrap_or(0)
}

/// Node count with function nodes weighted double
pub fn complexity(node: &FormulaNode) -> usize {
    let own = if node.kind() == NodeKind::Function { 2 } else { 1 };
    own + node.children().iter().map(complexity).sum::<usize>()
}

/// Copy of `target` with its first variable (depth-first preorder) replaced
/// by `replacement`; `None` if `target` has no variable.
pub fn substitute_first_variable(
    target: &FormulaNode,
    replacement: &FormulaNode,
) -> Option<FormulaNode> {
    if target.kind() == NodeKind::Variable {
        return Some(replacement.clone());
    }
    for (i, child) in target.children().iter().enumerate() {
        if let Some(substituted) = substitute_first_variable(child, replacement) {
            let mut children = target.children().to_vec();
            children[i] = substituted;
            return Some(target.rebuild(children));
        }
    }
    None
}

/// Combine two formulas into one tree
pub fn combine(a: &FormulaNode, b: &FormulaNode, mode: SynthesisMode) -> FormulaNode {
    match mode {
        SynthesisMode::Add => FormulaNode::binary("+", a.clone(), b.clone()),
        SynthesisMode::Mul => FormulaNode::binary("*", a.clone(), b.clone()),
        SynthesisMode::Dual => {
            let pair = DualPair::new(
                evaluate_closed(a).unwrap_or(0.0),
                evaluate_closed(b).unwrap_or(0.0),
            );
            FormulaNode::dual(a.clone(), b.clone(), pair)
        }
        SynthesisMode::Compose => {
            substitute_first_variable(b, a).unwrap_or_else(|| b.clone())
        }
    }
}

/// `formula · π`
pub fn pi_scaled(formula: &FormulaNode) -> FormulaNode {
    FormulaNode::binary(
        "*",
        formula.clone(),
        FormulaNode::labeled_constant(std::f64::consts::PI, "π"),
    )
}

/// `formula · φ · φ · …` with one factor per turn
pub fn phi_scaled(formula: &FormulaNode, turns: usize) -> FormulaNode {
    (0..turns).fold(formula.clone(), |acc, _| {
        FormulaNode::binary("*", acc, FormulaNode::labeled_constant(PHI, "φ"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(v: f64) -> FormulaNode {
        FormulaNode::constant(v)
    }

    #[test]
    fn test_depth_and_complexity() {
        let leaf = c(1.0);
        assert_eq!(depth(&leaf), 0);
        assert_eq!(complexity(&leaf), 1);

        let node = FormulaNode::binary("+", FormulaNode::function("sin", c(1.0)), c(2.0));
        assert_eq!(depth(&node), 2);
        // + (1) + sin (2) + two leaves (2)
        assert_eq!(complexity(&node), 5);
    }

    #[test]
    fn test_analyze_metrics() {
        let node = FormulaNode::binary("+", c(2.0), c(3.0));
        let result = analyze(&node, 1e-10);
        assert_eq!(result.value, Some(5.0));
        assert_eq!(result.complexity, 3);
        assert!((result.energy - 5.0 * 1.3).abs() < 1e-12);
        assert!((result.dual_balance - 1f64.tanh()).abs() < 1e-12);
    }

    #[test]
    fn test_analyze_undefined_counts_as_zero() {
        let node = FormulaNode::binary("/", c(1.0), c(0.0));
        let result = analyze(&node, 1e-10);
        assert_eq!(result.value, None);
        assert_eq!(result.energy, 0.0);
        assert_eq!(result.dual_balance, 0.0);
    }

    #[test]
    fn test_compose_replaces_first_variable_only() {
        let b = FormulaNode::binary("+", FormulaNode::variable("x"), FormulaNode::variable("y"));
        let composed = combine(&c(3.0), &b, SynthesisMode::Compose);
        assert_eq!(composed.to_string(), "(3 + y)");
    }

    #[test]
    fn test_compose_preorder() {
        // preorder visits the left subtree (which holds `u`) before `v`
        let b = FormulaNode::binary(
            "*",
            FormulaNode::function("sin", FormulaNode::variable("u")),
            FormulaNode::variable("v"),
        );
        let composed = combine(&FormulaNode::variable("z"), &b, SynthesisMode::Compose);
        assert_eq!(composed.to_string(), "(sin(z) * v)");
    }

    #[test]
    fn test_compose_without_variable_keeps_target() {
        let b = c(7.0);
        let composed = combine(&c(3.0), &b, SynthesisMode::Compose);
        assert_eq!(composed, b);
    }

    #[test]
    fn test_dual_pair_values() {
        let dual = combine(&c(2.0), &c(-0.5), SynthesisMode::Dual);
        assert_eq!(dual.dual_pair(), Some(DualPair::new(2.0, -0.5)));
        assert_eq!(evaluate_closed(&dual), Some(1.5));
    }

    #[test]
    fn test_scaling_helpers() {
        let pi = pi_scaled(&c(2.0));
        assert!((evaluate_closed(&pi).unwrap() - 2.0 * std::f64::consts::PI).abs() < 1e-12);
        let spiral = phi_scaled(&c(1.0), 3);
        assert!((evaluate_closed(&spiral).unwrap() - PHI.powi(3)).abs() < 1e-12);
        let unscaled = c(1.0);
        assert_eq!(phi_scaled(&unscaled, 0), unscaled);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("MUL".parse::<SynthesisMode>().unwrap(), SynthesisMode::Mul);
        assert!("blend".parse::<SynthesisMode>().is_err());
    }
}
