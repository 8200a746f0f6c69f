//! Structural and axiom consistency checks
//!
//! Both checks are pure functions of a formula tree.

use std::collections::HashSet;
use std::fmt;

use dfumt_common::{FormulaNode, NodeKind, PHI};
use dfumt_metabolism::{evaluate, evaluate_closed, Environment};
use serde::Serialize;

/// Score lost per detected issue
const ISSUE_PENALTY: f64 = 0.25;

/// Constant leaves of mixed sign whose net sum exceeds this share of their
/// total magnitude count as imbalanced
pub const SIGN_IMBALANCE_THRESHOLD: f64 = 0.9;

/// Number of axioms in [`DfumtConsistency`]
pub const AXIOM_COUNT: usize = 5;

/// A structural problem found in a formula
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyIssue {
    /// A node id repeats along one root-to-leaf path
    Cycle { node_id: String },
    /// `/` whose divisor is the constant 0
    DivisionByZero { node_id: String },
    NonFiniteConstant { node_id: String },
    SignImbalance { ratio: f64 },
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle { node_id } => write!(f, "cycle through node {}", node_id),
            Self::DivisionByZero { node_id } => write!(f, "division by zero at node {}", node_id),
            Self::NonFiniteConstant { node_id } => {
                write!(f, "non-finite constant at node {}", node_id)
            }
            Self::SignImbalance { ratio } => write!(f, "sign imbalance {:.3}", ratio),
        }
    }
}

/// Result of [`check_math_consistency`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MathConsistency {
    pub issues: Vec<ConsistencyIssue>,
    /// `1 - 0.25 · issues`, floored at 0
    pub score: f64,
}

impl MathConsistency {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Result of [`check_dfumt_consistency`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DfumtConsistency {
    /// Binding every variable to 0 yields a finite value
    pub zero_invariance: bool,
    /// Every dual pair keeps its positive side ≥ 0 ≥ its negative side
    pub duality: bool,
    /// `|value| ≤ φ^12`
    pub golden_magnitude: bool,
    /// Largest over smallest non-zero constant magnitude is at most π^4
    pub constant_ratio: bool,
    /// Closed value and every constant are finite
    pub finiteness: bool,
    /// Share of axioms that hold
    pub overall_score: f64,
}

/// Scan for path-local cycles, zero divisors, non-finite constants and sign
/// imbalance.
///
/// The cycle search carries the set of ids seen on the current path only, so
/// a node shared by two sibling branches is not reported.
pub fn check_math_consistency(formula: &FormulaNode) -> MathConsistency {
    let mut issues = Vec::new();
    walk(formula, HashSet::new(), &mut issues);

    if let Some(ratio) = sign_imbalance(formula) {
        issues.push(ConsistencyIssue::SignImbalance { ratio });
    }

    let score = (1.0 - ISSUE_PENALTY * issues.len() as f64).max(0.0);
    MathConsistency { issues, score }
}

fn walk<'a>(node: &'a FormulaNode, mut path: HashSet<&'a str>, issues: &mut Vec<ConsistencyIssue>) {
    if !path.insert(node.id()) {
        issues.push(ConsistencyIssue::Cycle {
            node_id: node.id().to_string(),
        });
        return;
    }

    if node.is_operator("/") {
        if let Some(divisor) = node.children().get(1) {
            if divisor.is_constant_near(0.0, 0.0) {
                issues.push(ConsistencyIssue::DivisionByZero {
                    node_id: node.id().to_string(),
                });
            }
        }
    }

    if node.kind() == NodeKind::Constant && !node.value().map_or(false, f64::is_finite) {
        issues.push(ConsistencyIssue::NonFiniteConstant {
            node_id: node.id().to_string(),
        });
    }

    for child in node.children() {
        walk(child, path.clone(), issues);
    }
}

fn sign_imbalance(formula: &FormulaNode) -> Option<f64> {
    let values: Vec<f64> = formula
        .constant_leaves()
        .iter()
        .filter_map(|c| c.value())
        .filter(|v| v.is_finite())
        .collect();

    let positive: f64 = values.iter().filter(|v| **v > 0.0).sum();
    let negative: f64 = values.iter().filter(|v| **v < 0.0).map(|v| v.abs()).sum();
    if positive == 0.0 || negative == 0.0 {
        return None;
    }

    let ratio = (positive - negative).abs() / (positive + negative);
    (ratio > SIGN_IMBALANCE_THRESHOLD).then_some(ratio)
}

/// Evaluate the five domain axioms
pub fn check_dfumt_consistency(formula: &FormulaNode) -> DfumtConsistency {
    let value = evaluate_closed(formula);
    let constants: Vec<f64> = formula
        .constant_leaves()
        .iter()
        .map(|c| c.value().unwrap_or(f64::NAN))
        .collect();

    let zero_invariance = evaluate(formula, &zero_environment(formula)).is_some_and(f64::is_finite);
    let duality = duals_hold(formula);
    let golden_magnitude = value.unwrap_or(0.0).abs() <= PHI.powi(12);
    let constant_ratio = constant_ratio_holds(&constants);
    let finiteness =
        value.is_some_and(f64::is_finite) && constants.iter().all(|c| c.is_finite());

    let holding = [zero_invariance, duality, golden_magnitude, constant_ratio, finiteness]
        .iter()
        .filter(|ok| **ok)
        .count();

    DfumtConsistency {
        zero_invariance,
        duality,
        golden_magnitude,
        constant_ratio,
        finiteness,
        overall_score: holding as f64 / AXIOM_COUNT as f64,
    }
}

fn zero_environment(formula: &FormulaNode) -> Environment {
    fn collect(node: &FormulaNode, env: &mut Environment) {
        if node.kind() == NodeKind::Variable {
            if let Some(name) = node.symbol() {
                env.insert(name.to_string(), 0.0);
            }
        }
        for child in node.children() {
            collect(child, env);
        }
    }

    let mut env = Environment::new();
    collect(formula, &mut env);
    env
}

fn duals_hold(node: &FormulaNode) -> bool {
    let here = match (node.kind(), node.dual_pair()) {
        (NodeKind::Dual, Some(pair)) => pair.positive >= 0.0 && pair.negative <= 0.0,
        (NodeKind::Dual, None) => false,
        _ => true,
    };
    here && node.children().iter().all(duals_hold)
}

fn constant_ratio_holds(constants: &[f64]) -> bool {
    let magnitudes: Vec<f64> = constants
        .iter()
        .filter(|c| c.is_finite() && **c != 0.0)
        .map(|c| c.abs())
        .collect();
    if magnitudes.len() < 2 {
        return true;
    }
    let max = magnitudes.iter().copied().fold(f64::MIN, f64::max);
    let min = magnitudes.iter().copied().fold(f64::MAX, f64::min);
    max / min <= std::f64::consts::PI.powi(4)
}

/// Mean of the structural score and the axiom score
pub fn verify(formula: &FormulaNode) -> f64 {
    (check_math_consistency(formula).score + check_dfumt_consistency(formula).overall_score) / 2.0
}
