//! Formula evaluation
//!
//! `None` is the "undefined" result. It is produced by division by zero,
//! `log`/`sqrt` of a non-positive argument, unbound variables and unknown
//! symbols, and it propagates to every ancestor.

use std::collections::HashMap;

use dfumt_common::{FormulaNode, NodeKind, PHI};

/// Variable bindings
pub type Environment = HashMap<String, f64>;

/// Maximum of two values
pub const OP_MAX: &str = "⊕";
/// Minimum of two values
pub const OP_MIN: &str = "⊖";

/// Evaluate a tree under `env`.
///
/// A dual node evaluates to the sum of its two children, which is not the
/// same as `⊕` (max) or `⊖` (min).
pub fn evaluate(node: &FormulaNode, env: &Environment) -> Option<f64> {
    let value = match node.kind() {
        NodeKind::Constant => node.value(),
        NodeKind::Variable => node.symbol().and_then(|name| env.get(name)).copied(),
        NodeKind::Operator => {
            let args = node
                .children()
                .iter()
                .map(|c| evaluate(c, env))
                .collect::<Option<Vec<f64>>>()?;
            apply_operator(node.symbol()?, &args)
        }
        NodeKind::Function => {
            let arg = evaluate(node.children().first()?, env)?;
            apply_function(node.symbol()?, arg)
        }
        NodeKind::Dual => match node.children() {
            [positive, negative] => Some(evaluate(positive, env)? + evaluate(negative, env)?),
            _ => None,
        },
    };
    value.filter(|v| !v.is_nan())
}

/// Evaluate without bindings
pub fn evaluate_closed(node: &FormulaNode) -> Option<f64> {
    evaluate(node, &Environment::new())
}

fn apply_operator(op: &str, args: &[f64]) -> Option<f64> {
    match (op, args) {
        ("+", [x]) => Some(*x),
        ("-", [x]) => Some(-x),
        ("+", [a, b]) => Some(a + b),
        ("-", [a, b]) => Some(a - b),
        ("*", [a, b]) => Some(a * b),
        ("/", [_, b]) if *b == 0.0 => None,
        ("/", [a, b]) => Some(a / b),
        ("^", [a, b]) => Some(a.powf(*b)),
        (OP_MAX, [a, b]) => Some(a.max(*b)),
        (OP_MIN, [a, b]) => Some(a.min(*b)),
        _ => None,
    }
}

fn apply_function(name: &str, x: f64) -> Option<f64> {
    match name {
        "sin" => Some(x.sin()),
        "cos" => Some(x.cos()),
        "exp" => Some(x.exp()),
        "log" if x > 0.0 => Some(x.ln()),
        "sqrt" if x > 0.0 => Some(x.sqrt()),
        "pi_scale" => Some(x * std::f64::consts::PI),
        "phi_scale" => Some(x * PHI),
        "e_scale" => Some(x * std::f64::consts::E),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(v: f64) -> FormulaNode {
        FormulaNode::constant(v)
    }

    #[test]
    fn test_arithmetic() {
        let node = FormulaNode::binary("-", FormulaNode::binary("^", c(2.0), c(3.0)), c(1.5));
        assert_eq!(evaluate_closed(&node), Some(6.5));
        assert_eq!(evaluate_closed(&FormulaNode::unary("-", c(4.0))), Some(-4.0));
    }

    #[test]
    fn test_division_by_zero_is_undefined() {
        let node = FormulaNode::binary("/", c(1.0), c(0.0));
        assert_eq!(evaluate_closed(&node), None);
        // propagates through parents
        let parent = FormulaNode::binary("+", node, c(1.0));
        assert_eq!(evaluate_closed(&parent), None);
    }

    #[test]
    fn test_variables() {
        let node = FormulaNode::binary("*", FormulaNode::variable("x"), c(3.0));
        assert_eq!(evaluate_closed(&node), None);
        let env: Environment = [("x".to_string(), 2.0)].into_iter().collect();
        assert_eq!(evaluate(&node, &env), Some(6.0));
    }

    #[test]
    fn test_max_min_versus_dual_sum() {
        let max = FormulaNode::binary(OP_MAX, c(2.0), c(-3.0));
        let min = FormulaNode::binary(OP_MIN, c(2.0), c(-3.0));
        let dual = FormulaNode::dual(c(2.0), c(-3.0), dfumt_common::DualPair::new(2.0, -3.0));
        assert_eq!(evaluate_closed(&max), Some(2.0));
        assert_eq!(evaluate_closed(&min), Some(-3.0));
        assert_eq!(evaluate_closed(&dual), Some(-1.0));
    }

    #[test]
    fn test_guarded_functions() {
        assert_eq!(evaluate_closed(&FormulaNode::function("log", c(0.0))), None);
        assert_eq!(evaluate_closed(&FormulaNode::function("sqrt", c(-4.0))), None);
        assert_eq!(evaluate_closed(&FormulaNode::function("sqrt", c(4.0))), Some(2.0));
        assert_eq!(evaluate_closed(&FormulaNode::function("exp", c(0.0))), Some(1.0));
        assert_eq!(evaluate_closed(&FormulaNode::function("tan", c(1.0))), None);
    }

    #[test]
    fn test_scaling_functions() {
        let phi = evaluate_closed(&FormulaNode::function("phi_scale", c(2.0))).unwrap();
        assert!((phi - 2.0 * PHI).abs() < 1e-12);
        let pi = evaluate_closed(&FormulaNode::function("pi_scale", c(1.0))).unwrap();
        assert_eq!(pi, std::f64::consts::PI);
        let e = evaluate_closed(&FormulaNode::function("e_scale", c(1.0))).unwrap();
        assert_eq!(e, std::f64::consts::E);
    }

    #[test]
    fn test_nan_is_undefined() {
        let node = FormulaNode::binary("^", c(-8.0), c(0.5));
        assert_eq!(evaluate_closed(&node), None);
    }
}
