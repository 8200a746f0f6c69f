//! Bottom-up rewriting and fixed-point reduction
//!
//! The default rule set is not known to be confluent, so `reduce` never
//! assumes termination: `max_steps` bounds every run.

use dfumt_common::FormulaNode;
use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use crate::evaluator::evaluate_closed;
use crate::synthesis::{analyze, SynthesisResult};
use crate::Metabolism;

/// Outcome of one rewrite pass
#[derive(Debug, Clone)]
pub struct Rewrite {
    pub node: FormulaNode,
    /// Names of the rules that fired, innermost first
    pub fired: Vec<String>,
}

impl Rewrite {
    #[inline]
    pub fn changed(&self) -> bool {
        !self.fired.is_empty()
    }
}

/// One iteration of the reduction loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReductionStep {
    pub step: usize,
    /// Outermost rule applied in this pass
    pub rule: String,
    /// Number of rule applications in this pass
    pub applications: usize,
    /// Absolute change of the evaluated value (undefined counts as 0)
    pub delta: f64,
}

/// Result of reducing a formula
#[derive(Debug, Clone, Serialize)]
pub struct ReductionResult {
    pub input: FormulaNode,
    pub output: FormulaNode,
    pub steps: Vec<ReductionStep>,
    /// No rule matches `output`
    pub converged: bool,
    pub analysis: SynthesisResult,
}

impl Metabolism {
    /// Rewrite children first, then try the rules at this node in priority
    /// order. The first matching rule is applied and the pass returns.
    pub fn apply_once(&self, node: &FormulaNode) -> Rewrite {
        let mut fired = Vec::new();

        let current = if node.is_leaf() {
            node.clone()
        } else {
            let mut children = Vec::with_capacity(node.children().len());
            for child in node.children() {
                let rewrite = self.apply_once(child);
                fired.extend(rewrite.fired);
                children.push(rewrite.node);
            }
            if fired.is_empty() {
                node.clone()
            } else {
                node.rebuild(children)
            }
        };

        if let Some(rule) = self.rules.first_match(&current) {
            trace!(rule = %rule.name, node = %current, "Rule fired");
            fired.push(rule.name.clone());
            return Rewrite {
                node: rule.apply(&current),
                fired,
            };
        }

        Rewrite {
            node: current,
            fired,
        }
    }

    /// Repeat [`Metabolism::apply_once`] until nothing fires or `max_steps`
    /// passes have run.
    #[instrument(skip(self, node), fields(formula = %node))]
    pub fn reduce(&self, node: &FormulaNode, max_steps: usize) -> ReductionResult {
        let mut current = node.clone();
        let mut steps = Vec::new();
        let mut converged = false;

        while steps.len() < max_steps {
            let before = evaluate_closed(&current).unwrap_or(0.0);
            let rewrite = self.apply_once(&current);
            if !rewrite.changed() {
                converged = true;
                break;
            }
            let after = evaluate_closed(&rewrite.node).unwrap_or(0.0);
            steps.push(ReductionStep {
                step: steps.len() + 1,
                rule: rewrite.fired.last().cloned().unwrap_or_default(),
                applications: rewrite.fired.len(),
                delta: (after - before).abs(),
            });
            current = rewrite.node;
        }

        if !converged {
            converged = !self.apply_once(&current).changed();
            if !converged {
                warn!(max_steps, "Reduction stopped at the step bound");
            }
        }

        debug!(steps = steps.len(), converged, output = %current, "Reduction finished");

        ReductionResult {
            input: node.clone(),
            analysis: analyze(&current, self.config.precision),
            output: current,
            steps,
            converged,
        }
    }

    /// Reduce with the configured step bound
    pub fn reduce_default(&self, node: &FormulaNode) -> ReductionResult {
        self.reduce(node, self.config.max_reduce_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::TransformRule;
    use crate::synthesis::SynthesisMode;
    use dfumt_common::PHI;
    use proptest::prelude::*;

    fn c(v: f64) -> FormulaNode {
        FormulaNode::constant(v)
    }

    #[test]
    fn test_fold_mul_single_step() {
        let metabolism = Metabolism::default();
        let product = metabolism.synthesize(&c(3.0), &c(4.0), SynthesisMode::Mul);
        let result = metabolism.reduce(&product.formula, 10);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].rule, "constant-fold-mul");
        assert_eq!(evaluate_closed(&result.output), Some(12.0));
        assert!(result.converged);
    }

    #[test]
    fn test_children_rewritten_before_parent() {
        let metabolism = Metabolism::default();
        // ((1 + 2) * x): the inner fold fires, then nothing matches the parent
        let node = FormulaNode::binary(
            "*",
            FormulaNode::binary("+", c(1.0), c(2.0)),
            FormulaNode::variable("x"),
        );
        let rewrite = metabolism.apply_once(&node);
        assert_eq!(rewrite.fired, vec!["constant-fold-add".to_string()]);
        assert_eq!(rewrite.node.to_string(), "(3 * x)");
    }

    #[test]
    fn test_nested_folds_in_one_pass() {
        let metabolism = Metabolism::default();
        // ((1 + 2) + (3 + 4)): both children fold, then the parent folds too
        let node = FormulaNode::binary(
            "+",
            FormulaNode::binary("+", c(1.0), c(2.0)),
            FormulaNode::binary("+", c(3.0), c(4.0)),
        );
        let result = metabolism.reduce(&node, 10);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].applications, 3);
        assert_eq!(result.output.value(), Some(10.0));
    }

    #[test]
    fn test_golden_square_then_fold() {
        let metabolism = Metabolism::default();
        let node = FormulaNode::binary("^", FormulaNode::labeled_constant(PHI, "φ"), c(2.0));
        let result = metabolism.reduce(&node, 10);
        let rules: Vec<_> = result.steps.iter().map(|s| s.rule.as_str()).collect();
        assert_eq!(rules, vec!["golden-square", "constant-fold-add"]);
        assert!((result.output.value().unwrap() - (PHI + 1.0)).abs() < 1e-12);
        assert!(result.steps.iter().all(|s| s.delta < 1e-9));
    }

    #[test]
    fn test_dual_cancel() {
        let metabolism = Metabolism::default();
        let dual = metabolism.synthesize(&c(2.5), &c(-2.5), SynthesisMode::Dual);
        let result = metabolism.reduce(&dual.formula, 10);
        assert_eq!(result.steps[0].rule, "dual-cancel");
        assert_eq!(result.output.value(), Some(0.0));
    }

    #[test]
    fn test_step_bound_stops_non_terminating_rules() {
        let mut metabolism = Metabolism::default();
        // every pass pads the variable again
        metabolism.rules_mut().register(TransformRule::new(
            "pad-variable",
            10,
            false,
            |n| n.kind() == dfumt_common::NodeKind::Variable,
            |n| FormulaNode::binary("+", n.clone(), FormulaNode::constant(0.0)),
        ));
        let result = metabolism.reduce(&FormulaNode::variable("x"), 5);
        assert_eq!(result.steps.len(), 5);
        assert!(!result.converged);
    }

    #[test]
    fn test_zero_steps() {
        let metabolism = Metabolism::default();
        let node = FormulaNode::binary("+", c(1.0), c(1.0));
        let result = metabolism.reduce(&node, 0);
        assert!(result.steps.is_empty());
        assert!(!result.converged);
        assert_eq!(result.output, node);
    }

    proptest! {
        #[test]
        fn prop_mul_folds_in_exactly_one_step(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let metabolism = Metabolism::default();
            let product = metabolism.synthesize(&c(a), &c(b), SynthesisMode::Mul);
            let result = metabolism.reduce(&product.formula, 100);
            prop_assert_eq!(result.steps.len(), 1);
            prop_assert_eq!(result.steps[0].rule.as_str(), "constant-fold-mul");
            prop_assert_eq!(evaluate_closed(&result.output), Some(a * b));
        }
    }
}
