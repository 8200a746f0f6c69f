//! # Metabolism
//!
//! Builds, evaluates, rewrites and combines formula trees.
//!
//! ## Pipeline
//!
//! ```text
//! synthesize(a, b, mode) ──▶ analyze ──▶ SynthesisResult
//!                                 │
//!        reduce(formula, n) ◀─────┘   (apply_once until fixed point or n passes)
//! ```
//!
//! Every operation that produces a tree returns it analyzed: depth,
//! complexity, dual balance and energy are recomputed each time.

pub mod evaluator;
pub mod rewrite;
pub mod rules;
pub mod synthesis;

use dfumt_common::{FormulaNode, MetabolismError, DEFAULT_MAX_REDUCE_STEPS, DEFAULT_PRECISION};
use tracing::debug;

pub use evaluator::{evaluate, evaluate_closed, Environment};
pub use rewrite::{ReductionResult, ReductionStep, Rewrite};
pub use rules::{RuleRegistry, TransformRule};
pub use synthesis::{analyze, SynthesisMode, SynthesisResult};

/// Metabolism configuration
#[derive(Debug, Clone)]
pub struct MetabolismConfig {
    /// Numeric precision ε
    pub precision: f64,
    /// Default bound for `reduce`
    pub max_reduce_steps: usize,
}

impl Default for MetabolismConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            max_reduce_steps: DEFAULT_MAX_REDUCE_STEPS,
        }
    }
}

/// Metabolism component instance
#[derive(Debug, Clone)]
pub struct Metabolism {
    config: MetabolismConfig,
    rules: RuleRegistry,
}

impl Metabolism {
    /// Metabolism with the default rule set
    pub fn new(config: MetabolismConfig) -> Self {
        let rules = RuleRegistry::with_defaults(config.precision);
        Self { config, rules }
    }

    /// Metabolism with a caller-supplied rule set
    pub fn with_rules(config: MetabolismConfig, rules: RuleRegistry) -> Self {
        Self { config, rules }
    }

    pub fn config(&self) -> &MetabolismConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleRegistry {
        &mut self.rules
    }

    pub fn evaluate(&self, node: &FormulaNode, env: &Environment) -> Option<f64> {
        evaluate(node, env)
    }

    pub fn analyze(&self, formula: &FormulaNode) -> SynthesisResult {
        analyze(formula, self.config.precision)
    }

    /// Combine two formulas
    pub fn synthesize(
        &self,
        a: &FormulaNode,
        b: &FormulaNode,
        mode: SynthesisMode,
    ) -> SynthesisResult {
        let formula = synthesis::combine(a, b, mode);
        debug!(%mode, formula = %formula, "Synthesized");
        self.analyze(&formula)
    }

    /// Left fold of `compose` over `formulas`
    pub fn chain(&self, formulas: &[FormulaNode]) -> Result<SynthesisResult, MetabolismError> {
        let (first, rest) = formulas.split_first().ok_or(MetabolismError::EmptyChain)?;
        let chained = rest.iter().fold(first.clone(), |acc, next| {
            synthesis::combine(&acc, next, SynthesisMode::Compose)
        });
        Ok(self.analyze(&chained))
    }

    /// Multiply by π
    pub fn pi_extend(&self, formula: &FormulaNode) -> SynthesisResult {
        self.analyze(&synthesis::pi_scaled(formula))
    }

    /// Multiply by φ once per turn
    pub fn phi_spiral(&self, formula: &FormulaNode, turns: usize) -> SynthesisResult {
        self.analyze(&synthesis::phi_scaled(formula, turns))
    }
}

impl Default for Metabolism {
    fn default() -> Self {
        Self::new(MetabolismConfig::default())
    }
}
