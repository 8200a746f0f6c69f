//! Engine instance owning one Seed, Metabolism and Selection component

use dfumt_common::{FormulaNode, Result};
use dfumt_metabolism::Metabolism;
use dfumt_seed::SeedEngine;
use dfumt_selection::{
    check_dfumt_consistency, check_math_consistency, DfumtConsistency, MathConsistency,
    SelectionEngine,
};
use serde::Serialize;
use tracing::info;

use crate::config::EngineConfig;

/// Sizes of the state an engine accumulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub cache_entries: usize,
    pub history_len: usize,
    pub rule_count: usize,
    pub criteria_count: usize,
}

/// The formula engine.
///
/// Not shareable across threads without external locking; the action facade
/// wraps it in a mutex.
pub struct FormulaEngine {
    pub(crate) config: EngineConfig,
    pub(crate) seed: SeedEngine,
    pub(crate) metabolism: Metabolism,
    pub(crate) selection: SelectionEngine,
}

impl FormulaEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            seed: SeedEngine::new(config.seed_config()),
            metabolism: Metabolism::new(config.metabolism_config()),
            selection: SelectionEngine::new(config.selection_config())?,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn seed(&self) -> &SeedEngine {
        &self.seed
    }

    pub fn seed_mut(&mut self) -> &mut SeedEngine {
        &mut self.seed
    }

    pub fn metabolism(&self) -> &Metabolism {
        &self.metabolism
    }

    pub fn metabolism_mut(&mut self) -> &mut Metabolism {
        &mut self.metabolism
    }

    pub fn selection(&self) -> &SelectionEngine {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionEngine {
        &mut self.selection
    }

    /// Mean of the structural and axiom scores
    pub fn verify(&self, formula: &FormulaNode) -> f64 {
        dfumt_selection::verify(formula)
    }

    pub fn check_math_consistency(&self, formula: &FormulaNode) -> MathConsistency {
        check_math_consistency(formula)
    }

    pub fn check_dfumt_consistency(&self, formula: &FormulaNode) -> DfumtConsistency {
        check_dfumt_consistency(formula)
    }

    /// Clear the extension cache and the generation history
    pub fn reset(&mut self) {
        let stats = self.stats();
        self.seed.clear_cache();
        self.selection.clear_history();
        info!(
            cache_entries = stats.cache_entries,
            history_len = stats.history_len,
            "Engine reset"
        );
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            cache_entries: self.seed.cache_len(),
            history_len: self.selection.history().len(),
            rule_count: self.metabolism.rules().len(),
            criteria_count: self.selection.criteria().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_engine_is_empty() {
        let engine = FormulaEngine::new(EngineConfig::default()).unwrap();
        let stats = engine.stats();
        assert_eq!(stats.cache_entries, 0);
        assert_eq!(stats.history_len, 0);
        assert_eq!(stats.rule_count, 6);
        assert_eq!(stats.criteria_count, 4);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut engine = FormulaEngine::new(EngineConfig::default()).unwrap();
        engine.seed_mut().extend(1.0, 3).unwrap();
        let candidate = {
            let synthesis = engine.metabolism().analyze(&FormulaNode::constant(2.0));
            engine.selection_mut().candidate(synthesis, 0.5)
        };
        engine.selection_mut().select(vec![candidate]);
        assert_eq!(engine.stats().cache_entries, 1);
        assert_eq!(engine.stats().history_len, 1);

        engine.reset();
        assert_eq!(engine.stats().cache_entries, 0);
        assert_eq!(engine.stats().history_len, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.selection.population_limit = 0;
        assert!(FormulaEngine::new(config).is_err());
    }

    #[test]
    fn test_verify_division_by_zero() {
        let engine = FormulaEngine::new(EngineConfig::default()).unwrap();
        let formula =
            FormulaNode::binary("/", FormulaNode::constant(1.0), FormulaNode::constant(0.0));
        let math = engine.check_math_consistency(&formula);
        assert_eq!(math.score, 0.75);
        assert!(engine.verify(&formula) < 1.0);
    }
}
