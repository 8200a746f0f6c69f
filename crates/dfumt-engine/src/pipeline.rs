//! The Seed → Metabolism → Selection pipeline

use std::fmt::Write as _;

use dfumt_common::{constants, FormulaNode, Result, SeedError, PHI};
use dfumt_metabolism::{ReductionResult, SynthesisMode, SynthesisResult};
use dfumt_seed::ZeroExtension;
use dfumt_selection::{Candidate, EvolutionResult, FitnessCalculator};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::engine::FormulaEngine;

/// Per-run options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Extension depth for every input component
    pub depth: usize,
    /// How adjacent formulas are combined
    pub mode: SynthesisMode,
    pub generations: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            depth: 3,
            mode: SynthesisMode::Add,
            generations: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedPhase {
    pub extensions: Vec<ZeroExtension>,
    /// Input elevated to twice its dimension
    pub elevated: Vec<f64>,
    /// Input block-reduced to half its dimension (at least 1)
    pub reduced: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetabolismPhase {
    pub formulas: Vec<FormulaNode>,
    pub syntheses: Vec<SynthesisResult>,
    pub chain: SynthesisResult,
    pub reductions: Vec<ReductionResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub input: Vec<f64>,
    pub options: PipelineOptions,
    pub seed: SeedPhase,
    pub metabolism: MetabolismPhase,
    pub selection: EvolutionResult,
    pub summary: String,
}

/// Constant leaf for one input component; π, e and φ get their symbols
pub fn constant_leaf(value: f64) -> FormulaNode {
    match constants::recognize(value, constants::RECOGNITION_TOLERANCE) {
        Some(entry) => FormulaNode::labeled_constant(value, entry.symbol),
        None => FormulaNode::constant(value),
    }
}

impl FormulaEngine {
    /// Run all three phases over `vector`
    #[instrument(skip(self, vector), fields(len = vector.len()))]
    pub fn run(&mut self, vector: &[f64], options: PipelineOptions) -> Result<PipelineResult> {
        if vector.is_empty() {
            return Err(SeedError::EmptyVector { operation: "run" }.into());
        }

        let seed = self.seed_phase(vector, options.depth)?;
        let metabolism = self.metabolism_phase(vector, options.mode)?;
        let selection = self.selection_phase(&metabolism.syntheses, options.generations);
        let summary = summarize(vector, &options, &seed, &metabolism, &selection);

        info!(
            generations = selection.generations.len(),
            survivors = selection.final_population.len(),
            "Pipeline finished"
        );

        Ok(PipelineResult {
            input: vector.to_vec(),
            options,
            seed,
            metabolism,
            selection,
            summary,
        })
    }

    fn seed_phase(&mut self, vector: &[f64], depth: usize) -> Result<SeedPhase> {
        let extensions = vector
            .iter()
            .map(|v| self.seed.extend(*v, depth))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let elevated = self.seed.elevate(vector, vector.len() * 2)?;
        let reduced = self.seed.reduce(vector, (vector.len() / 2).max(1))?;
        Ok(SeedPhase {
            extensions,
            elevated,
            reduced,
        })
    }

    fn metabolism_phase(&self, vector: &[f64], mode: SynthesisMode) -> Result<MetabolismPhase> {
        let formulas: Vec<FormulaNode> = vector.iter().map(|v| constant_leaf(*v)).collect();

        let syntheses: Vec<SynthesisResult> = if formulas.len() < 2 {
            formulas.iter().map(|f| self.metabolism.analyze(f)).collect()
        } else {
            formulas
                .windows(2)
                .map(|pair| self.metabolism.synthesize(&pair[0], &pair[1], mode))
                .collect()
        };

        let chain = self.metabolism.chain(&formulas)?;

        let reductions = syntheses
            .iter()
            .map(|s| self.metabolism.reduce_default(&s.formula))
            .collect();

        Ok(MetabolismPhase {
            formulas,
            syntheses,
            chain,
            reductions,
        })
    }

    fn selection_phase(
        &mut self,
        syntheses: &[SynthesisResult],
        generations: usize,
    ) -> EvolutionResult {
        let initial: Vec<Candidate> = syntheses
            .iter()
            .enumerate()
            .map(|(index, synthesis)| {
                let fitness = FitnessCalculator::initial(synthesis);
                self.selection
                    .candidate(synthesis.clone(), fitness)
                    .with_metadata("source", "synthesis")
                    .with_metadata("index", index)
            })
            .collect();

        let metabolism = &self.metabolism;
        self.selection.evolve(initial, generations, |parent| {
            let scaled = constant_leaf(parent.value().unwrap_or(0.0) * PHI);
            let synthesis = metabolism.analyze(&scaled);
            let mut child = parent.clone().with_metadata("parent", parent.id);
            child.fitness = FitnessCalculator::initial(&synthesis);
            child.synthesis = synthesis;
            child
        })
    }
}

fn summarize(
    vector: &[f64],
    options: &PipelineOptions,
    seed: &SeedPhase,
    metabolism: &MetabolismPhase,
    selection: &EvolutionResult,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Seed: {} components extended to depth {}, elevated {} -> {}, reduced {} -> {}",
        seed.extensions.len(),
        options.depth,
        vector.len(),
        seed.elevated.len(),
        vector.len(),
        seed.reduced.len(),
    );

    let steps: usize = metabolism.reductions.iter().map(|r| r.steps.len()).sum();
    let _ = writeln!(
        out,
        "Metabolism: {} syntheses ({}), chain = {}, {} rewrite steps",
        metabolism.syntheses.len(),
        options.mode,
        metabolism.chain.formula,
        steps,
    );

    let _ = write!(
        out,
        "Selection: {} generations, {} survivors",
        selection.generations.len(),
        selection.final_population.len(),
    );
    if let Some(best) = &selection.best {
        let _ = write!(out, ", best {} (fitness {:.4})", best.formula(), best.fitness);
    }
    out
}
