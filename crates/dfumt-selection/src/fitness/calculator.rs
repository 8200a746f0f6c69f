//! Fitness calculation: η = energy / (1 + complexity)

use dfumt_metabolism::SynthesisResult;

use crate::candidate::Candidate;

pub struct FitnessCalculator;

impl FitnessCalculator {
    /// Starting fitness of a freshly synthesized formula
    pub fn initial(synthesis: &SynthesisResult) -> f64 {
        synthesis.energy / (1.0 + synthesis.complexity as f64)
    }

    /// Mean fitness, 0 for an empty population
    pub fn average(population: &[Candidate]) -> f64 {
        if population.is_empty() {
            return 0.0;
        }
        population.iter().map(|c| c.fitness).sum::<f64>() / population.len() as f64
    }

    /// Population coefficient of variation of fitness, clamped to [0, 1].
    ///
    /// 0 with fewer than two members or a mean within `precision` of zero.
    pub fn diversity_index(population: &[Candidate], precision: f64) -> f64 {
        if population.len() < 2 {
            return 0.0;
        }
        let mean = Self::average(population);
        if mean.abs() < precision {
            return 0.0;
        }
        let variance = population
            .iter()
            .map(|c| (c.fitness - mean).powi(2))
            .sum::<f64>()
            / population.len() as f64;
        (variance.sqrt() / mean.abs()).clamp(0.0, 1.0)
    }
}
