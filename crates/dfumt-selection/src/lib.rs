//! # Selection
//!
//! Multi-criteria, constraint-checked evolutionary selection over formula
//! candidates.
//!
//! ## Scoring
//!
//! ```text
//! total = max(0, Σ wᵢ · clamp(scoreᵢ) − Σ soft penalties)
//! ```
//!
//! Any failing hard constraint eliminates the candidate with total 0.
//!
//! ## Verdicts
//!
//! ```text
//! total ≥ 0.7   survive   (age + 1, fitness = total)
//! total ≥ 0.55  suspend   (age + 1, fitness kept)
//! total ≥ 0.4   mutate
//! otherwise     eliminate
//! ```
//!
//! Survivors beyond the population limit are cut by fitness.

pub mod candidate;
pub mod consistency;
pub mod constraints;
pub mod culling;
pub mod evolution;
pub mod fitness;

use dfumt_common::{DEFAULT_POPULATION_LIMIT, DEFAULT_PRECISION};

pub use candidate::Candidate;
pub use consistency::{
    check_dfumt_consistency, check_math_consistency, verify, ConsistencyIssue, DfumtConsistency,
    MathConsistency,
};
pub use constraints::{ConsistencyConstraint, Severity};
pub use culling::{Verdict, VerdictPolicy};
pub use evolution::{EvaluationResult, EvolutionResult, SelectionEngine, SelectionGeneration};
pub use fitness::{CriteriaSet, EvaluationCriterion, FitnessCalculator};

/// Selection configuration
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Maximum survivors per generation
    pub population_limit: usize,
    /// Numeric precision ε
    pub precision: f64,
    /// Complexity allowed by the default `complexity-limit` constraint
    pub complexity_limit: usize,
    /// Depth allowed by the default `depth-limit` constraint
    pub depth_limit: usize,
    /// Penalty of each default soft constraint
    pub soft_penalty: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            population_limit: DEFAULT_POPULATION_LIMIT,
            precision: DEFAULT_PRECISION,
            complexity_limit: 64,
            depth_limit: 16,
            soft_penalty: 0.1,
        }
    }
}
