//! Fitness: initial fitness, population statistics and weighted criteria

pub mod calculator;
pub mod criteria;

pub use calculator::FitnessCalculator;
pub use criteria::{default_criteria, CriteriaSet, CriterionScore, EvaluationCriterion};
