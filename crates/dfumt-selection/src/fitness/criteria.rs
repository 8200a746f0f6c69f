//! Weighted evaluation criteria

use std::fmt;
use std::sync::Arc;

use dfumt_common::SelectionError;
use serde::Serialize;

use crate::candidate::Candidate;
use crate::consistency;

/// Raw criterion score, clamped to [0, 1] before weighting
pub type Scorer = Arc<dyn Fn(&Candidate) -> f64 + Send + Sync>;

#[derive(Clone)]
pub struct EvaluationCriterion {
    pub name: String,
    /// Normalized share of the total score
    pub weight: f64,
    /// Raw score at or above which the criterion counts as passed
    pub threshold: f64,
    /// Weight as registered, before normalization
    requested: f64,
    scorer: Scorer,
}

impl EvaluationCriterion {
    pub fn new(
        name: impl Into<String>,
        weight: f64,
        threshold: f64,
        scorer: impl Fn(&Candidate) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            weight,
            threshold,
            requested: weight,
            scorer: Arc::new(scorer),
        }
    }

    /// Score in [0, 1]; NaN scores as 0
    pub fn score(&self, candidate: &Candidate) -> f64 {
        let raw = (self.scorer)(candidate);
        if raw.is_nan() {
            0.0
        } else {
            raw.clamp(0.0, 1.0)
        }
    }
}

impl fmt::Debug for EvaluationCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationCriterion")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Per-criterion part of an evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionScore {
    pub name: String,
    pub score: f64,
    pub weighted: f64,
    pub passed: bool,
}

/// Registered criteria; weights always sum to 1 when non-empty
#[derive(Debug, Clone, Default)]
pub struct CriteriaSet {
    criteria: Vec<EvaluationCriterion>,
}

impl CriteriaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a criterion and renormalize all weights.
    ///
    /// A criterion with an existing name replaces it.
    pub fn add(&mut self, criterion: EvaluationCriterion) -> Result<(), SelectionError> {
        if !(0.0..=1.0).contains(&criterion.requested) {
            return Err(SelectionError::InvalidWeight {
                weight: criterion.requested,
            });
        }
        self.criteria.retain(|c| c.name != criterion.name);
        self.criteria.push(criterion);
        self.normalize();
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<EvaluationCriterion, SelectionError> {
        let index = self
            .criteria
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| SelectionError::CriterionNotFound(name.to_string()))?;
        let removed = self.criteria.remove(index);
        self.normalize();
        Ok(removed)
    }

    /// Rescale the requested weights to sum to 1; equal weights when every
    /// requested weight is zero
    fn normalize(&mut self) {
        let total: f64 = self.criteria.iter().map(|c| c.requested).sum();
        let count = self.criteria.len() as f64;
        for criterion in &mut self.criteria {
            criterion.weight = if total > 0.0 {
                criterion.requested / total
            } else {
                1.0 / count
            };
        }
    }

    /// Weighted sum over all criteria plus the per-criterion breakdown
    pub fn score(&self, candidate: &Candidate) -> (f64, Vec<CriterionScore>) {
        let breakdown: Vec<CriterionScore> = self
            .criteria
            .iter()
            .map(|criterion| {
                let score = criterion.score(candidate);
                CriterionScore {
                    name: criterion.name.clone(),
                    score,
                    weighted: score * criterion.weight,
                    passed: score >= criterion.threshold,
                }
            })
            .collect();
        let total = breakdown.iter().map(|s| s.weighted).sum();
        (total, breakdown)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvaluationCriterion> {
        self.criteria.iter()
    }

    pub fn total_weight(&self) -> f64 {
        self.criteria.iter().map(|c| c.weight).sum()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

/// Energy, simplicity, balance and consistency, in that order
pub fn default_criteria() -> Vec<EvaluationCriterion> {
    vec![
        EvaluationCriterion::new("energy", 0.3, 0.5, |c| {
            let energy = c.synthesis.energy;
            energy / (1.0 + energy)
        }),
        EvaluationCriterion::new("simplicity", 0.2, 0.5, |c| {
            1.0 / (1.0 + c.synthesis.complexity as f64 / 10.0)
        }),
        EvaluationCriterion::new("balance", 0.2, 0.2, |c| {
            1.0 - c.synthesis.dual_balance.abs()
        }),
        EvaluationCriterion::new("consistency", 0.3, 0.75, |c| {
            consistency::verify(c.formula())
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfumt_common::FormulaNode;
    use dfumt_metabolism::analyze;
    use proptest::prelude::*;

    fn candidate(value: f64) -> Candidate {
        Candidate {
            id: 1,
            synthesis: analyze(&FormulaNode::constant(value), 1e-10),
            metadata: Default::default(),
            generation: 0,
            age: 0,
            fitness: 0.0,
        }
    }

    #[test]
    fn test_weights_renormalized_on_add_and_remove() {
        let mut set = CriteriaSet::new();
        set.add(EvaluationCriterion::new("a", 0.5, 0.0, |_| 1.0)).unwrap();
        assert!((set.total_weight() - 1.0).abs() < 1e-12);
        set.add(EvaluationCriterion::new("b", 1.0, 0.0, |_| 0.0)).unwrap();
        let weights: Vec<f64> = set.iter().map(|c| c.weight).collect();
        assert!((weights[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((weights[1] - 2.0 / 3.0).abs() < 1e-12);
        set.remove("a").unwrap();
        assert!((set.total_weight() - 1.0).abs() < 1e-12);
        assert_eq!(
            set.remove("a").unwrap_err(),
            SelectionError::CriterionNotFound("a".to_string())
        );
    }

    #[test]
    fn test_zero_weights_become_equal() {
        let mut set = CriteriaSet::new();
        set.add(EvaluationCriterion::new("a", 0.0, 0.0, |_| 1.0)).unwrap();
        set.add(EvaluationCriterion::new("b", 0.0, 0.0, |_| 0.0)).unwrap();
        assert!(set.iter().all(|c| (c.weight - 0.5).abs() < 1e-12));
    }

    #[test]
    fn test_invalid_weight_rejected() {
        let mut set = CriteriaSet::new();
        let err = set
            .add(EvaluationCriterion::new("a", 1.5, 0.0, |_| 1.0))
            .unwrap_err();
        assert_eq!(err, SelectionError::InvalidWeight { weight: 1.5 });
        assert!(set.is_empty());
    }

    #[test]
    fn test_scores_clamped() {
        let mut set = CriteriaSet::new();
        set.add(EvaluationCriterion::new("over", 1.0, 0.5, |_| 7.0)).unwrap();
        set.add(EvaluationCriterion::new("nan", 1.0, 0.5, |_| f64::NAN)).unwrap();
        let (total, breakdown) = set.score(&candidate(1.0));
        assert_eq!(breakdown[0].score, 1.0);
        assert!(breakdown[0].passed);
        assert_eq!(breakdown[1].score, 0.0);
        assert!(!breakdown[1].passed);
        assert!((total - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_default_criteria_on_clean_constant() {
        let mut set = CriteriaSet::new();
        for criterion in default_criteria() {
            set.add(criterion).unwrap();
        }
        let (total, breakdown) = set.score(&candidate(3.0));
        assert_eq!(breakdown.len(), 4);
        assert_eq!(breakdown[3].score, 1.0);
        assert!(total > 0.7);
    }

    proptest! {
        #[test]
        fn prop_weights_sum_to_one(weights in prop::collection::vec(0.0f64..=1.0, 1..12)) {
            let mut set = CriteriaSet::new();
            for (i, weight) in weights.iter().enumerate() {
                set.add(EvaluationCriterion::new(format!("c{}", i), *weight, 0.0, |_| 0.5))
                    .unwrap();
                prop_assert!((set.total_weight() - 1.0).abs() < 1e-9);
            }
        }
    }
}
