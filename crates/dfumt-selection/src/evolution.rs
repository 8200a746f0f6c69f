//! Generational selection and evolution

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dfumt_common::SelectionError;
use dfumt_metabolism::SynthesisResult;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::candidate::Candidate;
use crate::constraints::{default_constraints, ConsistencyConstraint};
use crate::culling::{Verdict, VerdictPolicy};
use crate::fitness::{
    default_criteria, CriteriaSet, CriterionScore, EvaluationCriterion, FitnessCalculator,
};
use crate::SelectionConfig;

/// Scoring of one candidate in one generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub candidate_id: u64,
    pub scores: Vec<CriterionScore>,
    /// Names of failing constraints, hard first
    pub violations: Vec<String>,
    pub penalty: f64,
    pub total_score: f64,
    pub verdict: Verdict,
}

/// One round of selection, never modified once recorded
#[derive(Debug, Clone, Serialize)]
pub struct SelectionGeneration {
    pub generation: usize,
    pub created_at: DateTime<Utc>,
    pub candidates: Vec<Candidate>,
    pub results: Vec<EvaluationResult>,
    pub survivors: Vec<Candidate>,
    pub eliminated: Vec<Candidate>,
    pub mutated: Vec<Candidate>,
    pub avg_fitness: f64,
    pub diversity_index: f64,
}

/// Outcome of [`SelectionEngine::evolve`]
#[derive(Debug, Clone, Serialize)]
pub struct EvolutionResult {
    pub generations: Vec<SelectionGeneration>,
    /// Survivors of the last round that ran
    pub final_population: Vec<Candidate>,
    pub best: Option<Candidate>,
}

/// Scores candidates and runs evolution; owns the generation history
#[derive(Debug, Clone)]
pub struct SelectionEngine {
    config: SelectionConfig,
    criteria: CriteriaSet,
    constraints: Vec<ConsistencyConstraint>,
    policy: VerdictPolicy,
    history: Vec<SelectionGeneration>,
    next_id: u64,
}

impl SelectionEngine {
    /// Engine with the default criteria and constraints
    pub fn new(config: SelectionConfig) -> Result<Self, SelectionError> {
        let mut engine = Self::empty(config)?;
        for criterion in default_criteria() {
            engine.criteria.add(criterion)?;
        }
        engine.constraints = default_constraints(
            engine.config.complexity_limit,
            engine.config.depth_limit,
            engine.config.soft_penalty,
        )?;
        Ok(engine)
    }

    /// Engine with no criteria and no constraints
    pub fn empty(config: SelectionConfig) -> Result<Self, SelectionError> {
        if config.population_limit == 0 {
            return Err(SelectionError::InvalidPopulationLimit);
        }
        Ok(Self {
            config,
            criteria: CriteriaSet::new(),
            constraints: Vec::new(),
            policy: VerdictPolicy::default(),
            history: Vec::new(),
            next_id: 1,
        })
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn add_criterion(&mut self, criterion: EvaluationCriterion) -> Result<(), SelectionError> {
        self.criteria.add(criterion)
    }

    pub fn remove_criterion(&mut self, name: &str) -> Result<EvaluationCriterion, SelectionError> {
        self.criteria.remove(name)
    }

    pub fn criteria(&self) -> &CriteriaSet {
        &self.criteria
    }

    /// Constraints are checked in registration order
    pub fn add_constraint(&mut self, constraint: ConsistencyConstraint) {
        self.constraints.push(constraint);
    }

    pub fn remove_constraint(
        &mut self,
        name: &str,
    ) -> Result<ConsistencyConstraint, SelectionError> {
        let index = self
            .constraints
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| SelectionError::ConstraintNotFound(name.to_string()))?;
        Ok(self.constraints.remove(index))
    }

    pub fn constraints(&self) -> &[ConsistencyConstraint] {
        &self.constraints
    }

    /// New generation-0-relative candidate with a fresh id
    pub fn candidate(&mut self, synthesis: SynthesisResult, fitness: f64) -> Candidate {
        Candidate {
            id: self.allocate_id(),
            synthesis,
            metadata: HashMap::new(),
            generation: self.history.len(),
            age: 0,
            fitness,
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Score one candidate against the constraints and criteria
    pub fn evaluate(&self, candidate: &Candidate) -> EvaluationResult {
        if let Some(hard) = self
            .constraints
            .iter()
            .find(|c| c.is_hard() && !c.holds(candidate))
        {
            return EvaluationResult {
                candidate_id: candidate.id,
                scores: Vec::new(),
                violations: vec![hard.name.clone()],
                penalty: 0.0,
                total_score: 0.0,
                verdict: Verdict::Eliminate,
            };
        }

        let (weighted, scores) = self.criteria.score(candidate);
        let failing: Vec<&ConsistencyConstraint> = self
            .constraints
            .iter()
            .filter(|c| !c.is_hard() && !c.holds(candidate))
            .collect();
        let penalty: f64 = failing.iter().map(|c| c.penalty).sum();
        let total_score = (weighted - penalty).max(0.0);

        EvaluationResult {
            candidate_id: candidate.id,
            scores,
            violations: failing.iter().map(|c| c.name.clone()).collect(),
            penalty,
            total_score,
            verdict: self.policy.verdict(total_score),
        }
    }

    /// Run one generation and append it to the history
    #[instrument(skip(self, candidates), fields(population = candidates.len()))]
    pub fn select(&mut self, candidates: Vec<Candidate>) -> SelectionGeneration {
        let results: Vec<EvaluationResult> = candidates.iter().map(|c| self.evaluate(c)).collect();

        let mut survivors = Vec::new();
        let mut eliminated = Vec::new();
        let mut mutated = Vec::new();

        for (candidate, result) in candidates.iter().zip(&results) {
            let mut next = candidate.clone();
            match result.verdict {
                Verdict::Survive => {
                    next.age += 1;
                    next.fitness = result.total_score;
                    survivors.push(next);
                }
                Verdict::Suspend => {
                    next.age += 1;
                    survivors.push(next);
                }
                Verdict::Mutate => mutated.push(next),
                Verdict::Eliminate => eliminated.push(next),
            }
        }

        if survivors.len() > self.config.population_limit {
            // stable sort keeps earlier candidates first among equal fitness
            survivors.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
            let overflow = survivors.split_off(self.config.population_limit);
            debug!(dropped = overflow.len(), "Elite selection truncated survivors");
            eliminated.extend(overflow);
        }

        let generation = SelectionGeneration {
            generation: self.history.len(),
            created_at: Utc::now(),
            avg_fitness: FitnessCalculator::average(&survivors),
            diversity_index: FitnessCalculator::diversity_index(&survivors, self.config.precision),
            candidates,
            results,
            survivors,
            eliminated,
            mutated,
        };

        info!(
            generation = generation.generation,
            survivors = generation.survivors.len(),
            mutated = generation.mutated.len(),
            eliminated = generation.eliminated.len(),
            avg_fitness = generation.avg_fitness,
            "Generation selected"
        );

        self.history.push(generation.clone());
        generation
    }

    /// Up to `generations` rounds of [`SelectionEngine::select`].
    ///
    /// Candidates marked for mutation are passed through `mutator`, restamped
    /// with a new id, the next generation number and age 0, then join the
    /// survivors. Stops early after a round without survivors.
    pub fn evolve<F>(
        &mut self,
        initial: Vec<Candidate>,
        generations: usize,
        mutator: F,
    ) -> EvolutionResult
    where
        F: Fn(&Candidate) -> Candidate,
    {
        let mut population = initial;
        let mut rounds = Vec::with_capacity(generations);
        let mut final_population = Vec::new();

        for _ in 0..generations {
            let round = self.select(population);
            final_population = round.survivors.clone();
            if round.survivors.is_empty() {
                debug!(generation = round.generation, "No survivors, stopping evolution");
                rounds.push(round);
                break;
            }

            let next_generation = self.history.len();
            let offspring: Vec<Candidate> = round
                .mutated
                .iter()
                .map(|parent| {
                    let mut child = mutator(parent);
                    child.id = self.allocate_id();
                    child.generation = next_generation;
                    child.age = 0;
                    child
                })
                .collect();

            population = round.survivors.iter().cloned().chain(offspring).collect();
            rounds.push(round);
        }

        let best = final_population
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
            .cloned();

        EvolutionResult {
            generations: rounds,
            final_population,
            best,
        }
    }

    pub fn history(&self) -> &[SelectionGeneration] {
        &self.history
    }

    /// Fittest survivor of the latest generation
    pub fn best_candidate(&self) -> Option<&Candidate> {
        self.history
            .last()?
            .survivors
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    /// Drop the history; candidate ids keep increasing
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
