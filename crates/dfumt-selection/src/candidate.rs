//! Candidate formulas tracked across generations

use std::collections::HashMap;

use dfumt_common::FormulaNode;
use dfumt_metabolism::SynthesisResult;
use serde::Serialize;

/// One formula with its derived metrics and lineage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Engine-assigned, never reused
    pub id: u64,
    pub synthesis: SynthesisResult,
    pub metadata: HashMap<String, serde_json::Value>,
    pub generation: usize,
    /// Rounds survived
    pub age: usize,
    pub fitness: f64,
}

impl Candidate {
    pub fn formula(&self) -> &FormulaNode {
        &self.synthesis.formula
    }

    /// Evaluated value, `None` when undefined
    pub fn value(&self) -> Option<f64> {
        self.synthesis.value
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
