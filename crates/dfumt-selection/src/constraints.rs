//! Hard and soft consistency constraints

use std::fmt;
use std::sync::Arc;

use dfumt_common::SelectionError;
use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;

pub type Check = Arc<dyn Fn(&Candidate) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Failure eliminates the candidate outright
    Hard,
    /// Failure subtracts the penalty from the score
    Soft,
}

#[derive(Clone)]
pub struct ConsistencyConstraint {
    pub name: String,
    pub severity: Severity,
    pub penalty: f64,
    check: Check,
}

impl ConsistencyConstraint {
    pub fn new(
        name: impl Into<String>,
        severity: Severity,
        penalty: f64,
        check: impl Fn(&Candidate) -> bool + Send + Sync + 'static,
    ) -> Result<Self, SelectionError> {
        if !penalty.is_finite() || penalty < 0.0 {
            return Err(SelectionError::InvalidPenalty { penalty });
        }
        Ok(Self {
            name: name.into(),
            severity,
            penalty,
            check: Arc::new(check),
        })
    }

    pub fn hard(
        name: impl Into<String>,
        check: impl Fn(&Candidate) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            severity: Severity::Hard,
            penalty: 0.0,
            check: Arc::new(check),
        }
    }

    /// True when the candidate satisfies the constraint
    #[inline]
    pub fn holds(&self, candidate: &Candidate) -> bool {
        (self.check)(candidate)
    }

    pub fn is_hard(&self) -> bool {
        self.severity == Severity::Hard
    }
}

impl fmt::Debug for ConsistencyConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsistencyConstraint")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .field("penalty", &self.penalty)
            .finish()
    }
}

/// Hard `finite-value`, soft `complexity-limit` and soft `depth-limit`
pub fn default_constraints(
    complexity_limit: usize,
    depth_limit: usize,
    soft_penalty: f64,
) -> Result<Vec<ConsistencyConstraint>, SelectionError> {
    Ok(vec![
        ConsistencyConstraint::hard("finite-value", |c| c.value().is_some_and(f64::is_finite)),
        ConsistencyConstraint::new("complexity-limit", Severity::Soft, soft_penalty, move |c| {
            c.synthesis.complexity <= complexity_limit
        })?,
        ConsistencyConstraint::new("depth-limit", Severity::Soft, soft_penalty, move |c| {
            c.synthesis.depth <= depth_limit
        })?,
    ])
}
