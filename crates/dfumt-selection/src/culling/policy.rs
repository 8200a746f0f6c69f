//! Verdict policy: ≥0.7 survive, ≥0.55 suspend, ≥0.4 mutate, else eliminate
//!
//! The mutate band [0.4, 0.55) is narrower than the suspend band above it.
//! Scores recorded in earlier histories depend on these exact cut-offs.

use std::fmt;

use serde::Serialize;

/// Outcome for one candidate in one generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Survive,
    Suspend,
    Mutate,
    Eliminate,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verdict::Survive => "survive",
            Verdict::Suspend => "suspend",
            Verdict::Mutate => "mutate",
            Verdict::Eliminate => "eliminate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerdictPolicy {
    survive: f64,
    suspend: f64,
    mutate: f64,
}

impl VerdictPolicy {
    pub fn new(survive: f64, suspend: f64, mutate: f64) -> Self {
        Self { survive, suspend, mutate }
    }

    pub fn verdict(&self, total_score: f64) -> Verdict {
        if total_score >= self.survive {
            Verdict::Survive
        } else if total_score >= self.suspend {
            Verdict::Suspend
        } else if total_score >= self.mutate {
            Verdict::Mutate
        } else {
            Verdict::Eliminate
        }
    }
}

impl Default for VerdictPolicy {
    fn default() -> Self {
        Self::new(0.7, 0.55, 0.4)
    }
}
