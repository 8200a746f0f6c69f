//! Zero extension and contraction

use dfumt_common::{DualPair, SeedError, PHI};
use ordered_float::OrderedFloat;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::SeedEngine;

/// One expansion of a scalar origin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZeroExtension {
    pub origin: f64,
    pub depth: usize,
    pub expanded: Vec<f64>,
    /// Always `(+|origin|, −|origin|)`
    pub dual: DualPair,
}

/// One contraction of a value list back to a scalar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZeroContraction {
    pub values: Vec<f64>,
    pub contracted: f64,
    pub loss_ratio: f64,
}

impl SeedEngine {
    /// Expand `origin` into its companion sequence.
    ///
    /// Results are memoized by `(origin, depth)`.
    #[instrument(skip(self))]
    pub fn extend(&mut self, origin: f64, depth: usize) -> Result<ZeroExtension, SeedError> {
        if depth > self.config.max_depth {
            return Err(SeedError::DepthExceeded {
                depth,
                max: self.config.max_depth,
            });
        }

        let key = (OrderedFloat(origin), depth);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Extension cache hit");
            return Ok(hit.clone());
        }

        let expanded = if origin == 0.0 {
            self.expand_zero(depth)
        } else {
            Self::expand_scaled(origin, depth)
        };

        let extension = ZeroExtension {
            origin,
            depth,
            expanded,
            dual: DualPair::symmetric(origin),
        };
        debug!(terms = extension.expanded.len(), "Extension computed");
        self.cache.insert(key, extension.clone());
        Ok(extension)
    }

    fn expand_zero(&self, depth: usize) -> Vec<f64> {
        let eps = self.config.precision;
        let mut out = Vec::with_capacity(2 * depth + 1);
        for k in 1..=depth {
            let term = eps * PHI.powi(k as i32);
            out.push(term);
            out.push(-term);
        }
        out.push(0.0);
        out
    }

    fn expand_scaled(origin: f64, depth: usize) -> Vec<f64> {
        let mut out = Vec::with_capacity((2 * depth).saturating_sub(1));
        for k in 0..depth {
            let term = origin * PHI.powi(k as i32) / ((k + 1) as f64).exp();
            out.push(term);
            if k > 0 {
                out.push(-term);
            }
        }
        out
    }

    /// Ladder of extensions at depths `1..=target_depth`, each re-seeded from
    /// the first term of the previous level.
    #[instrument(skip(self))]
    pub fn extend_recursive(
        &mut self,
        origin: f64,
        target_depth: usize,
    ) -> Result<Vec<ZeroExtension>, SeedError> {
        if target_depth > self.config.max_depth {
            return Err(SeedError::DepthExceeded {
                depth: target_depth,
                max: self.config.max_depth,
            });
        }

        let mut ladder = Vec::with_capacity(target_depth);
        let mut current = origin;
        for depth in 1..=target_depth {
            let extension = self.extend(current, depth)?;
            current = extension.expanded.first().copied().unwrap_or(0.0);
            ladder.push(extension);
        }
        Ok(ladder)
    }

    /// Contract a sequence to its mean.
    ///
    /// `loss_ratio` measures the imbalance between the non-negative and the
    /// negative mass of the sequence.
    pub fn contract(&self, values: &[f64]) -> ZeroContraction {
        let eps = self.config.precision;
        if values.is_empty() {
            return ZeroContraction {
                values: Vec::new(),
                contracted: 0.0,
                loss_ratio: 0.0,
            };
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let contracted = if mean.abs() < eps { 0.0 } else { mean };

        let positive: f64 = values.iter().filter(|v| **v >= 0.0).sum();
        let negative: f64 = values.iter().filter(|v| **v < 0.0).map(|v| v.abs()).sum();
        let magnitude = positive + negative;
        let loss_ratio = if magnitude < eps {
            0.0
        } else {
            (positive - negative).abs() / magnitude
        };

        ZeroContraction {
            values: values.to_vec(),
            contracted,
            loss_ratio,
        }
    }

    /// Eliminate symmetric pairs with a two-pointer sweep over the sorted values.
    ///
    /// When the endpoints do not cancel, the endpoint with the larger magnitude
    /// cannot be cancelled by anything left in the window, so it survives and
    /// only its pointer moves.
    pub fn cancel_duals(&self, values: &[f64]) -> ZeroContraction {
        let eps = self.config.precision;
        if values.is_empty() {
            return ZeroContraction {
                values: Vec::new(),
                contracted: 0.0,
                loss_ratio: 0.0,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut survivors = Vec::new();
        let (mut lo, mut hi) = (0usize, sorted.len() - 1);
        while lo < hi {
            let (low, high) = (sorted[lo], sorted[hi]);
            if (low + high).abs() < eps {
                lo += 1;
                hi -= 1;
            } else if low.abs() > high.abs() {
                survivors.push(low);
                lo += 1;
            } else {
                survivors.push(high);
                hi -= 1;
            }
        }
        if lo == hi {
            survivors.push(sorted[lo]);
        }

        debug!(
            original = values.len(),
            surviving = survivors.len(),
            "Dual cancellation finished"
        );

        ZeroContraction {
            values: values.to_vec(),
            contracted: survivors.iter().sum(),
            loss_ratio: survivors.len() as f64 / values.len() as f64,
        }
    }
}
