//! # Seed
//!
//! Zero-centered expansion and contraction of scalars, plus dimension-changing
//! maps over numeric vectors.
//!
//! ## Extension
//!
//! ```text
//! origin = 0 :  [+εφ, −εφ, +εφ², −εφ², …, +εφᵈ, −εφᵈ, 0]        (2d + 1 terms)
//! origin ≠ 0 :  [o/e, oφ/e², −oφ/e², …, oφᵈ⁻¹/eᵈ, −oφᵈ⁻¹/eᵈ]  (2d − 1 terms)
//! ```
//!
//! Extensions are memoized per `(origin, depth)` for the lifetime of a
//! [`SeedEngine`]; [`SeedEngine::clear_cache`] is the only eviction.

pub mod extension;
pub mod mapping;

use std::collections::HashMap;

use dfumt_common::{DEFAULT_MAX_DEPTH, DEFAULT_PRECISION};
use ordered_float::OrderedFloat;

pub use extension::{ZeroContraction, ZeroExtension};
pub use mapping::{DimensionalMapping, Kernel, MappingKind};

/// Seed configuration
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// Numeric precision ε
    pub precision: f64,
    /// Maximum extension depth
    pub max_depth: usize,
    /// Component-wise tolerance used to deduplicate fixed points
    pub fixed_point_tolerance: f64,
    /// Iteration budget for fixed-point search inside `create_mapping`
    pub fixed_point_iterations: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            max_depth: DEFAULT_MAX_DEPTH,
            fixed_point_tolerance: 1e-6,
            fixed_point_iterations: 100,
        }
    }
}

type CacheKey = (OrderedFloat<f64>, usize);

/// Seed component instance
pub struct SeedEngine {
    config: SeedConfig,
    cache: HashMap<CacheKey, ZeroExtension>,
}

impl SeedEngine {
    pub fn new(config: SeedConfig) -> Self {
        Self {
            config,
            cache: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    /// Number of memoized extensions
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop every memoized extension
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for SeedEngine {
    fn default() -> Self {
        Self::new(SeedConfig::default())
    }
}
