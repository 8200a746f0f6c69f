//! Engine configuration

use dfumt_common::{
    DfumtError, Result, DEFAULT_MAX_DEPTH, DEFAULT_MAX_REDUCE_STEPS, DEFAULT_POPULATION_LIMIT,
    DEFAULT_PRECISION,
};
use dfumt_metabolism::MetabolismConfig;
use dfumt_seed::SeedConfig;
use dfumt_selection::SelectionConfig;
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub seed: SeedSettings,
    pub metabolism: MetabolismSettings,
    pub selection: SelectionSettings,
    pub facade: FacadeSettings,
}

impl EngineConfig {
    /// Load configuration from `.env` and `DFUMT_*` environment variables.
    ///
    /// Values that fail to parse keep their defaults.
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        // Seed settings
        if let Ok(val) = std::env::var("DFUMT_PRECISION") {
            if let Ok(v) = val.parse() {
                cfg.seed.precision = v;
            }
        }
        if let Ok(val) = std::env::var("DFUMT_MAX_DEPTH") {
            if let Ok(v) = val.parse() {
                cfg.seed.max_depth = v;
            }
        }

        // Metabolism settings
        if let Ok(val) = std::env::var("DFUMT_MAX_REDUCE_STEPS") {
            if let Ok(v) = val.parse() {
                cfg.metabolism.max_reduce_steps = v;
            }
        }

        // Selection settings
        if let Ok(val) = std::env::var("DFUMT_POPULATION_LIMIT") {
            if let Ok(v) = val.parse() {
                cfg.selection.population_limit = v;
            }
        }

        // Facade settings
        if let Ok(val) = std::env::var("DFUMT_MAX_VECTOR_LEN") {
            if let Ok(v) = val.parse() {
                cfg.facade.max_vector_len = v;
            }
        }
        if let Ok(val) = std::env::var("DFUMT_TIMEOUT_MS") {
            if let Ok(v) = val.parse() {
                cfg.facade.timeout_ms = v;
            }
        }
        if let Ok(val) = std::env::var("DFUMT_MAX_TARGET_DIM") {
            if let Ok(v) = val.parse() {
                cfg.facade.max_target_dim = v;
            }
        }
        if let Ok(val) = std::env::var("DFUMT_MAX_TURNS") {
            if let Ok(v) = val.parse() {
                cfg.facade.max_turns = v;
            }
        }
        if let Ok(val) = std::env::var("DFUMT_MAX_GENERATIONS") {
            if let Ok(v) = val.parse() {
                cfg.facade.max_generations = v;
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.seed.precision.is_finite() && self.seed.precision > 0.0) {
            return Err(DfumtError::Config(format!(
                "precision must be positive, got {}",
                self.seed.precision
            )));
        }
        if self.selection.population_limit == 0 {
            return Err(DfumtError::Config(
                "population limit must be at least 1".to_string(),
            ));
        }
        if self.facade.max_vector_len == 0 {
            return Err(DfumtError::Config(
                "max vector length must be at least 1".to_string(),
            ));
        }
        let facade = &self.facade;
        if facade.max_target_dim == 0 || facade.max_turns == 0 || facade.max_generations == 0 {
            return Err(DfumtError::Config(
                "facade argument limits must be at least 1".to_string(),
            ));
        }
        if facade.default_depth > self.seed.max_depth
            || facade.default_generations > facade.max_generations
            || facade.max_vector_len.saturating_mul(2) > facade.max_target_dim
        {
            return Err(DfumtError::Config(
                "facade defaults must lie within the facade limits".to_string(),
            ));
        }
        Ok(())
    }

    pub fn seed_config(&self) -> SeedConfig {
        SeedConfig {
            precision: self.seed.precision,
            max_depth: self.seed.max_depth,
            fixed_point_tolerance: self.seed.fixed_point_tolerance,
            fixed_point_iterations: self.seed.fixed_point_iterations,
        }
    }

    pub fn metabolism_config(&self) -> MetabolismConfig {
        MetabolismConfig {
            precision: self.seed.precision,
            max_reduce_steps: self.metabolism.max_reduce_steps,
        }
    }

    pub fn selection_config(&self) -> SelectionConfig {
        SelectionConfig {
            population_limit: self.selection.population_limit,
            precision: self.seed.precision,
            ..SelectionConfig::default()
        }
    }
}

/// Seed settings; `precision` is shared by every component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSettings {
    pub precision: f64,
    pub max_depth: usize,
    pub fixed_point_tolerance: f64,
    pub fixed_point_iterations: usize,
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            max_depth: DEFAULT_MAX_DEPTH,
            fixed_point_tolerance: 1e-6,
            fixed_point_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetabolismSettings {
    pub max_reduce_steps: usize,
}

impl Default for MetabolismSettings {
    fn default() -> Self {
        Self {
            max_reduce_steps: DEFAULT_MAX_REDUCE_STEPS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionSettings {
    pub population_limit: usize,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            population_limit: DEFAULT_POPULATION_LIMIT,
        }
    }
}

/// Action facade settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacadeSettings {
    /// Array arguments are truncated to this many elements
    pub max_vector_len: usize,
    /// Wall-clock bound of `dispatch_with_timeout`
    pub timeout_ms: u64,
    /// Extension depth when a request names none
    pub default_depth: usize,
    /// Generations when a request names none
    pub default_generations: usize,
    /// Largest `target` accepted by `seed.elevate` and `seed.reduce`
    pub max_target_dim: usize,
    /// Largest `turns` accepted by `metabolism.evaluate_constants`
    pub max_turns: usize,
    /// Largest `generations` accepted by `engine.run`
    pub max_generations: usize,
}

impl Default for FacadeSettings {
    fn default() -> Self {
        Self {
            max_vector_len: 256,
            timeout_ms: 5000,
            default_depth: 3,
            default_generations: 5,
            max_target_dim: 4096,
            max_turns: 64,
            max_generations: 100,
        }
    }
}
