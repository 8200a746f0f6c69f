//! # D-FUMT Common
//!
//! Shared types, errors, and the constant registry for the D-FUMT formula engine.
//!
//! ## Core Types
//!
//! - [`FormulaNode`]: immutable formula tree node (constant, variable, operator, function, dual)
//! - [`DualPair`]: companion `(positive, negative)` values of a dual node
//! - [`DfumtError`]: unified error type with per-component variants
//!
//! ## Constant Registry
//!
//! - [`constants`]: read-only table of φ, π, e, π_ext and friends

pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use constants::{ConstantEntry, PHI, PI_EXT};
pub use error::{DfumtError, DispatchError, MetabolismError, Result, SeedError, SelectionError};
pub use types::formula::{DualPair, FormulaNode, NodeKind};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default numeric precision (ε)
pub const DEFAULT_PRECISION: f64 = 1e-10;

/// Default maximum extension depth
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default rewrite step bound
pub const DEFAULT_MAX_REDUCE_STEPS: usize = 100;

/// Default population limit for elite selection
pub const DEFAULT_POPULATION_LIMIT: usize = 20;
