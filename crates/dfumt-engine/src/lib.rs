//! # D-FUMT Engine
//!
//! Symbolic formula engine: a three-stage pipeline that expands numeric
//! input, rewrites formula trees to a fixed point and evolves a population of
//! candidate formulas.
//!
//! ## Pipeline
//!
//! ```text
//! vector ──▶ Seed ──────────▶ Metabolism ──────────────▶ Selection ──▶ summary
//!            extend/elevate    synthesize/chain/reduce     evolve
//! ```
//!
//! ## Facade
//!
//! [`facade::ActionDispatcher`] exposes the engine as named actions with JSON
//! arguments and structured responses.

pub mod config;
pub mod engine;
pub mod facade;
pub mod metrics;
pub mod pipeline;

pub use config::EngineConfig;
pub use engine::{EngineStats, FormulaEngine};
pub use facade::{ActionDispatcher, ActionRequest, ActionResponse};
pub use metrics::DispatchMetrics;
pub use pipeline::{PipelineOptions, PipelineResult};

pub use dfumt_common::VERSION;
