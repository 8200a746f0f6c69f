//! Error types for the D-FUMT engine
//!
//! Provides a unified error type and per-component error variants.
//! Arithmetic non-results (division by zero, `log` of a non-positive value,
//! unbound variables) are deliberately absent: evaluation reports them as an
//! undefined value, not as an error.

use thiserror::Error;

/// Result type alias using DfumtError
pub type Result<T> = std::result::Result<T, DfumtError>;

/// Unified error type for engine operations
#[derive(Debug, Error)]
pub enum DfumtError {
    // Seed errors
    #[error("Seed error: {0}")]
    Seed(#[from] SeedError),

    // Metabolism errors
    #[error("Metabolism error: {0}")]
    Metabolism(#[from] MetabolismError),

    // Selection errors
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    // Facade dispatch errors
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),

    // Timeout error
    #[error("execution timeout: {0}")]
    Timeout(String),
}

/// Seed component range failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeedError {
    #[error("Extension depth {depth} exceeds maximum {max}")]
    DepthExceeded { depth: usize, max: usize },

    #[error("Invalid dimension for {operation}: {source_dim} -> {target_dim}")]
    InvalidDimension {
        operation: &'static str,
        source_dim: usize,
        target_dim: usize,
    },

    #[error("Cannot {operation} an empty vector")]
    EmptyVector { operation: &'static str },
}

/// Metabolism component errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetabolismError {
    #[error("Cannot chain an empty formula list")]
    EmptyChain,

    #[error("Unknown synthesis mode: {0}")]
    UnknownMode(String),

    #[error("Rule not registered: {0}")]
    RuleNotFound(String),
}

/// Selection component errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("Criterion weight must be within [0, 1], got {weight}")]
    InvalidWeight { weight: f64 },

    #[error("Constraint penalty must be non-negative, got {penalty}")]
    InvalidPenalty { penalty: f64 },

    #[error("Criterion not registered: {0}")]
    CriterionNotFound(String),

    #[error("Constraint not registered: {0}")]
    ConstraintNotFound(String),

    #[error("Population limit must be at least 1")]
    InvalidPopulationLimit,
}

/// Action facade errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Missing required argument '{argument}' for action {action}")]
    MissingArgument { action: String, argument: String },

    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },
}

impl From<serde_json::Error> for DfumtError {
    fn from(err: serde_json::Error) -> Self {
        DfumtError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for DfumtError {
    fn from(err: anyhow::Error) -> Self {
        DfumtError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DfumtError::Seed(SeedError::DepthExceeded { depth: 80, max: 64 });
        assert!(err.to_string().contains("80"));
        assert!(err.to_string().contains("64"));
    }

    #[test]
    fn test_dispatch_error() {
        let err = DispatchError::MissingArgument {
            action: "seed.extend".to_string(),
            argument: "origin".to_string(),
        };
        assert!(err.to_string().contains("'origin'"));
    }

    #[test]
    fn test_timeout_message() {
        let err = DfumtError::Timeout("engine.run after 5000ms".to_string());
        assert!(err.to_string().starts_with("execution timeout"));
    }
}
