//! Constant registry
//!
//! Read-only table of the named constants the engine reasons about. The table
//! is built once on first access and never mutated afterwards.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;

/// Golden ratio φ
pub const PHI: f64 = 1.618_033_988_749_895;

/// Extended π used as the angular divisor when elevating vectors (2π)
pub const PI_EXT: f64 = 2.0 * std::f64::consts::PI;

/// Tolerance used when recognising special values in raw input
pub const RECOGNITION_TOLERANCE: f64 = 1e-10;

/// One registry entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantEntry {
    /// Stable identifier, e.g. `phi`
    pub id: &'static str,
    /// Display symbol, e.g. `φ`
    pub symbol: &'static str,
    /// Numeric value
    pub value: f64,
    /// Domain the constant belongs to
    pub domain: &'static str,
    /// How the constant behaves under expansion
    pub expansion: &'static str,
    /// How the constant behaves under contraction
    pub contraction: &'static str,
    /// Whether raw input values equal to this constant get labelled
    #[serde(skip)]
    recognizable: bool,
}

lazy_static! {
    static ref REGISTRY: Vec<ConstantEntry> = vec![
        ConstantEntry {
            id: "zero",
            symbol: "0",
            value: 0.0,
            domain: "origin",
            expansion: "unfolds into symmetric ±ε·φ^k pairs around the origin",
            contraction: "every balanced sequence contracts back to it",
            recognizable: false,
        },
        ConstantEntry {
            id: "phi",
            symbol: "φ",
            value: PHI,
            domain: "spiral growth",
            expansion: "each level grows by a factor of φ",
            contraction: "φ^2 folds back into φ + 1",
            recognizable: true,
        },
        ConstantEntry {
            id: "pi",
            symbol: "π",
            value: std::f64::consts::PI,
            domain: "rotation",
            expansion: "scales a formula onto the half turn",
            contraction: "periodic terms cancel over a full turn",
            recognizable: true,
        },
        ConstantEntry {
            id: "e",
            symbol: "e",
            value: std::f64::consts::E,
            domain: "natural growth",
            expansion: "continuous compounding of the origin",
            contraction: "each level is damped by a factor of e",
            recognizable: true,
        },
        ConstantEntry {
            id: "pi_ext",
            symbol: "π_ext",
            value: PI_EXT,
            domain: "dimensional rotation",
            expansion: "phase divisor for components added by elevation",
            contraction: "block averaging discards the added phase",
            recognizable: false,
        },
        ConstantEntry {
            id: "sqrt2",
            symbol: "√2",
            value: std::f64::consts::SQRT_2,
            domain: "diagonal",
            expansion: "doubles area per level",
            contraction: "halves area per level",
            recognizable: false,
        },
    ];
    static ref BY_ID: HashMap<&'static str, usize> = REGISTRY
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id, i))
        .collect();
}

/// All registered constants in registration order
pub fn all() -> &'static [ConstantEntry] {
    &REGISTRY
}

/// Look up a constant by id
pub fn lookup(id: &str) -> Option<&'static ConstantEntry> {
    BY_ID.get(id).map(|&i| &REGISTRY[i])
}

/// Look up a constant by its display symbol
pub fn lookup_symbol(symbol: &str) -> Option<&'static ConstantEntry> {
    REGISTRY.iter().find(|c| c.symbol == symbol)
}

/// Recognise π, e and φ in raw numeric input
pub fn recognize(value: f64, tolerance: f64) -> Option<&'static ConstantEntry> {
    REGISTRY
        .iter()
        .filter(|c| c.recognizable)
        .find(|c| (c.value - value).abs() <= tolerance)
}
