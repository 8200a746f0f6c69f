//! Core data types for the D-FUMT engine

pub mod formula;
