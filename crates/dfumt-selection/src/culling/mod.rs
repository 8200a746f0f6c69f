//! Verdict assignment on total scores

pub mod policy;

pub use policy::{Verdict, VerdictPolicy};
