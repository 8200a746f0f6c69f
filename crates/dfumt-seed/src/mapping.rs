//! Dimensional mapping
//!
//! Elevation appends phase-rotated, φ-scaled copies of existing components;
//! reduction is block-mean compression. Neither is the inverse of the other.

use std::fmt;
use std::sync::Arc;

use dfumt_common::{SeedError, PHI, PI_EXT};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::SeedEngine;

/// Callable vector map
pub type Kernel = Arc<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>;

/// Mapping family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingKind {
    /// Nearest-index resampling
    Linear,
    /// Elevate or block-reduce, depending on direction
    Dfumt,
    /// Real part of the discrete Fourier transform
    Fourier,
}

/// A map between two dimensionalities with its structural properties
#[derive(Clone, Serialize)]
pub struct DimensionalMapping {
    pub source_dim: usize,
    pub target_dim: usize,
    pub kind: MappingKind,
    pub injective: bool,
    pub surjective: bool,
    pub fixed_points: Vec<Vec<f64>>,
    #[serde(skip)]
    kernel: Kernel,
}

impl DimensionalMapping {
    pub fn apply(&self, vector: &[f64]) -> Vec<f64> {
        (self.kernel)(vector)
    }

    pub fn kernel(&self) -> Kernel {
        Arc::clone(&self.kernel)
    }
}

impl fmt::Debug for DimensionalMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DimensionalMapping")
            .field("source_dim", &self.source_dim)
            .field("target_dim", &self.target_dim)
            .field("kind", &self.kind)
            .field("injective", &self.injective)
            .field("surjective", &self.surjective)
            .field("fixed_points", &self.fixed_points.len())
            .finish()
    }
}

/// Append `target - len` components `v[i mod len] · cos(iπ/π_ext) · φ`
fn elevate_components(vector: &[f64], target_dim: usize) -> Vec<f64> {
    let source_dim = vector.len();
    let mut out = Vec::with_capacity(target_dim);
    out.extend_from_slice(vector);
    for i in source_dim..target_dim {
        let phase = (i as f64 * std::f64::consts::PI / PI_EXT).cos();
        out.push(vector[i % source_dim] * phase * PHI);
    }
    out
}

/// Average `target_dim` contiguous blocks of (possibly fractional) equal size
fn block_mean(vector: &[f64], target_dim: usize) -> Vec<f64> {
    let n = vector.len();
    let size = n as f64 / target_dim as f64;
    (0..target_dim)
        .map(|k| {
            let start = (k as f64 * size).floor() as usize;
            let end = if k + 1 == target_dim {
                n
            } else {
                (((k + 1) as f64 * size).floor() as usize).max(start + 1)
            };
            let block = &vector[start..end];
            block.iter().sum::<f64>() / block.len() as f64
        })
        .collect()
}

fn resample(vector: &[f64], target_dim: usize) -> Vec<f64> {
    if vector.is_empty() {
        return vec![0.0; target_dim];
    }
    let n = vector.len();
    (0..target_dim).map(|j| vector[j * n / target_dim]).collect()
}

fn fourier(vector: &[f64], target_dim: usize) -> Vec<f64> {
    let n = vector.len();
    if n == 0 {
        return vec![0.0; target_dim];
    }
    (0..target_dim)
        .map(|k| {
            vector
                .iter()
                .enumerate()
                .map(|(t, x)| {
                    x * (2.0 * std::f64::consts::PI * (k * t) as f64 / n as f64).cos()
                })
                .sum::<f64>()
                / n as f64
        })
        .collect()
}

impl SeedEngine {
    /// Raise `vector` to `target_dim` components
    pub fn elevate(&self, vector: &[f64], target_dim: usize) -> Result<Vec<f64>, SeedError> {
        if target_dim < vector.len() {
            return Err(SeedError::InvalidDimension {
                operation: "elevate",
                source_dim: vector.len(),
                target_dim,
            });
        }
        if vector.is_empty() {
            return Err(SeedError::EmptyVector { operation: "elevate" });
        }
        Ok(elevate_components(vector, target_dim))
    }

    /// Compress `vector` to `target_dim` components by block averaging
    pub fn reduce(&self, vector: &[f64], target_dim: usize) -> Result<Vec<f64>, SeedError> {
        if target_dim > vector.len() || target_dim == 0 {
            return Err(SeedError::InvalidDimension {
                operation: "reduce",
                source_dim: vector.len(),
                target_dim,
            });
        }
        Ok(block_mean(vector, target_dim))
    }

    /// Damped fixed-point search from the all-0, all-1, all-φ and all-−φ seeds.
    ///
    /// Only seeds whose iteration converges within `iterations` contribute a
    /// point; points closer than the configured tolerance are merged.
    pub fn find_fixed_points(
        &self,
        f: &dyn Fn(&[f64]) -> Vec<f64>,
        dim: usize,
        iterations: usize,
    ) -> Vec<Vec<f64>> {
        if dim == 0 {
            return Vec::new();
        }

        let threshold = self.config.precision * dim as f64;
        let tolerance = self.config.fixed_point_tolerance;
        let mut points: Vec<Vec<f64>> = Vec::new();

        for seed in [0.0, 1.0, PHI, -PHI] {
            let mut x = vec![seed; dim];
            let mut converged = false;

            for _ in 0..iterations {
                let fx = f(&x);
                if fx.len() != dim {
                    break;
                }
                let next: Vec<f64> = x.iter().zip(&fx).map(|(a, b)| 0.5 * a + 0.5 * b).collect();
                let delta: f64 = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
                x = next;
                if !delta.is_finite() {
                    break;
                }
                if delta < threshold {
                    converged = true;
                    break;
                }
            }

            let duplicate = points
                .iter()
                .any(|p| p.iter().zip(&x).all(|(a, b)| (a - b).abs() <= tolerance));
            if converged && !duplicate {
                points.push(x);
            }
        }

        points
    }

    /// Build a kernel between two dimensionalities.
    ///
    /// Fixed points are only searched for square maps (`source == target`);
    /// other shapes report none.
    #[instrument(skip(self))]
    pub fn create_mapping(
        &self,
        source_dim: usize,
        target_dim: usize,
        kind: MappingKind,
    ) -> DimensionalMapping {
        let kernel: Kernel = match kind {
            MappingKind::Linear => Arc::new(move |x: &[f64]| resample(x, target_dim)),
            MappingKind::Dfumt => Arc::new(move |x: &[f64]| {
                if x.is_empty() {
                    vec![0.0; target_dim]
                } else if target_dim >= x.len() {
                    elevate_components(x, target_dim)
                } else {
                    block_mean(x, target_dim)
                }
            }),
            MappingKind::Fourier => Arc::new(move |x: &[f64]| fourier(x, target_dim)),
        };

        let (injective, surjective) = match kind {
            MappingKind::Linear | MappingKind::Dfumt => {
                (target_dim >= source_dim, target_dim <= source_dim)
            }
            MappingKind::Fourier => (false, true),
        };

        let fixed_points = if source_dim == target_dim {
            self.find_fixed_points(
                kernel.as_ref(),
                source_dim,
                self.config.fixed_point_iterations,
            )
        } else {
            Vec::new()
        };

        debug!(
            injective,
            surjective,
            fixed_points = fixed_points.len(),
            "Mapping created"
        );

        DimensionalMapping {
            source_dim,
            target_dim,
            kind,
            injective,
            surjective,
            fixed_points,
            kernel,
        }
    }
}
