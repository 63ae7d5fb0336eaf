//! Stability diagnostics for the explicit scheme
//!
//! The model never adjusts `dt`; these numbers only feed warnings and callers
//! that want to pick a safe timestep themselves.

use super::params::TransportParams;
use crate::grid::GridResolution;
use serde::{Deserialize, Serialize};

/// Courant and diffusion numbers of one timestep, per axis `[x, y, z]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityReport {
    /// `velocity * dt / spacing`
    pub courant: [f64; 3],
    /// `D * dt / spacing²`
    pub diffusion: [f64; 3],
}

impl StabilityReport {
    pub fn new(params: &TransportParams, resolution: &GridResolution, dt: f64) -> Self {
        let GridResolution { dx, dy, dz } = *resolution;
        let d = params.diffusion;
        Self {
            courant: [params.u * dt / dx, params.v * dt / dy, params.w * dt / dz],
            diffusion: [d * dt / (dx * dx), d * dt / (dy * dy), d * dt / (dz * dz)],
        }
    }

    /// Weight left on a cell's own old value in the worst case.
    ///
    /// A non-negative margin guarantees that non-negative fields stay
    /// non-negative.
    pub fn positivity_margin(&self) -> f64 {
        let courant: f64 = self.courant.iter().sum();
        let diffusion: f64 = self.diffusion.iter().sum();
        1.0 - courant - 2.0 * diffusion
    }

    pub fn is_stable(&self) -> bool {
        self.positivity_margin() >= 0.0
    }
}
