//! Physical parameters of the transport equation

use crate::error::TransportError;
use serde::{Deserialize, Serialize};

/// Treatment of the top layer (`k = nz - 1`) after each step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TopBoundary {
    /// Concentration escapes freely: the top layer is forced to zero every step
    #[default]
    Open,
    /// The top layer evolves through the stencil only
    Closed,
}

impl TopBoundary {
    pub fn is_open(self) -> bool {
        matches!(self, TopBoundary::Open)
    }
}

/// Wind, diffusion and boundary settings
///
/// The upwind advection scheme only looks at the lower-index neighbour, so
/// wind components must be non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransportParams {
    /// North-south wind velocity
    pub u: f64,
    /// West-east wind velocity
    pub v: f64,
    /// Vertical velocity
    pub w: f64,
    /// Diffusion coefficient
    pub diffusion: f64,
    pub top_boundary: TopBoundary,
}

impl Default for TransportParams {
    fn default() -> Self {
        Self {
            u: 1.0,
            v: 0.0,
            w: 0.1,
            diffusion: 0.1,
            top_boundary: TopBoundary::Open,
        }
    }
}

impl TransportParams {
    /// No wind, no diffusion, closed top: the field never changes on its own
    pub fn still_air() -> Self {
        Self {
            u: 0.0,
            v: 0.0,
            w: 0.0,
            diffusion: 0.0,
            top_boundary: TopBoundary::Closed,
        }
    }

    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if a coefficient is not
    /// finite, or if a wind component or the diffusion coefficient is negative.
    pub fn validate(&self) -> Result<(), TransportError> {
        for (name, value) in [
            ("u", self.u),
            ("v", self.v),
            ("w", self.w),
            ("diffusion", self.diffusion),
        ] {
            if !value.is_finite() {
                return Err(TransportError::configuration(format!(
                    "{name} must be finite, got {value}"
                )));
            }
            if value < 0.0 {
                return Err(TransportError::configuration(format!(
                    "{name} must be non-negative for the upwind scheme, got {value}"
                )));
            }
        }
        Ok(())
    }
}
