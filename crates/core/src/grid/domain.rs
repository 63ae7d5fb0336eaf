//! Physical extent and resolution of the modelled air column
//!
//! Grid dimensions are derived once from bounds and resolution:
//! ```text
//! nx = floor((ns_max - ns_min) / dx) + 1
//! ny = floor((we_max - we_min) / dy) + 1
//! nz = floor(top_altitude / dz) + 1
//! ```

use crate::error::TransportError;
use serde::{Deserialize, Serialize};

/// Horizontal bounds and top altitude of the domain (metres)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainBounds {
    /// North-south extent `(min, max)`
    pub north_south: (f64, f64),
    /// West-east extent `(min, max)`
    pub west_east: (f64, f64),
    /// Altitude of the top layer
    pub top_altitude: f64,
}

impl DomainBounds {
    /// Bounds with the default top altitude of 2000 m
    pub fn new(north_south: (f64, f64), west_east: (f64, f64)) -> Self {
        Self {
            north_south,
            west_east,
            top_altitude: 2000.0,
        }
    }

    pub fn with_top_altitude(mut self, top_altitude: f64) -> Self {
        self.top_altitude = top_altitude;
        self
    }

    /// Check that both bound pairs are increasing and the top altitude positive
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] naming the first offending axis.
    pub fn validate(&self) -> Result<(), TransportError> {
        check_pair("north_south", self.north_south)?;
        check_pair("west_east", self.west_east)?;
        check_positive("top_altitude", self.top_altitude)
    }

    /// North-south span in metres
    pub fn north_south_extent(&self) -> f64 {
        self.north_south.1 - self.north_south.0
    }

    /// West-east span in metres
    pub fn west_east_extent(&self) -> f64 {
        self.west_east.1 - self.west_east.0
    }
}

/// Cell sizes along each axis (metres)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridResolution {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

impl Default for GridResolution {
    fn default() -> Self {
        Self {
            dx: 1000.0,
            dy: 1000.0,
            dz: 100.0,
        }
    }
}

impl GridResolution {
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if any cell size is not finite and positive.
    pub fn validate(&self) -> Result<(), TransportError> {
        check_positive("dx", self.dx)?;
        check_positive("dy", self.dy)?;
        check_positive("dz", self.dz)
    }
}

/// Largest grid accepted by [`GridDimensions::derive`]; each of the two
/// field buffers then stays within 1 GiB
pub const MAX_CELLS: usize = 1 << 27;

/// Number of cells along each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl GridDimensions {
    /// Validate bounds and resolution, then derive the grid dimensions
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] for invalid bounds or
    /// resolution, or when the grid would hold more than [`MAX_CELLS`] cells.
    pub fn derive(
        bounds: &DomainBounds,
        resolution: &GridResolution,
    ) -> Result<Self, TransportError> {
        bounds.validate()?;
        resolution.validate()?;

        let counts = [
            axis_cells(bounds.north_south_extent(), resolution.dx),
            axis_cells(bounds.west_east_extent(), resolution.dy),
            axis_cells(bounds.top_altitude, resolution.dz),
        ];
        let total: f64 = counts.iter().product();
        if total > MAX_CELLS as f64 {
            return Err(TransportError::configuration(format!(
                "grid of {:.0}x{:.0}x{:.0} cells exceeds the limit of {MAX_CELLS} cells",
                counts[0], counts[1], counts[2]
            )));
        }

        // Each axis count is at most the checked total, so the casts are exact
        let dims = Self {
            nx: counts[0] as usize,
            ny: counts[1] as usize,
            nz: counts[2] as usize,
        };

        Ok(dims)
    }

    /// Total number of cells
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Whether a signed horizontal index lies inside `[0, nx) x [0, ny)`
    #[inline]
    pub fn contains_horizontal(&self, i: i64, j: i64) -> bool {
        usize::try_from(i).is_ok_and(|i| i < self.nx)
            && usize::try_from(j).is_ok_and(|j| j < self.ny)
    }
}

/// Cell count along one axis, kept in `f64` until the total is checked
fn axis_cells(extent: f64, step: f64) -> f64 {
    (extent / step).floor() + 1.0
}

fn check_pair(name: &str, (min, max): (f64, f64)) -> Result<(), TransportError> {
    if !(min.is_finite() && max.is_finite()) {
        return Err(TransportError::configuration(format!(
            "{name} bounds must be finite, got ({min}, {max})"
        )));
    }
    if max <= min {
        return Err(TransportError::configuration(format!(
            "{name} bounds must be increasing, got ({min}, {max})"
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<(), TransportError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TransportError::configuration(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}
