//! Grid geometry and the concentration field

pub mod concentration_grid;
pub mod domain;

// Re-export main types
pub use concentration_grid::ConcentrationGrid;
pub use domain::{DomainBounds, GridDimensions, GridResolution, MAX_CELLS};
