//! 3D concentration field stored as a flat buffer
//!
//! Cells are addressed by `(i, j, k)` with `i` along north-south, `j` along
//! west-east and `k` vertical (`k = 0` is ground level). The buffer is laid
//! out with `k` innermost: `index = (i * ny + j) * nz + k`, so a vertical
//! column is a contiguous slice and a north-south plane is a contiguous chunk
//! of `ny * nz` values.

use super::domain::GridDimensions;
use serde::{Deserialize, Serialize};

/// Scalar concentration per grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationGrid {
    dims: GridDimensions,
    /// Cell values in `(i * ny + j) * nz + k` order
    data: Vec<f64>,
}

impl ConcentrationGrid {
    /// Create a grid with every cell set to zero
    pub fn new(dims: GridDimensions) -> Self {
        Self::with_value(dims, 0.0)
    }

    /// Create a grid with every cell set to `value`
    pub fn with_value(dims: GridDimensions, value: f64) -> Self {
        Self {
            dims,
            data: vec![value; dims.cell_count()],
        }
    }

    pub fn dims(&self) -> GridDimensions {
        self.dims
    }

    /// Flat buffer index of `(i, j, k)`
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.dims.ny + j) * self.dims.nz + k
    }

    #[inline]
    fn in_bounds(&self, i: usize, j: usize, k: usize) -> bool {
        i < self.dims.nx && j < self.dims.ny && k < self.dims.nz
    }

    /// Value at grid indices (bounds-checked)
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        if self.in_bounds(i, j, k) {
            Some(self.data[self.index(i, j, k)])
        } else {
            None
        }
    }

    /// Set value at grid indices
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f64) {
        assert!(self.in_bounds(i, j, k), "Coordinates out of bounds");
        let idx = self.index(i, j, k);
        self.data[idx] = value;
    }

    /// Add `amount` to the ground cell `(i, j, 0)`
    ///
    /// # Panics
    ///
    /// Panics if `(i, j)` is out of bounds
    pub fn add_to_ground(&mut self, i: usize, j: usize, amount: f64) {
        assert!(self.in_bounds(i, j, 0), "Coordinates out of bounds");
        let idx = self.index(i, j, 0);
        self.data[idx] += amount;
    }

    /// Force every cell of the top layer (`k = nz - 1`) to exactly zero
    pub fn clear_top_layer(&mut self) {
        let nz = self.dims.nz;
        for column in self.data.chunks_exact_mut(nz) {
            column[nz - 1] = 0.0;
        }
    }

    /// Vertical column at `(i, j)`, ground first
    pub fn column(&self, i: usize, j: usize) -> Option<&[f64]> {
        if self.in_bounds(i, j, 0) {
            let start = self.index(i, j, 0);
            Some(&self.data[start..start + self.dims.nz])
        } else {
            None
        }
    }

    /// Ground-level values in `i * ny + j` order
    pub fn ground_layer(&self) -> Vec<f64> {
        self.data
            .chunks_exact(self.dims.nz)
            .map(|column| column[0])
            .collect()
    }

    /// Sum of all cell values
    pub fn total_mass(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Largest cell value
    pub fn max_value(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}
