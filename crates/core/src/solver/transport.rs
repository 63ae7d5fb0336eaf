//! Explicit advection-diffusion stencil
//!
//! One forward-Euler step of
//! ```text
//! ∂c/∂t = -u ∂c/∂x - v ∂c/∂y - w ∂c/∂z + D∇²c
//! ```
//!
//! Advection uses a one-sided upwind difference against the lower-index
//! neighbour and is skipped on the lower face of each axis. Diffusion uses the
//! central second difference and is skipped on both faces of each axis. Every
//! neighbour read comes from the input field, so the output never depends on
//! the order in which cells are visited.

use crate::grid::ConcentrationGrid;
use rayon::prelude::*;

/// Inputs of one stencil pass
#[derive(Debug, Clone, Copy)]
pub struct StencilParams {
    /// Timestep
    pub dt: f64,
    pub u: f64,
    pub v: f64,
    pub w: f64,
    /// Diffusion coefficient
    pub diffusion: f64,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

/// Compute one transport step from `old` into `new`
///
/// `new` is fully overwritten. North-south planes are processed in parallel.
///
/// # Panics
///
/// Panics if the two grids have different dimensions
pub fn step_transport_cpu(
    old: &ConcentrationGrid,
    new: &mut ConcentrationGrid,
    params: StencilParams,
) {
    assert_eq!(old.dims(), new.dims(), "Grid dimensions differ");

    let dims = old.dims();
    let (nx, ny, nz) = (dims.nx, dims.ny, dims.nz);
    let plane_len = ny * nz;
    let src = old.as_slice();

    let StencilParams {
        dt,
        u,
        v,
        w,
        diffusion,
        dx,
        dy,
        dz,
    } = params;
    let dx2 = dx * dx;
    let dy2 = dy * dy;
    let dz2 = dz * dz;

    // Neighbour offsets in the flat buffer
    let di = plane_len;
    let dj = nz;

    new.as_mut_slice()
        .par_chunks_mut(plane_len)
        .enumerate()
        .for_each(|(i, plane)| {
            for j in 0..ny {
                for k in 0..nz {
                    let local = j * nz + k;
                    let idx = i * plane_len + local;
                    let centre = src[idx];
                    let mut c = centre;

                    // 1. Upwind advection
                    if i > 0 {
                        c -= dt * u * (c - src[idx - di]) / dx;
                    }
                    if j > 0 {
                        c -= dt * v * (c - src[idx - dj]) / dy;
                    }
                    if k > 0 {
                        c -= dt * w * (c - src[idx - 1]) / dz;
                    }

                    // 2. Diffusion on interior cells of each axis
                    if i > 0 && i + 1 < nx {
                        c += dt * diffusion * (src[idx + di] - 2.0 * centre + src[idx - di]) / dx2;
                    }
                    if j > 0 && j + 1 < ny {
                        c += dt * diffusion * (src[idx + dj] - 2.0 * centre + src[idx - dj]) / dy2;
                    }
                    if k > 0 && k + 1 < nz {
                        c += dt * diffusion * (src[idx + 1] - 2.0 * centre + src[idx - 1]) / dz2;
                    }

                    plane[local] = c;
                }
            }
        });
}
