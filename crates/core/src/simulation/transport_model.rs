//! Transport model: owns the concentration field, the registered sources and
//! the simulation clock
//!
//! One step:
//! 1. evaluate every source's emission profile at the current time
//! 2. run the advection-diffusion stencil from the stored field into the back buffer
//! 3. inject `rate * dt` into the ground cells covered by each source
//! 4. zero the top layer when the top boundary is open
//! 5. swap buffers and advance the clock
//!
//! Profiles are evaluated before anything is written, so a failing profile
//! leaves the stored field and the clock untouched.

use crate::error::TransportError;
use crate::grid::{ConcentrationGrid, DomainBounds, GridDimensions, GridResolution};
use crate::solver::{step_transport_cpu, StabilityReport, StencilParams, TransportParams};
use crate::source::{CellIndex, LineSource};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Everything needed to construct a [`TransportModel`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub bounds: DomainBounds,
    pub resolution: GridResolution,
    pub params: TransportParams,
}

impl ModelConfig {
    /// Configuration with default resolution and transport parameters
    pub fn new(bounds: DomainBounds) -> Self {
        Self {
            bounds,
            resolution: GridResolution::default(),
            params: TransportParams::default(),
        }
    }

    pub fn with_resolution(mut self, resolution: GridResolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_params(mut self, params: TransportParams) -> Self {
        self.params = params;
        self
    }
}

/// A source together with the grid cells it was rasterized to at registration
#[derive(Debug, Clone)]
struct RegisteredSource {
    source: LineSource,
    cells: Vec<CellIndex>,
}

impl RegisteredSource {
    fn label(&self, index: usize) -> String {
        match self.source.name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("source #{index}"),
        }
    }
}

/// Pollutant transport over a fixed 3D grid
#[derive(Debug)]
pub struct TransportModel {
    config: ModelConfig,
    dims: GridDimensions,

    // Ping-pong buffers: the stencil reads `grid` and writes `grid_back`
    grid: ConcentrationGrid,
    grid_back: ConcentrationGrid,

    sources: Vec<RegisteredSource>,
    current_time: f64,

    // Last timestep reported as unstable, to avoid repeating the warning
    warned_dt: Option<f64>,
}

impl TransportModel {
    /// Validate the configuration and allocate an all-zero field
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if a bound pair is not
    /// increasing, a cell size or the top altitude is not positive, or a
    /// transport coefficient is invalid.
    pub fn new(config: ModelConfig) -> Result<Self, TransportError> {
        let dims = GridDimensions::derive(&config.bounds, &config.resolution)?;
        config.params.validate()?;

        info!(
            "Transport model initialized: {}x{}x{} grid, dx={} dy={} dz={}, top boundary {:?}",
            dims.nx,
            dims.ny,
            dims.nz,
            config.resolution.dx,
            config.resolution.dy,
            config.resolution.dz,
            config.params.top_boundary
        );

        Ok(Self {
            config,
            dims,
            grid: ConcentrationGrid::new(dims),
            grid_back: ConcentrationGrid::new(dims),
            sources: Vec::new(),
            current_time: 0.0,
            warned_dt: None,
        })
    }

    /// Register a source; its grid cells are computed once, here
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if an endpoint is not finite
    /// or the segment is too long to rasterize at this resolution.
    pub fn add_source(&mut self, source: LineSource) -> Result<(), TransportError> {
        if !source.is_finite() {
            return Err(TransportError::configuration(format!(
                "source endpoints must be finite, got {:?} -> {:?}",
                source.start(),
                source.end()
            )));
        }

        let cells = source.rasterize(self.config.resolution.dx, self.config.resolution.dy)?;
        let inside = cells
            .iter()
            .filter(|&&(i, j)| self.dims.contains_horizontal(i, j))
            .count();

        let registered = RegisteredSource { source, cells };
        info!(
            "Registered {}: {} cells ({} inside grid), {}",
            registered.label(self.sources.len()),
            registered.cells.len(),
            inside,
            registered.source.profile().describe()
        );
        self.sources.push(registered);
        Ok(())
    }

    /// Replace the stored field, e.g. to set an initial condition
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if the field dimensions differ
    /// from the model's.
    pub fn load_initial_field(&mut self, field: ConcentrationGrid) -> Result<(), TransportError> {
        if field.dims() != self.dims {
            return Err(TransportError::configuration(format!(
                "initial field is {:?}, model grid is {:?}",
                field.dims(),
                self.dims
            )));
        }
        self.grid = field;
        Ok(())
    }

    /// Advance the simulation by `dt`
    ///
    /// # Errors
    ///
    /// - [`TransportError::Configuration`] if `dt` is negative or not finite
    /// - [`TransportError::SourceEvaluation`] if an emission profile fails or
    ///   returns a non-finite rate
    ///
    /// On error the stored field and the clock are unchanged.
    pub fn step(&mut self, dt: f64) -> Result<(), TransportError> {
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(TransportError::configuration(format!(
                "timestep must be finite and non-negative, got {dt}"
            )));
        }

        self.check_stability(dt);

        let rates = self.evaluate_rates()?;

        let resolution = self.config.resolution;
        let params = self.config.params;
        step_transport_cpu(
            &self.grid,
            &mut self.grid_back,
            StencilParams {
                dt,
                u: params.u,
                v: params.v,
                w: params.w,
                diffusion: params.diffusion,
                dx: resolution.dx,
                dy: resolution.dy,
                dz: resolution.dz,
            },
        );

        // Serialized so shared cells accumulate in registration order
        for (registered, rate) in self.sources.iter().zip(&rates) {
            let amount = rate * dt;
            for &(i, j) in &registered.cells {
                if self.dims.contains_horizontal(i, j) {
                    self.grid_back.add_to_ground(i as usize, j as usize, amount);
                }
            }
        }

        if params.top_boundary.is_open() {
            self.grid_back.clear_top_layer();
        }

        // Swap buffers
        std::mem::swap(&mut self.grid, &mut self.grid_back);
        self.current_time += dt;

        debug!(
            "Transport step: t={:.3}, dt={:.3}, sources={}, total mass={:.4}",
            self.current_time,
            dt,
            self.sources.len(),
            self.grid.total_mass()
        );
        Ok(())
    }

    /// Run `steps` steps of `dt`, returning the total mass after each one
    ///
    /// # Errors
    ///
    /// Stops at the first failing step and returns its error; the steps
    /// completed before it stay applied.
    pub fn step_many(&mut self, steps: usize, dt: f64) -> Result<Vec<f64>, TransportError> {
        let mut totals = Vec::with_capacity(steps);
        for _ in 0..steps {
            self.step(dt)?;
            totals.push(self.total_mass());
        }
        Ok(totals)
    }

    /// Sum of all cell values
    pub fn total_mass(&self) -> f64 {
        self.grid.total_mass()
    }

    /// Courant and diffusion numbers for a prospective timestep
    pub fn stability(&self, dt: f64) -> StabilityReport {
        StabilityReport::new(&self.config.params, &self.config.resolution, dt)
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn grid(&self) -> &ConcentrationGrid {
        &self.grid
    }

    /// Concentration at `(i, j, k)`, `None` outside the grid
    pub fn concentration(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        self.grid.get(i, j, k)
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    pub fn bounds(&self) -> &DomainBounds {
        &self.config.bounds
    }

    pub fn resolution(&self) -> &GridResolution {
        &self.config.resolution
    }

    pub fn params(&self) -> &TransportParams {
        &self.config.params
    }

    /// Registered sources and their cached cells, in registration order
    pub fn sources(&self) -> impl ExactSizeIterator<Item = (&LineSource, &[CellIndex])> {
        self.sources
            .iter()
            .map(|registered| (&registered.source, registered.cells.as_slice()))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    // ====== Private Methods ======

    /// Evaluate every profile at the current time (in parallel)
    fn evaluate_rates(&self) -> Result<Vec<f64>, TransportError> {
        let time = self.current_time;
        self.sources
            .par_iter()
            .enumerate()
            .map(|(index, registered)| {
                let rate = registered.source.profile().rate_at(time).map_err(|e| {
                    TransportError::SourceEvaluation {
                        source: registered.label(index),
                        message: e.to_string(),
                    }
                })?;
                if rate.is_finite() {
                    Ok(rate)
                } else {
                    Err(TransportError::SourceEvaluation {
                        source: registered.label(index),
                        message: format!("non-finite rate {rate} at t={time}"),
                    })
                }
            })
            .collect()
    }

    fn check_stability(&mut self, dt: f64) {
        let report = self.stability(dt);
        if report.is_stable() || self.warned_dt == Some(dt) {
            return;
        }
        warn!(
            "Timestep dt={} may be unstable: courant={:?}, diffusion={:?}, margin={:.3}",
            dt,
            report.courant,
            report.diffusion,
            report.positivity_margin()
        );
        self.warned_dt = Some(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::GroundPoint;
    use crate::emission::{ConstantRate, FnProfile};
    use crate::error::EmissionError;
    use crate::solver::TopBoundary;
    use approx::assert_relative_eq;

    fn small_config(params: TransportParams) -> ModelConfig {
        ModelConfig::new(DomainBounds::new((0.0, 4.0), (0.0, 3.0)).with_top_altitude(2.0))
            .with_resolution(GridResolution {
                dx: 1.0,
                dy: 1.0,
                dz: 1.0,
            })
            .with_params(params)
    }

    fn point_source(i: f64, j: f64, rate: f64) -> LineSource {
        let p = GroundPoint::new(i + 0.5, j + 0.5);
        LineSource::new(p, p, ConstantRate(rate))
    }

    #[test]
    fn test_dimensions_from_config() {
        let model = TransportModel::new(small_config(TransportParams::still_air())).unwrap();
        let dims = model.dimensions();
        assert_eq!((dims.nx, dims.ny, dims.nz), (5, 4, 3));
        assert_eq!(model.current_time(), 0.0);
        assert_eq!(model.total_mass(), 0.0);
    }

    #[test]
    fn test_rejects_bad_config() {
        let mut config = small_config(TransportParams::still_air());
        config.resolution.dz = 0.0;
        assert!(matches!(
            TransportModel::new(config),
            Err(TransportError::Configuration(_))
        ));
    }

    #[test]
    fn test_single_emission_step() {
        let mut model = TransportModel::new(small_config(TransportParams::still_air())).unwrap();
        model.add_source(point_source(2.0, 1.0, 3.0)).unwrap();
        model.step(0.5).unwrap();

        assert_eq!(model.concentration(2, 1, 0), Some(1.5));
        assert_eq!(model.total_mass(), 1.5);
        assert_eq!(model.current_time(), 0.5);
    }

    #[test]
    fn test_sources_sharing_cell_accumulate() {
        let mut model = TransportModel::new(small_config(TransportParams::still_air())).unwrap();
        model.add_source(point_source(1.0, 1.0, 1.0)).unwrap();
        model.add_source(point_source(1.0, 1.0, 2.0)).unwrap();
        model.step(1.0).unwrap();
        assert_eq!(model.concentration(1, 1, 0), Some(3.0));
    }

    #[test]
    fn test_out_of_grid_cells_are_skipped() {
        let mut model = TransportModel::new(small_config(TransportParams::still_air())).unwrap();
        let road = LineSource::new(
            GroundPoint::new(-2.5, 0.5),
            GroundPoint::new(1.5, 0.5),
            ConstantRate(1.0),
        );
        model.add_source(road).unwrap();

        let (_, cells) = model.sources().next().unwrap();
        assert!(cells.contains(&(-1, 0)));

        model.step(1.0).unwrap();
        // Only (0, 0) and (1, 0) are inside
        assert_eq!(model.total_mass(), 2.0);
    }

    #[test]
    fn test_emission_uses_time_before_advance() {
        let mut model = TransportModel::new(small_config(TransportParams::still_air())).unwrap();
        let ramp = FnProfile::new("ramp", |t: f64| Ok(t + 1.0));
        model
            .add_source(LineSource::new(
                GroundPoint::new(0.5, 0.5),
                GroundPoint::new(0.5, 0.5),
                ramp,
            ))
            .unwrap();

        model.step(2.0).unwrap(); // rate(0) = 1
        model.step(2.0).unwrap(); // rate(2) = 3
        assert_eq!(model.concentration(0, 0, 0), Some(2.0 + 6.0));
        assert_eq!(model.current_time(), 4.0);
    }

    #[test]
    fn test_open_top_is_zeroed() {
        let params = TransportParams {
            top_boundary: TopBoundary::Open,
            ..TransportParams::still_air()
        };
        let mut model = TransportModel::new(small_config(params)).unwrap();
        model
            .load_initial_field(ConcentrationGrid::with_value(model.dimensions(), 1.0))
            .unwrap();
        model.step(1.0).unwrap();

        let dims = model.dimensions();
        for i in 0..dims.nx {
            for j in 0..dims.ny {
                assert_eq!(model.concentration(i, j, dims.nz - 1), Some(0.0));
                assert_eq!(model.concentration(i, j, 0), Some(1.0));
            }
        }
    }

    #[test]
    fn test_failed_step_leaves_state_untouched() {
        let mut model = TransportModel::new(small_config(TransportParams::still_air())).unwrap();
        let flaky = FnProfile::new("flaky", |t: f64| {
            if t >= 1.0 {
                Err(EmissionError::new("no data after t=1"))
            } else {
                Ok(1.0)
            }
        });
        model
            .add_source(
                LineSource::new(GroundPoint::new(0.5, 0.5), GroundPoint::new(0.5, 0.5), flaky)
                    .named("flaky road"),
            )
            .unwrap();

        model.step(1.0).unwrap();
        let before = model.grid().clone();

        let err = model.step(1.0).unwrap_err();
        assert_eq!(
            err,
            TransportError::SourceEvaluation {
                source: "flaky road".to_string(),
                message: "no data after t=1".to_string(),
            }
        );
        assert_eq!(model.grid(), &before);
        assert_eq!(model.current_time(), 1.0);
    }

    #[test]
    fn test_non_finite_rate_is_an_error() {
        let mut model = TransportModel::new(small_config(TransportParams::still_air())).unwrap();
        model.add_source(point_source(0.0, 0.0, f64::NAN)).unwrap();
        let err = model.step(1.0).unwrap_err();
        assert!(matches!(err, TransportError::SourceEvaluation { source, .. } if source == "source #0"));
    }

    #[test]
    fn test_rejects_invalid_timestep() {
        let mut model = TransportModel::new(small_config(TransportParams::still_air())).unwrap();
        assert!(model.step(-1.0).is_err());
        assert!(model.step(f64::NAN).is_err());
        assert_eq!(model.current_time(), 0.0);
    }

    #[test]
    fn test_rejects_non_finite_source() {
        let mut model = TransportModel::new(small_config(TransportParams::still_air())).unwrap();
        let road = LineSource::new(
            GroundPoint::new(f64::INFINITY, 0.0),
            GroundPoint::new(0.0, 0.0),
            ConstantRate(1.0),
        );
        assert!(model.add_source(road).is_err());
        assert_eq!(model.source_count(), 0);
    }

    #[test]
    fn test_rejects_source_too_long_to_rasterize() {
        let mut model = TransportModel::new(small_config(TransportParams::still_air())).unwrap();
        let road = LineSource::new(
            GroundPoint::new(0.0, 0.0),
            GroundPoint::new(1e300, 0.0),
            ConstantRate(1.0),
        );
        assert!(matches!(
            model.add_source(road),
            Err(TransportError::Configuration(_))
        ));
        assert_eq!(model.source_count(), 0);
    }

    #[test]
    fn test_rejects_grid_with_overflowing_cell_count() {
        let config = ModelConfig::new(DomainBounds::new((0.0, 1e300), (0.0, 10.0)))
            .with_resolution(GridResolution {
                dx: 1e-300,
                dy: 1.0,
                dz: 100.0,
            });
        assert!(matches!(
            TransportModel::new(config),
            Err(TransportError::Configuration(_))
        ));
    }

    #[test]
    fn test_initial_field_dimension_check() {
        let mut model = TransportModel::new(small_config(TransportParams::still_air())).unwrap();
        let wrong = ConcentrationGrid::new(GridDimensions { nx: 1, ny: 1, nz: 1 });
        assert!(model.load_initial_field(wrong).is_err());
    }

    #[test]
    fn test_step_many_series() {
        let mut model = TransportModel::new(small_config(TransportParams::still_air())).unwrap();
        model.add_source(point_source(1.0, 1.0, 2.0)).unwrap();
        let totals = model.step_many(3, 0.5).unwrap();
        assert_eq!(totals.len(), 3);
        assert_relative_eq!(totals[0], 1.0);
        assert_relative_eq!(totals[2], 3.0);
    }
}
