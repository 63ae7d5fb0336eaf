//! Ozone Transport Simulation Core Library
//!
//! Estimates pollutant (ozone) concentration over a bounded region of
//! atmosphere by solving the 3D advection-diffusion equation on a regular
//! grid, with emissions injected from line-shaped ground sources (roads)
//! whose strength varies over time.
//!
//! ## Components
//!
//! - [`EmissionProfile`]: source strength as a function of simulation time
//! - [`LineSource`]: road segment rasterized onto horizontal grid cells
//! - [`ConcentrationGrid`]: flat 3D concentration field
//! - [`TransportModel`]: owns the field and sources, advances time step by step
//! - [`config`]: section/value configuration files and scenario setup
//!
//! ## Example
//!
//! ```rust
//! use ozone_sim_core::{
//!     DomainBounds, GroundPoint, LineSource, ModelConfig, RushHourProfile, TransportModel,
//! };
//!
//! let config = ModelConfig::new(DomainBounds::new((0.0, 16900.0), (0.0, 20000.0)));
//! let mut model = TransportModel::new(config)?;
//! model.add_source(LineSource::new(
//!     GroundPoint::new(0.0, 10000.0),
//!     GroundPoint::new(16900.0, 10000.0),
//!     RushHourProfile::default(),
//! ))?;
//!
//! for _ in 0..24 {
//!     model.step(1.0)?;
//! }
//! assert!(model.total_mass() > 0.0);
//! # Ok::<(), ozone_sim_core::TransportError>(())
//! ```

// Core types and utilities
pub mod core_types;
pub mod emission;
pub mod error;

// Grid, solver and model
pub mod grid;
pub mod simulation;
pub mod solver;
pub mod source;

pub mod config;

// Re-export core types
pub use core_types::GroundPoint;
pub use emission::{ConstantRate, EmissionProfile, FnProfile, HourlyTable, RushHourProfile};
pub use error::{EmissionError, TransportError};

// Re-export grid and model types
pub use grid::{ConcentrationGrid, DomainBounds, GridDimensions, GridResolution};
pub use simulation::{ModelConfig, TransportModel};
pub use solver::{StabilityReport, TopBoundary, TransportParams};
pub use source::{CellIndex, LineSource, RoadNetwork};

pub use config::{ScenarioConfig, SectionMap};
