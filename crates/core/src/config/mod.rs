//! Configuration files and scenario setup
//!
//! [`parse_sections`] reads the raw section/value text format;
//! [`ScenarioConfig`] turns those sections into a wired [`TransportModel`](crate::TransportModel).

pub mod scenario;
pub mod sections;

pub use scenario::{EmissionSpec, RoadSpec, ScenarioConfig};
pub use sections::{load_sections, parse_sections, ConfigValue, SectionMap};
