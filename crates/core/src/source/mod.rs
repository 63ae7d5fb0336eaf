//! Line-shaped emission sources

pub mod line_source;
pub mod road_network;

pub use line_source::{CellIndex, LineSource, MAX_RASTER_STEPS};
pub use road_network::RoadNetwork;
