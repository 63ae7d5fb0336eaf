//! Simulation driver around the transport grid

pub mod transport_model;

pub use transport_model::{ModelConfig, TransportModel};
