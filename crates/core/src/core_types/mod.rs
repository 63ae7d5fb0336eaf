//! Core types and utilities

pub mod point;

pub use point::GroundPoint;
