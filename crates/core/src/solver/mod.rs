//! Transport solver: equation parameters, the stencil pass and stability checks
//!
//! The stencil runs on the CPU with Rayon; each north-south plane of the
//! output is written by one task and every read goes to the previous field,
//! so no synchronisation is needed beyond the final buffer swap.

mod params;
mod stability;
mod transport;

// Re-exports
pub use params::{TopBoundary, TransportParams};
pub use stability::StabilityReport;
pub use transport::{step_transport_cpu, StencilParams};
