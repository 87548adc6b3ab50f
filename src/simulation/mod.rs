//! Simulation harness: stand-in requests, backends and a load producer.
//!
//! # Data Flow
//! ```text
//! DispatchConfig.simulation / .backends
//!     → backend.rs (SimulatedBackend list: latency + injected failures)
//!     → producer.rs (fixed-rate batches of SimulatedRequest into the queue)
//!     → Engine workers drain and dispatch
//! ```

pub mod backend;
pub mod producer;

pub use backend::{
    backend_key, backends_from_config, generate_backends, SimulatedBackend, SimulatedFailure,
    SimulatedRequest,
};
pub use producer::Producer;
