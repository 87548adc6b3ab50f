//! Dispatch engine subsystem.
//!
//! # Data Flow
//! ```text
//! Engine::start(queue, backends)
//!     → register every backend with the metering registry
//!     → spawn rate meter driver and coarse reporter
//!     → spawn max_workers worker loops (worker.rs)
//!
//! worker loop:
//!     queue.dequeue() → selector.select() → registry.increment()
//!         → backend.process() → log failure, continue
//!
//! Engine::stop()
//!     → Running → Stopping (state.rs)
//!     → signal workers, close queue, stop metering
//!     → join workers (remaining items drained) → Stopped
//! ```
//!
//! # Design Decisions
//! - Workers are Tokio tasks; they only suspend in dequeue or in a backend call
//! - Lifecycle misuse is a typed error, never a panic
//! - In-flight backend calls are never cancelled by stop

pub mod error;
pub mod pool;
pub mod state;
pub mod worker;

pub use error::EngineError;
pub use pool::Engine;
pub use state::EngineState;
pub use worker::{BoxedRequest, Worker};
