//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → periodic tasks stop; the engine then closes the queue
//!               → workers drain the closed queue and exit
//!
//! Signals (signals.rs):
//!     SIGINT → trigger graceful engine stop
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop dispatch, close queue, stop metering, join workers
//! - Stop never cancels an in-flight backend call

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
