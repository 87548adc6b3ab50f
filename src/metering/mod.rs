//! Throughput metering subsystem.
//!
//! # Data Flow
//! ```text
//! Worker dispatches to backend
//!     → registry.rs increment(backend id)
//!     → rate_meter.rs update(1) (atomic add, lock-free)
//!
//! Meter driver (every tick interval):
//!     → rate_meter.rs tick() (swap accumulator, smooth into EMA)
//!
//! Engine reporter (every report interval):
//!     → registry.rs report() → log lines + rate gauges
//! ```
//!
//! # Design Decisions
//! - Reads of the published rate never take a lock
//! - The tick cadence is independent of the engine's report cadence
//! - Meters live in a sharded concurrent map so register, increment and
//!   iteration do not contend on one global lock

pub mod rate_meter;
pub mod registry;

pub use rate_meter::{alpha_for_window, RateMeter};
pub use registry::{MeterSnapshot, ReportRegistry};
