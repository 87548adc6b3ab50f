//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine, workers, metering registry produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → stdout log stream
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (backend, request_id, worker) on every dispatch event
//! - Metrics are cheap (atomic increments behind the facade)

pub mod logging;
pub mod metrics;
