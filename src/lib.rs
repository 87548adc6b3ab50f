//! Request dispatch engine library.
//!
//! A bounded pool of workers drains a shared queue and routes each request to
//! one of several backends chosen by a pluggable selector, while per-backend
//! throughput is tracked with exponential moving averages.

pub mod config;
pub mod engine;
pub mod lifecycle;
pub mod load_balancer;
pub mod metering;
pub mod observability;
pub mod queue;
pub mod simulation;

pub use config::DispatchConfig;
pub use engine::{BoxedRequest, Engine, EngineError, EngineState};
pub use lifecycle::Shutdown;
pub use load_balancer::{Backend, BackendError, Request, RoundRobin, Selector};
pub use metering::{RateMeter, ReportRegistry};
pub use queue::{BlockingQueue, QueueError};
