//! Backend selection subsystem.
//!
//! # Data Flow
//! ```text
//! Worker dequeues request
//!     → Selector::select(request) → backend index
//!     → backend.rs (Backend capability at that index)
//!     → Backend::process(request)
//! ```
//!
//! # Design Decisions
//! - Backends are a fixed, ordered list for the lifetime of a run
//! - Selectors return indices, so index stability is required
//! - Selectors are shared by all workers; any state is atomic, never locked

pub mod backend;
pub mod round_robin;

pub use backend::{Backend, BackendError, Request};
pub use round_robin::RoundRobin;

/// Strategy that maps an incoming request to a backend index.
///
/// Implementations must be safe under concurrent calls from every worker and
/// must return an index in `0..backend_count`.
pub trait Selector: Send + Sync + std::fmt::Debug {
    fn select(&self, request: &dyn Request) -> usize;
}
