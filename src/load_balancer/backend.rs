//! Capability contracts for requests and backends.
//!
//! # Responsibilities
//! - Describe what the engine needs from a unit of work (identity, routing key)
//! - Describe what the engine needs from a downstream processor
//!
//! The engine never inspects request payloads.

use async_trait::async_trait;

/// Error produced by a backend while processing a request.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// A unit of work flowing through the queue.
pub trait Request: Send + Sync {
    /// Stable identity, used in logs.
    fn id(&self) -> &str;
    /// Routing key.
    fn key(&self) -> &str;
}

/// A downstream processor requests are dispatched to.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stable identity, unique across the backend list for a run.
    /// Used as the metering registry key.
    fn id(&self) -> &str;

    /// Routing key.
    fn key(&self) -> &str;

    /// Process one request.
    async fn process(&self, request: &dyn Request) -> Result<(), BackendError>;
}
