//! Simulated requests and backends.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::config::DispatchConfig;
use crate::load_balancer::{Backend, BackendError, Request};

const LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A request with a random v4 id.
#[derive(Debug, Clone)]
pub struct SimulatedRequest {
    id: String,
    key: String,
}

impl SimulatedRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            key: key.into(),
        }
    }
}

impl Request for SimulatedRequest {
    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.key
    }
}

/// Injected failure from a simulated backend.
#[derive(Debug, Error)]
#[error("simulated failure in backend {backend}")]
pub struct SimulatedFailure {
    pub backend: String,
}

/// A backend that sleeps for a fixed latency and fails at a configured rate.
#[derive(Debug)]
pub struct SimulatedBackend {
    id: String,
    key: String,
    latency: Duration,
    failure_rate: f64,
    processed: AtomicU64,
    failed: AtomicU64,
}

impl SimulatedBackend {
    pub fn new(id: impl Into<String>, key: impl Into<String>, latency: Duration, failure_rate: f64) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            latency,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Calls that completed successfully.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Calls that returned an injected failure.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Backend for SimulatedBackend {
    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.key
    }

    async fn process(&self, _request: &dyn Request) -> Result<(), BackendError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failure_rate > 0.0 && fastrand::f64() < self.failure_rate {
            self.failed.fetch_add(1, Ordering::Relaxed);
            return Err(Box::new(SimulatedFailure {
                backend: self.id.clone(),
            }));
        }

        self.processed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Three-letter base-26 key for backend `index`: 0 → "AAA", 1 → "AAB", 26 → "ABA".
pub fn backend_key(index: usize) -> String {
    let total = LETTERS.len();
    [
        LETTERS[index / (total * total) % total],
        LETTERS[index / total % total],
        LETTERS[index % total],
    ]
    .iter()
    .map(|&b| b as char)
    .collect()
}

/// Generate `count` backends with ids `"0"..` and base-26 keys.
pub fn generate_backends(count: usize, latency: Duration, failure_rate: f64) -> Vec<Arc<SimulatedBackend>> {
    (0..count)
        .map(|i| Arc::new(SimulatedBackend::new(i.to_string(), backend_key(i), latency, failure_rate)))
        .collect()
}

/// Build the backend list described by `config`.
///
/// Explicit `backends` entries win; otherwise `simulation.backend_count`
/// backends are generated.
pub fn backends_from_config(config: &DispatchConfig) -> Vec<Arc<SimulatedBackend>> {
    if config.backends.is_empty() {
        return generate_backends(
            config.simulation.backend_count,
            Duration::from_millis(config.simulation.latency_ms),
            config.simulation.failure_rate,
        );
    }

    config
        .backends
        .iter()
        .map(|b| {
            Arc::new(SimulatedBackend::new(
                b.id.clone(),
                b.key.clone(),
                Duration::from_millis(b.latency_ms),
                b.failure_rate,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;

    #[test]
    fn test_backend_keys() {
        assert_eq!(backend_key(0), "AAA");
        assert_eq!(backend_key(1), "AAB");
        assert_eq!(backend_key(25), "AAZ");
        assert_eq!(backend_key(26), "ABA");
        assert_eq!(backend_key(99), "ADV");
    }

    #[test]
    fn test_generate_backends() {
        let backends = generate_backends(3, Duration::ZERO, 0.0);
        let ids: Vec<&str> = backends.iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(backends[2].key(), "AAC");
    }

    #[test]
    fn test_explicit_backends_override_generated() {
        let mut config = DispatchConfig::default();
        config.backends.push(BackendConfig {
            id: "primary".to_string(),
            key: "PRI".to_string(),
            latency_ms: 5,
            failure_rate: 0.0,
        });

        let backends = backends_from_config(&config);
        assert_eq!(backends.len(), 1);
        assert_eq!(backends[0].id(), "primary");
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = SimulatedRequest::new("k");
        let b = SimulatedRequest::new("k");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.key(), "k");
    }

    #[tokio::test]
    async fn test_failure_rate_extremes() {
        let always = SimulatedBackend::new("x", "X", Duration::ZERO, 1.0);
        let never = SimulatedBackend::new("y", "Y", Duration::ZERO, 0.0);
        let request = SimulatedRequest::new("k");

        for _ in 0..10 {
            assert!(always.process(&request).await.is_err());
            assert!(never.process(&request).await.is_ok());
        }
        assert_eq!(always.failed(), 10);
        assert_eq!(never.processed(), 10);
    }
}
