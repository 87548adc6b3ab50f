//! Shared backends and requests for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use dispatch_engine::{Backend, BackendError, BoxedRequest, Request};

/// Request with a caller-chosen id.
pub struct TestRequest {
    pub id: String,
    pub key: String,
}

impl TestRequest {
    pub fn boxed(id: impl Into<String>) -> BoxedRequest {
        let id = id.into();
        Box::new(TestRequest {
            key: format!("key{}", id),
            id,
        })
    }
}

impl Request for TestRequest {
    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.key
    }
}

/// Backend that records every request id it is handed.
pub struct RecordingBackend {
    id: String,
    latency: Duration,
    received: Mutex<Vec<String>>,
}

impl RecordingBackend {
    pub fn new(id: impl Into<String>, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            latency,
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.id
    }

    async fn process(&self, request: &dyn Request) -> Result<(), BackendError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.received.lock().unwrap().push(request.id().to_string());
        Ok(())
    }
}

/// Backend that fails every call and counts attempts.
pub struct FailingBackend {
    id: String,
    attempts: AtomicUsize,
}

impl FailingBackend {
    pub fn new(id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for FailingBackend {
    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.id
    }

    async fn process(&self, request: &dyn Request) -> Result<(), BackendError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(format!("backend {} refused {}", self.id, request.id()).into())
    }
}

/// Upcast a list of concrete backends for `Engine::start`.
pub fn as_dyn<B: Backend + 'static>(backends: &[Arc<B>]) -> Vec<Arc<dyn Backend>> {
    backends.iter().map(|b| b.clone() as Arc<dyn Backend>).collect()
}
