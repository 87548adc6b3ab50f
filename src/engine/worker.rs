//! Worker loop.
//!
//! # Responsibilities
//! - Pull requests off the shared queue
//! - Ask the selector for a backend and record the dispatch
//! - Run the backend call to completion, logging failures
//!
//! # Design Decisions
//! - A failed backend call never ends the loop
//! - Dispatches are counted at selection time, not on completion
//! - The queue is the only exit signal: a worker returns once it is closed and drained

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::engine::error::EngineError;
use crate::load_balancer::{Backend, Request, Selector};
use crate::metering::ReportRegistry;
use crate::observability::metrics;
use crate::queue::BlockingQueue;

/// A request as it travels through the queue.
pub type BoxedRequest = Box<dyn Request>;

/// State shared by every worker of one engine run.
pub(crate) struct DispatchContext {
    pub queue: Arc<BlockingQueue<BoxedRequest>>,
    pub backends: Vec<Arc<dyn Backend>>,
    pub selector: Arc<dyn Selector>,
    pub registry: Arc<ReportRegistry>,
    pub active: Arc<AtomicUsize>,
}

/// A numbered worker identity.
#[derive(Debug, Clone, Copy)]
pub struct Worker {
    id: usize,
}

impl Worker {
    pub fn new(id: usize) -> Self {
        Self { id }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Run one request through `backend`.
    pub async fn perform(
        &self,
        request: &dyn Request,
        backend: &dyn Backend,
    ) -> Result<(), EngineError> {
        if let Err(e) = backend.process(request).await {
            tracing::warn!(
                worker = self.id,
                request_id = %request.id(),
                backend = %backend.id(),
                error = %e,
                "Error processing request"
            );
            return Err(EngineError::WorkerFailed {
                request_id: request.id().to_string(),
                source: e,
            });
        }
        Ok(())
    }

    pub(crate) async fn run(self, ctx: Arc<DispatchContext>) {
        let active = ctx.active.fetch_add(1, Ordering::AcqRel) + 1;
        metrics::record_active_workers(active);
        tracing::trace!(worker = self.id, "Worker started");

        while let Some(request) = ctx.queue.dequeue().await {
            self.dispatch(&ctx, request).await;
        }

        let active = ctx.active.fetch_sub(1, Ordering::AcqRel) - 1;
        metrics::record_active_workers(active);
        tracing::trace!(worker = self.id, "Worker exiting");
    }

    async fn dispatch(&self, ctx: &DispatchContext, request: BoxedRequest) {
        let index = ctx.selector.select(request.as_ref());
        let Some(backend) = ctx.backends.get(index) else {
            let err = EngineError::SelectorOutOfRange {
                index,
                len: ctx.backends.len(),
            };
            tracing::error!(worker = self.id, request_id = %request.id(), error = %err, "Dropping request");
            metrics::record_dispatch_failure("unassigned");
            return;
        };

        ctx.registry.increment(backend.id());
        metrics::record_dispatch(backend.id());

        if self.perform(request.as_ref(), backend.as_ref()).await.is_err() {
            metrics::record_dispatch_failure(backend.id());
        }
    }
}
