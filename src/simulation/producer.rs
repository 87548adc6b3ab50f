//! Fixed-rate request producer.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

use crate::engine::BoxedRequest;
use crate::lifecycle::Shutdown;
use crate::queue::BlockingQueue;
use crate::simulation::backend::SimulatedRequest;

/// Enqueues `requests_per_second` requests once per second for `duration`.
pub struct Producer {
    queue: Arc<BlockingQueue<BoxedRequest>>,
    requests_per_second: u64,
    duration: Duration,
    shutdown: Shutdown,
}

impl Producer {
    pub fn new(
        queue: Arc<BlockingQueue<BoxedRequest>>,
        requests_per_second: u64,
        duration: Duration,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            queue,
            requests_per_second,
            duration,
            shutdown,
        }
    }

    /// Run until the duration elapses, shutdown fires, or the queue closes.
    /// Returns the number of requests enqueued.
    pub async fn run(self) -> u64 {
        let batches = self.duration.as_secs();
        let mut shutdown = self.shutdown.subscribe();
        let mut ticker = time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut enqueued = 0u64;

        tracing::info!(
            requests_per_second = self.requests_per_second,
            duration_secs = batches,
            "Producer starting"
        );

        'batches: for batch in 0..batches {
            if self.shutdown.is_triggered() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => break,
            }

            for i in 1..=self.requests_per_second {
                let request = SimulatedRequest::new(format!("key{}", i));
                if self.queue.enqueue(Box::new(request)).is_err() {
                    tracing::warn!(enqueued, "Queue closed, producer stopping");
                    break 'batches;
                }
                enqueued += 1;
            }

            tracing::debug!(batch, count = self.requests_per_second, queue_length = self.queue.len(), "Enqueued batch");
        }

        tracing::info!(enqueued, "Producer finished");
        enqueued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_produces_one_batch_per_second() {
        let queue = Arc::new(BlockingQueue::new());
        let producer = Producer::new(queue.clone(), 25, Duration::from_secs(2), Shutdown::new());

        let enqueued = producer.run().await;
        assert_eq!(enqueued, 50);
        assert_eq!(queue.len(), 50);
    }

    #[tokio::test]
    async fn test_stops_when_queue_closed() {
        let queue = Arc::new(BlockingQueue::new());
        queue.close();
        let producer = Producer::new(queue.clone(), 10, Duration::from_secs(5), Shutdown::new());

        assert_eq!(producer.run().await, 0);
    }

    #[tokio::test]
    async fn test_stops_on_shutdown() {
        let queue = Arc::new(BlockingQueue::new());
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let producer = Producer::new(queue.clone(), 10, Duration::from_secs(60), shutdown);

        assert_eq!(producer.run().await, 0);
        assert!(queue.is_empty());
    }
}
