//! Thread-safe FIFO queue with blocking pop and graceful close.

use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::Notify;

/// Errors returned by queue operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The queue was closed before the item was offered.
    #[error("queue is closed")]
    Closed,
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A FIFO queue shared between producers and worker tasks.
///
/// `dequeue` waits while the queue is empty and open. After `close`, items
/// already in the queue remain deliverable; `dequeue` only returns `None`
/// once the queue is both closed and empty.
pub struct BlockingQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Notify,
}

impl<T> BlockingQueue<T> {
    /// Create an empty, open queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Notify::new(),
        }
    }

    /// Append an item to the tail and wake one waiting consumer.
    ///
    /// Never blocks. Fails with [`QueueError::Closed`] once the queue has been closed.
    pub fn enqueue(&self, item: T) -> Result<(), QueueError> {
        {
            let mut state = self.state.lock().expect("queue mutex poisoned");
            if state.closed {
                return Err(QueueError::Closed);
            }
            state.items.push_back(item);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Remove and return the head item, waiting while the queue is empty.
    ///
    /// Returns `None` only when the queue is closed and fully drained.
    pub async fn dequeue(&self) -> Option<T> {
        loop {
            // Register interest before inspecting state so a close or enqueue
            // that lands between the check and the await is not missed.
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().expect("queue mutex poisoned");
                if let Some(item) = state.items.pop_front() {
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Remove and return the head item without waiting.
    pub fn try_dequeue(&self) -> Option<T> {
        let mut state = self.state.lock().expect("queue mutex poisoned");
        state.items.pop_front()
    }

    /// Close the queue and wake every waiting consumer. Idempotent.
    pub fn close(&self) {
        let newly_closed = {
            let mut state = self.state.lock().expect("queue mutex poisoned");
            !std::mem::replace(&mut state.closed, true)
        };
        if newly_closed {
            tracing::debug!("Queue closed");
            self.available.notify_waiters();
        }
    }

    /// Point-in-time number of queued items.
    pub fn len(&self) -> usize {
        self.state.lock().expect("queue mutex poisoned").items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().expect("queue mutex poisoned").closed
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = BlockingQueue::new();
        for i in 0..100 {
            queue.enqueue(i).unwrap();
        }

        let mut got = Vec::new();
        while let Some(item) = queue.try_dequeue() {
            got.push(item);
        }
        assert_eq!(got, (0..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_drain_on_close() {
        let queue = BlockingQueue::new();
        for i in 0..5 {
            queue.enqueue(i).unwrap();
        }
        queue.close();

        for i in 0..5 {
            assert_eq!(queue.dequeue().await, Some(i));
        }
        // The sixth pop reports the queue as exhausted.
        assert_eq!(queue.dequeue().await, None);
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn test_enqueue_after_close_is_rejected() {
        let queue = BlockingQueue::new();
        queue.enqueue(1).unwrap();
        queue.close();

        assert_eq!(queue.enqueue(2), Err(QueueError::Closed));
        assert_eq!(queue.len(), 1);
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let queue: BlockingQueue<u32> = BlockingQueue::new();
        queue.close();
        queue.close();
        assert!(queue.is_closed());
        assert_eq!(queue.dequeue().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_close_wakes_waiting_consumers() {
        let queue: Arc<BlockingQueue<u32>> = Arc::new(BlockingQueue::new());

        let mut waiters = Vec::new();
        for _ in 0..8 {
            let q = queue.clone();
            waiters.push(tokio::spawn(async move { q.dequeue().await }));
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        queue.close();

        for waiter in waiters {
            let result = tokio::time::timeout(Duration::from_secs(2), waiter)
                .await
                .expect("consumer was not woken by close")
                .unwrap();
            assert_eq!(result, None);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waiting_consumer_receives_later_item() {
        let queue: Arc<BlockingQueue<&'static str>> = Arc::new(BlockingQueue::new());
        let q = queue.clone();
        let consumer = tokio::spawn(async move { q.dequeue().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.enqueue("late").unwrap();

        let got = tokio::time::timeout(Duration::from_secs(2), consumer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, Some("late"));
    }
}
