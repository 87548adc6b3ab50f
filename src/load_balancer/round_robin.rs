//! Round-robin selection strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use crate::load_balancer::{Request, Selector};

/// Round-robin selector.
/// Stores an atomic cursor that rotates through `0..total`.
#[derive(Debug)]
pub struct RoundRobin {
    total: usize,
    cursor: AtomicUsize,
}

impl RoundRobin {
    /// Create a selector over `total` backends.
    ///
    /// A `total` of zero is treated as one so the cursor stays well-defined;
    /// the engine refuses to start with an empty backend list anyway.
    pub fn new(total: usize) -> Self {
        Self {
            total: total.max(1),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

impl Selector for RoundRobin {
    fn select(&self, _request: &dyn Request) -> usize {
        // Each cursor value is claimed by exactly one caller.
        let mut current = self.cursor.load(Ordering::Relaxed);
        loop {
            let next = (current + 1) % self.total;
            match self.cursor.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return current,
                Err(actual) => current = actual,
            }
        }
    }
}
