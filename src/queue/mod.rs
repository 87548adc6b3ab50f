//! Work queue subsystem.
//!
//! # Data Flow
//! ```text
//! Producer(s)
//!     → blocking.rs enqueue (append to tail, wake one consumer)
//!     → worker dequeue (wait until item available or queue closed)
//!
//! Shutdown:
//!     close() → reject new items
//!             → wake every waiting consumer
//!             → consumers drain remaining items, then observe None
//! ```
//!
//! # Design Decisions
//! - One lock guards items and the closed flag together
//! - Close is a drain barrier, not a kill switch
//! - Waiting consumers never spin; they park on a notifier

pub mod blocking;

pub use blocking::{BlockingQueue, QueueError};
