//! Engine error definitions.

use thiserror::Error;

use crate::load_balancer::BackendError;

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `start` was called on an engine that is not in the `Created` state.
    #[error("engine already started")]
    AlreadyStarted,

    /// `stop` was called before `start`.
    #[error("engine not started")]
    NotStarted,

    /// `stop` was called on an engine that is stopping or stopped.
    #[error("engine already stopped")]
    AlreadyStopped,

    /// `start` was given an empty backend list.
    #[error("no backends to dispatch to")]
    NoBackends,

    /// `start` was called on an engine configured with zero workers.
    #[error("engine needs at least one worker")]
    NoWorkers,

    /// `start` was called outside a Tokio runtime.
    #[error("engine must be started from within a Tokio runtime")]
    NoRuntime,

    /// The selector returned an index outside the backend list.
    #[error("selector returned index {index} for {len} backends")]
    SelectorOutOfRange { index: usize, len: usize },

    /// A backend failed to process a request.
    #[error("worker failed processing request {request_id}")]
    WorkerFailed {
        request_id: String,
        #[source]
        source: BackendError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = EngineError::SelectorOutOfRange { index: 7, len: 3 };
        assert_eq!(err.to_string(), "selector returned index 7 for 3 backends");

        let err = EngineError::WorkerFailed {
            request_id: "req-1".to_string(),
            source: "backend exploded".into(),
        };
        assert_eq!(err.to_string(), "worker failed processing request req-1");
        assert_eq!(err.source().unwrap().to_string(), "backend exploded");
    }
}
