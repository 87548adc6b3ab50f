//! Engine lifecycle state machine.
//!
//! # State Transitions
//! ```text
//! Created → Running:  start()
//! Running → Stopping: stop() begins (signal, close queue, stop metering)
//! Stopping → Stopped: every worker has exited
//! ```
//!
//! Any other transition is a usage error.

/// Engine lifecycle state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Created = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl From<u8> for EngineState {
    fn from(val: u8) -> Self {
        match val {
            1 => EngineState::Running,
            2 => EngineState::Stopping,
            3 => EngineState::Stopped,
            _ => EngineState::Created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8_round_trip() {
        for state in [
            EngineState::Created,
            EngineState::Running,
            EngineState::Stopping,
            EngineState::Stopped,
        ] {
            assert_eq!(EngineState::from(state as u8), state);
        }
        assert_eq!(EngineState::from(42), EngineState::Created);
    }
}
