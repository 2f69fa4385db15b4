//! Per-media-kind stream lifecycle.
//!
//! ```text
//!  Stopped ──Started──▶ Started ──FrameReady──▶ Streaming ─┐
//!     ▲                    │                        ▲       │ FrameReady
//!     └──────Stopped───────┴────────Stopped─────────┴───────┘
//! ```
//!
//! `Stopped` is terminal for a session: a consumer that observes it must
//! reopen rather than keep waiting for frames.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    #[default]
    Stopped,
    Started,
    Streaming,
}

/// Signals that drive [`StreamState`] transitions, one per named event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSignal {
    Started,
    FrameReady,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("signal {signal:?} is not valid in state {state:?}")]
    InvalidTransition { state: StreamState, signal: StreamSignal },
}

impl StreamState {
    /// Applies `signal`, returning the next state.
    pub fn on(self, signal: StreamSignal) -> Result<StreamState, StateError> {
        use StreamSignal as S;
        use StreamState::*;
        match (self, signal) {
            (_, S::Stopped) => Ok(Stopped),
            (Stopped, S::Started) => Ok(Started),
            (Started | Streaming, S::FrameReady) => Ok(Streaming),
            // A repeated start on a live stream leaves it where it is.
            (Started, S::Started) => Ok(Started),
            (Streaming, S::Started) => Ok(Streaming),
            (Stopped, S::FrameReady) => Err(StateError::InvalidTransition { state: self, signal }),
        }
    }

    pub fn is_live(self) -> bool {
        matches!(self, StreamState::Started | StreamState::Streaming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_session_lifecycle() {
        // Arrange
        let state = StreamState::default();

        // Act
        let started = state.on(StreamSignal::Started).unwrap();
        let streaming = started.on(StreamSignal::FrameReady).unwrap();
        let still_streaming = streaming.on(StreamSignal::FrameReady).unwrap();
        let stopped = still_streaming.on(StreamSignal::Stopped).unwrap();

        // Assert
        assert_eq!(started, StreamState::Started);
        assert_eq!(streaming, StreamState::Streaming);
        assert_eq!(still_streaming, StreamState::Streaming);
        assert_eq!(stopped, StreamState::Stopped);
        assert!(!stopped.is_live());
    }

    #[test]
    fn test_frame_before_start_is_rejected() {
        let err = StreamState::Stopped.on(StreamSignal::FrameReady).unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidTransition {
                state: StreamState::Stopped,
                signal: StreamSignal::FrameReady
            }
        );
    }

    #[test]
    fn test_stop_is_accepted_from_every_state() {
        for state in [StreamState::Stopped, StreamState::Started, StreamState::Streaming] {
            assert_eq!(state.on(StreamSignal::Stopped), Ok(StreamState::Stopped));
        }
    }

    #[test]
    fn test_repeated_start_does_not_rewind_streaming() {
        assert_eq!(
            StreamState::Streaming.on(StreamSignal::Started),
            Ok(StreamState::Streaming)
        );
    }
}
