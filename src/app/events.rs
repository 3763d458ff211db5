//! Outbound application events.
//!
//! The [`InterlockService`](super::service::InterlockService) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on the
//! other side decide what to do with them: log to serial, record in a
//! test, etc.

use crate::control::bac::BacReading;
use crate::error::Error;
use crate::fsm::StateId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states (self-transitions included).
    StateChanged { from: StateId, to: StateId },

    /// A breath evaluation completed for the current episode.
    Evaluated { reading: BacReading, attempt: u8 },

    /// A recoverable runtime fault was logged and ignored.
    Fault(Error),
}
