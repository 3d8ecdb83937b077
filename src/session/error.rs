//! Session admission and runtime errors.

use thiserror::Error;

/// Errors raised when starting or driving a session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("State '{state}' is not part of this machine")]
    UnknownState { state: String },

    #[error("Cannot post '{label}': a transition is already executing")]
    TransitionInProgress { label: String },

    #[error("Cannot post '{label}': transition '{pending}' is already pending")]
    PendingTransitionExists { label: String, pending: String },

    #[error("No transition '{label}' from state '{from}'")]
    UnknownTransition { from: String, label: String },

    #[error("State '{state}' is already executing its entry action")]
    StateExecutionInProgress { state: String },

    #[error("Attempt to move state '{state}' to itself")]
    SelfTransition { state: String },

    #[error("Session is faulted and accepts no further transitions")]
    Faulted,

    #[error("Session has been disposed")]
    Disposed,

    #[error("Sessions must be started from within a tokio runtime")]
    NoRuntime,
}
