//! Build errors for the machine builder.

use thiserror::Error;

/// Configuration errors, raised before any session exists.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("State '{state}' is already declared")]
    DuplicateState { state: String },

    #[error("State '{state}' is not declared. Call .add_state(state) first")]
    UnknownState { state: String },

    #[error("Transition '{label}' from state '{from}' is already declared")]
    DuplicateTransition { from: String, label: String },

    #[error("Transition '{label}' from state '{from}' is not declared")]
    UnknownTransition { from: String, label: String },

    #[error("State '{state}' already has an entry action")]
    DuplicateEntryAction { state: String },

    #[error("Transition '{label}' from '{from}' targets undeclared state '{to}'")]
    DanglingTransition {
        from: String,
        label: String,
        to: String,
    },

    #[error("Transition '{label}' leads from state '{state}' back to itself")]
    SelfTransition { state: String, label: String },
}
