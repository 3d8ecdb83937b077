//! Compiled machines and their definitions.
//!
//! # Key Concepts
//!
//! - **Graph**: read-only mapping from state identity to state definition,
//!   shared by every session of a machine
//! - **Machine**: the graph plus a registry of live sessions
//! - **Callbacks**: entry actions, intercept actions and fault handlers are
//!   owned by the definitions and only ever invoked by sessions

mod definition;
mod machine;
mod registry;

pub use definition::{
    EntryAction, FaultHandler, Graph, InterceptAction, StateDefinition, TransitionDefinition,
};
pub use machine::Machine;

pub(crate) use definition::{entry_action, fault_handler, intercept_action};
pub(crate) use registry::SessionRegistry;
