//! Builder API for declaring machines.
//!
//! A [`MachineBuilder`] collects states, transitions and callbacks and
//! rejects duplicates as soon as they are declared. Compiling checks the
//! graph as a whole and yields an immutable [`Machine`](crate::runtime::Machine).

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::MachineBuilder;
