//! Statecraft: an embeddable async finite state machine runtime
//!
//! A machine is declared once with a [`MachineBuilder`], compiled into an
//! immutable [`Machine`], and then drives any number of independent
//! [`Session`]s concurrently.
//!
//! # Core Concepts
//!
//! - **Symbol**: opaque, comparable identity for states and transition labels
//! - **Entry action**: async callback run when a state becomes current
//! - **Intercept action**: async callback run while a transition is in flight;
//!   failures are discarded
//! - **Fault handler**: settles a failed entry action, resolved from the state
//!   first and from the machine second
//! - **Admission**: [`Session::post`] starts a transition at once, defers it
//!   until the running entry action finishes, or rejects it
//!
//! # Example
//!
//! ```rust
//! use statecraft::prelude::*;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! symbol_enum! {
//!     enum Numbered {
//!         One,
//!         Two,
//!     }
//! }
//!
//! symbol_enum! {
//!     enum Step {
//!         Next,
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let reached = Arc::new(AtomicBool::new(false));
//! let flag = Arc::clone(&reached);
//!
//! let mut builder = MachineBuilder::<Numbered, Step, ()>::new();
//! builder
//!     .add_state(Numbered::One)?
//!     .add_state(Numbered::Two)?
//!     .add_transition(Numbered::One, Step::Next, Numbered::Two)?
//!     .on_enter(Numbered::Two, move |_session| {
//!         let flag = Arc::clone(&flag);
//!         async move {
//!             flag.store(true, Ordering::SeqCst);
//!             Ok(())
//!         }
//!     })?;
//!
//! let machine = builder.compile()?;
//! let session = machine.start(Numbered::One, ())?;
//! session.post(Step::Next)?;
//! # while !reached.load(Ordering::SeqCst) {
//! #     tokio::task::yield_now().await;
//! # }
//! # assert_eq!(session.current_state(), Numbered::Two);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod core;
pub mod runtime;
pub mod session;

pub use builder::{BuildError, MachineBuilder};
pub use crate::core::Symbol;
pub use runtime::Machine;
pub use session::{Lifecycle, Phase, Session, SessionError, SessionSnapshot, TransitionContext};

/// Everything needed to declare and drive a machine.
pub mod prelude {
    pub use crate::builder::{BuildError, MachineBuilder};
    pub use crate::core::Symbol;
    pub use crate::runtime::Machine;
    pub use crate::session::{Lifecycle, Phase, Session, SessionError, TransitionContext};
    pub use crate::symbol_enum;
}
