//! The per-session admission state machine.
//!
//! Every flag check and mutation happens on [`AdmissionCore`] while the
//! session's lock is held. Callbacks never run under that lock.

use crate::core::Symbol;
use crate::runtime::{StateDefinition, TransitionDefinition};
use crate::session::error::SessionError;
use crate::session::lifecycle::{Lifecycle, Phase};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a successful admission decision.
pub(crate) enum Admitted<S, L, P> {
    /// The transition owns the session now and must be executed.
    Start(Arc<TransitionDefinition<S, L, P>>),
    /// An entry action is running; the label waits in the pending slot.
    Deferred,
}

/// Mutable fields of a session guarded by its admission lock.
pub(crate) struct AdmissionCore<S, L, P> {
    current: Arc<StateDefinition<S, L, P>>,
    lifecycle: Lifecycle,
    in_transition: bool,
    in_state: bool,
    pending: Option<L>,
    disposed: bool,
    state_entered: Instant,
}

impl<S: Symbol, L: Symbol, P> AdmissionCore<S, L, P> {
    pub(crate) fn new(current: Arc<StateDefinition<S, L, P>>) -> Self {
        Self {
            current,
            lifecycle: Lifecycle::Running,
            in_transition: false,
            in_state: false,
            pending: None,
            disposed: false,
            state_entered: Instant::now(),
        }
    }

    pub(crate) fn current(&self) -> &Arc<StateDefinition<S, L, P>> {
        &self.current
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub(crate) fn pending(&self) -> Option<&L> {
        self.pending.as_ref()
    }

    pub(crate) fn state_entered(&self) -> Instant {
        self.state_entered
    }

    pub(crate) fn phase(&self) -> Phase {
        if self.in_transition {
            Phase::InTransition
        } else if self.in_state {
            Phase::InState
        } else {
            Phase::Idle
        }
    }

    /// Decide whether `label` starts now, waits for the running entry action,
    /// or is rejected. Rejections leave every field untouched.
    pub(crate) fn admit(&mut self, label: L) -> Result<Admitted<S, L, P>, SessionError> {
        if self.disposed {
            return Err(SessionError::Disposed);
        }
        if self.lifecycle == Lifecycle::Error {
            return Err(SessionError::Faulted);
        }
        if self.in_transition {
            return Err(SessionError::TransitionInProgress {
                label: label.name().to_string(),
            });
        }
        if let Some(pending) = &self.pending {
            return Err(SessionError::PendingTransitionExists {
                label: label.name().to_string(),
                pending: pending.name().to_string(),
            });
        }

        let transition = self.current.transition(&label).cloned().ok_or_else(|| {
            SessionError::UnknownTransition {
                from: self.current.id().name().to_string(),
                label: label.name().to_string(),
            }
        })?;

        if self.in_state {
            self.pending = Some(label);
            return Ok(Admitted::Deferred);
        }

        self.in_transition = true;
        Ok(Admitted::Start(transition))
    }

    /// Mark an entry action as running.
    pub(crate) fn begin_state_operation(&mut self) -> Result<(), SessionError> {
        if self.in_state {
            return Err(SessionError::StateExecutionInProgress {
                state: self.current.id().name().to_string(),
            });
        }
        self.in_state = true;
        Ok(())
    }

    /// Make `target` current and hand the session from the transition over to
    /// the target's entry phase in one step, so no post can slip in between.
    pub(crate) fn enter(&mut self, target: Arc<StateDefinition<S, L, P>>) -> Result<(), SessionError> {
        if target.id() == self.current.id() {
            return Err(SessionError::SelfTransition {
                state: target.id().name().to_string(),
            });
        }
        if self.in_state {
            return Err(SessionError::StateExecutionInProgress {
                state: self.current.id().name().to_string(),
            });
        }

        self.current = target;
        self.state_entered = Instant::now();
        self.in_transition = false;
        self.in_state = true;
        Ok(())
    }

    /// Release a transition that could not reach its target.
    pub(crate) fn abort_transition(&mut self) {
        self.in_transition = false;
        self.lifecycle = Lifecycle::Error;
    }

    /// Leave the entry phase, handing back any deferred label.
    pub(crate) fn end_state_operation(&mut self) -> Option<L> {
        self.in_state = false;
        self.pending.take()
    }

    pub(crate) fn fault(&mut self) {
        self.lifecycle = Lifecycle::Error;
    }

    /// Returns `false` when the session was already disposed.
    pub(crate) fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        if self.lifecycle == Lifecycle::Running {
            self.lifecycle = Lifecycle::Stopped;
        }
        true
    }
}
