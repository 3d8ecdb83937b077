//! Context handed to intercept actions.

use std::sync::Arc;

/// Per-invocation view of a transition in flight.
///
/// Intercept actions see where the session is coming from, where it is going
/// and the session payload, but never the session itself.
pub struct TransitionContext<S, L, P> {
    start: S,
    end: S,
    label: L,
    payload: Arc<P>,
}

impl<S, L, P> TransitionContext<S, L, P> {
    pub(crate) fn new(start: S, end: S, label: L, payload: Arc<P>) -> Self {
        Self {
            start,
            end,
            label,
            payload,
        }
    }

    pub fn start_state(&self) -> &S {
        &self.start
    }

    pub fn end_state(&self) -> &S {
        &self.end
    }

    pub fn label(&self) -> &L {
        &self.label
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }
}

impl<S: Clone, L: Clone, P> Clone for TransitionContext<S, L, P> {
    fn clone(&self) -> Self {
        Self {
            start: self.start.clone(),
            end: self.end.clone(),
            label: self.label.clone(),
            payload: Arc::clone(&self.payload),
        }
    }
}
