//! Running instances of a compiled machine.
//!
//! A [`Session`] owns its current state, lifecycle and admission flags.
//! [`Session::post`] decides synchronously whether a transition starts,
//! waits for the running entry action, or is rejected; execution then
//! continues on the tokio runtime the session was started on.
//!
//! For one session, "transition, target entry action, deferred transition"
//! runs strictly in sequence. Sessions never share mutable state.

mod admission;
mod context;
mod error;
mod invoker;
mod lifecycle;

pub use context::TransitionContext;
pub use error::SessionError;
pub use lifecycle::{Lifecycle, Phase, SessionSnapshot};

use crate::core::Symbol;
use crate::runtime::{Graph, SessionRegistry, StateDefinition, TransitionDefinition};
use admission::{Admitted, AdmissionCore};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// One running instance of a machine, bound to a payload.
pub struct Session<S, L, P> {
    id: Uuid,
    graph: Arc<Graph<S, L, P>>,
    registry: Weak<SessionRegistry<S, L, P>>,
    payload: Arc<P>,
    core: Mutex<AdmissionCore<S, L, P>>,
    started: Instant,
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
    runtime: Handle,
}

impl<S: Symbol, L: Symbol, P: Send + Sync + 'static> Session<S, L, P> {
    pub(crate) fn new(
        graph: Arc<Graph<S, L, P>>,
        registry: Weak<SessionRegistry<S, L, P>>,
        start: Arc<StateDefinition<S, L, P>>,
        payload: P,
        runtime: Handle,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            graph,
            registry,
            payload: Arc::new(payload),
            core: Mutex::new(AdmissionCore::new(start)),
            started: Instant::now(),
            started_at: Utc::now(),
            cancel: CancellationToken::new(),
            runtime,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current_state(&self) -> S {
        self.core.lock().current().id().clone()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.core.lock().lifecycle()
    }

    pub fn phase(&self) -> Phase {
        self.core.lock().phase()
    }

    /// Label waiting for the running entry action to finish, if any.
    pub fn pending(&self) -> Option<L> {
        self.core.lock().pending().cloned()
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time since the session was started.
    pub fn total_elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time since the current state was entered.
    pub fn state_elapsed(&self) -> Duration {
        self.core.lock().state_entered().elapsed()
    }

    /// Token cancelled when the session is disposed. Callbacks may watch it;
    /// nothing forces them to.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let core = self.core.lock();
        SessionSnapshot {
            id: self.id,
            current_state: core.current().id().name().to_string(),
            lifecycle: core.lifecycle(),
            phase: core.phase(),
            pending: core.pending().map(|label| label.name().to_string()),
            started_at: self.started_at,
            total_elapsed: self.started.elapsed(),
            state_elapsed: core.state_entered().elapsed(),
        }
    }

    /// Request the transition `label` from the current state.
    ///
    /// Returns as soon as the admission decision is made:
    /// - idle: the transition starts on the runtime
    /// - entry action running: the label is deferred until it finishes
    /// - otherwise the request is rejected and nothing changes
    ///
    /// Safe to call from any thread, including from the session's own
    /// callbacks.
    pub fn post(self: &Arc<Self>, label: L) -> Result<(), SessionError> {
        let admitted = self.core.lock().admit(label.clone());

        match admitted {
            Ok(Admitted::Start(transition)) => {
                tracing::debug!(
                    session = %self.id,
                    label = label.name(),
                    from = transition.from().name(),
                    to = transition.to().name(),
                    "transition admitted"
                );
                let session = Arc::clone(self);
                self.runtime.spawn(session.run_transition(transition));
                Ok(())
            }
            Ok(Admitted::Deferred) => {
                tracing::debug!(
                    session = %self.id,
                    label = label.name(),
                    "entry action running; transition deferred"
                );
                Ok(())
            }
            Err(err) => {
                tracing::debug!(
                    session = %self.id,
                    label = label.name(),
                    error = %err,
                    "transition rejected"
                );
                Err(err)
            }
        }
    }

    /// Cancel the session's token and drop it from the machine's registry.
    ///
    /// Callbacks already in flight keep running. Calling this twice is a
    /// no-op.
    pub fn dispose(&self) {
        if !self.core.lock().dispose() {
            return;
        }

        self.cancel.cancel();
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.id);
        }
        tracing::debug!(session = %self.id, "session disposed");
    }

    /// Run the entry action of the state the session was started in.
    pub(crate) fn enter_start_state(self: &Arc<Self>) -> Result<(), SessionError> {
        let state = {
            let mut core = self.core.lock();
            core.begin_state_operation()?;
            Arc::clone(core.current())
        };

        let session = Arc::clone(self);
        self.runtime.spawn(session.run_entry(state));
        Ok(())
    }

    async fn run_transition(self: Arc<Self>, transition: Arc<TransitionDefinition<S, L, P>>) {
        if !transition.intercepts.is_empty() {
            let context = TransitionContext::new(
                transition.from.clone(),
                transition.to.clone(),
                transition.label.clone(),
                Arc::clone(&self.payload),
            );
            invoker::invoke_intercepts(&transition.intercepts, &context).await;
        }

        let Some(target) = self.graph.state(&transition.to).cloned() else {
            tracing::error!(
                session = %self.id,
                label = transition.label.name(),
                to = transition.to.name(),
                "transition target missing from graph"
            );
            self.core.lock().abort_transition();
            return;
        };

        let entered = self.core.lock().enter(Arc::clone(&target));
        if let Err(err) = entered {
            tracing::error!(
                session = %self.id,
                label = transition.label.name(),
                error = %err,
                "transition could not enter its target"
            );
            self.core.lock().abort_transition();
            return;
        }

        tracing::debug!(
            session = %self.id,
            from = transition.from.name(),
            to = transition.to.name(),
            "state changed"
        );
        self.run_entry(target).await;
    }

    /// Entry phase of `state`: the caller has already set the in-state flag.
    async fn run_entry(self: Arc<Self>, state: Arc<StateDefinition<S, L, P>>) {
        if let Some(action) = &state.entry {
            if let Err(err) = invoker::invoke_entry(action, Arc::clone(&self)).await {
                let handler = invoker::resolve_handler(&state, &self.graph);
                let outcome = invoker::handle_fault(handler, &self, &err);

                if outcome.is_fatal() {
                    self.core.lock().fault();
                    tracing::error!(
                        session = %self.id,
                        state = state.id().name(),
                        error = %err,
                        outcome = ?outcome,
                        "entry action failed; session faulted"
                    );
                } else {
                    tracing::warn!(
                        session = %self.id,
                        state = state.id().name(),
                        error = %err,
                        "entry action failed; fault handled"
                    );
                }
            }
        }

        let pending = self.core.lock().end_state_operation();
        if let Some(label) = pending {
            tracing::debug!(
                session = %self.id,
                label = label.name(),
                "replaying deferred transition"
            );
            if let Err(err) = self.post(label) {
                tracing::warn!(
                    session = %self.id,
                    error = %err,
                    "deferred transition dropped"
                );
            }
        }
    }
}

impl<S: Symbol, L: Symbol, P> fmt::Debug for Session<S, L, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.lock();
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("current", core.current().id())
            .field("lifecycle", &core.lifecycle())
            .field("phase", &core.phase())
            .finish()
    }
}
