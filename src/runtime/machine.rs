//! Compiled machine: the shared graph plus the sessions started from it.

use crate::core::Symbol;
use crate::runtime::definition::{Graph, StateDefinition};
use crate::runtime::registry::SessionRegistry;
use crate::session::{Session, SessionError};
use std::sync::Arc;
use tokio::runtime::Handle;
use uuid::Uuid;

/// Immutable machine definition able to start any number of sessions.
///
/// Cloning is cheap and clones share both the graph and the session registry.
pub struct Machine<S, L, P> {
    graph: Arc<Graph<S, L, P>>,
    registry: Arc<SessionRegistry<S, L, P>>,
}

impl<S, L, P> Clone for Machine<S, L, P> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<S: Symbol, L: Symbol, P: Send + Sync + 'static> Machine<S, L, P> {
    pub(crate) fn new(graph: Graph<S, L, P>) -> Self {
        Self {
            graph: Arc::new(graph),
            registry: Arc::new(SessionRegistry::new()),
        }
    }

    /// Start a session in `state` without running its entry action.
    ///
    /// Must be called from within a tokio runtime; the session runs its
    /// callbacks on that runtime.
    pub fn start(&self, state: S, payload: P) -> Result<Arc<Session<S, L, P>>, SessionError> {
        let session = self.spawn_session(state, payload)?;
        tracing::debug!(
            session = %session.id(),
            state = session.current_state().name(),
            "session started"
        );
        Ok(session)
    }

    /// Start a session in `state` and run that state's entry action, under
    /// the same admission rules as any other state entry.
    pub fn start_entering(
        &self,
        state: S,
        payload: P,
    ) -> Result<Arc<Session<S, L, P>>, SessionError> {
        let session = self.spawn_session(state, payload)?;
        session.enter_start_state()?;
        tracing::debug!(
            session = %session.id(),
            state = session.current_state().name(),
            "session started with entry"
        );
        Ok(session)
    }

    fn spawn_session(&self, state: S, payload: P) -> Result<Arc<Session<S, L, P>>, SessionError> {
        let start = self
            .graph
            .state(&state)
            .cloned()
            .ok_or_else(|| SessionError::UnknownState {
                state: state.name().to_string(),
            })?;
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;

        let session = Arc::new(Session::new(
            Arc::clone(&self.graph),
            Arc::downgrade(&self.registry),
            start,
            payload,
            runtime,
        ));
        self.registry.insert(session.id(), Arc::clone(&session));
        Ok(session)
    }

    /// Snapshot of every live (not yet disposed) session.
    pub fn sessions(&self) -> Vec<Arc<Session<S, L, P>>> {
        self.registry.snapshot()
    }

    pub fn session(&self, id: Uuid) -> Option<Arc<Session<S, L, P>>> {
        self.registry.get(&id)
    }

    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Identities of every declared state, in no particular order.
    pub fn states(&self) -> Vec<S> {
        self.graph.states.keys().cloned().collect()
    }

    pub fn state(&self, id: &S) -> Option<&Arc<StateDefinition<S, L, P>>> {
        self.graph.state(id)
    }

    pub fn contains_state(&self, id: &S) -> bool {
        self.graph.states.contains_key(id)
    }
}
