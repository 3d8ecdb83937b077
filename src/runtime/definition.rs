//! Immutable state and transition definitions produced by the compiler.

use crate::core::Symbol;
use crate::session::{Session, TransitionContext};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Async callback run when a state becomes current.
pub type EntryAction<S, L, P> =
    Arc<dyn Fn(Arc<Session<S, L, P>>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Async callback run while a transition is in flight.
pub type InterceptAction<S, L, P> =
    Arc<dyn Fn(TransitionContext<S, L, P>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Handler for a failed entry action. Returning `Err` marks the fault as fatal.
pub type FaultHandler<S, L, P> =
    Arc<dyn Fn(&Arc<Session<S, L, P>>, &anyhow::Error) -> anyhow::Result<()> + Send + Sync>;

pub(crate) fn entry_action<S, L, P, F, Fut>(action: F) -> EntryAction<S, L, P>
where
    F: Fn(Arc<Session<S, L, P>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |session| action(session).boxed())
}

pub(crate) fn intercept_action<S, L, P, F, Fut>(action: F) -> InterceptAction<S, L, P>
where
    F: Fn(TransitionContext<S, L, P>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |context| action(context).boxed())
}

pub(crate) fn fault_handler<S, L, P, F>(handler: F) -> FaultHandler<S, L, P>
where
    F: Fn(&Arc<Session<S, L, P>>, &anyhow::Error) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// A compiled state: its identity, callbacks and outgoing transitions.
pub struct StateDefinition<S, L, P> {
    pub(crate) id: S,
    pub(crate) entry: Option<EntryAction<S, L, P>>,
    pub(crate) fault_handler: Option<FaultHandler<S, L, P>>,
    pub(crate) transitions: HashMap<L, Arc<TransitionDefinition<S, L, P>>>,
}

impl<S: Symbol, L: Symbol, P> StateDefinition<S, L, P> {
    pub(crate) fn new(id: S) -> Self {
        Self {
            id,
            entry: None,
            fault_handler: None,
            transitions: HashMap::new(),
        }
    }

    /// Identity of this state.
    pub fn id(&self) -> &S {
        &self.id
    }

    /// Whether an entry action is registered.
    pub fn has_entry_action(&self) -> bool {
        self.entry.is_some()
    }

    /// Whether a local entry-fault handler is registered.
    pub fn has_fault_handler(&self) -> bool {
        self.fault_handler.is_some()
    }

    /// Outgoing transition for `label`, if any.
    pub fn transition(&self, label: &L) -> Option<&Arc<TransitionDefinition<S, L, P>>> {
        self.transitions.get(label)
    }

    /// Labels of every outgoing transition.
    pub fn labels(&self) -> impl Iterator<Item = &L> {
        self.transitions.keys()
    }
}

/// A compiled transition. At most one exists per (start state, label) pair.
pub struct TransitionDefinition<S, L, P> {
    pub(crate) label: L,
    pub(crate) from: S,
    pub(crate) to: S,
    pub(crate) intercepts: Vec<InterceptAction<S, L, P>>,
}

impl<S, L, P> TransitionDefinition<S, L, P> {
    pub fn label(&self) -> &L {
        &self.label
    }

    pub fn from(&self) -> &S {
        &self.from
    }

    pub fn to(&self) -> &S {
        &self.to
    }

    pub fn intercept_count(&self) -> usize {
        self.intercepts.len()
    }
}

/// Read-only graph shared by every session of a machine.
pub struct Graph<S, L, P> {
    pub(crate) states: HashMap<S, Arc<StateDefinition<S, L, P>>>,
    pub(crate) fault_handler: Option<FaultHandler<S, L, P>>,
}

impl<S: Symbol, L: Symbol, P> Graph<S, L, P> {
    pub fn state(&self, id: &S) -> Option<&Arc<StateDefinition<S, L, P>>> {
        self.states.get(id)
    }

    pub fn global_fault_handler(&self) -> Option<&FaultHandler<S, L, P>> {
        self.fault_handler.as_ref()
    }
}
