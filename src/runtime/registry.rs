//! Live sessions of one machine.

use crate::session::Session;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Every session a machine has started and not yet disposed.
///
/// Guarded by its own lock, never by a session's admission lock.
pub(crate) struct SessionRegistry<S, L, P> {
    sessions: RwLock<HashMap<Uuid, Arc<Session<S, L, P>>>>,
}

impl<S, L, P> SessionRegistry<S, L, P> {
    pub(crate) fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn insert(&self, id: Uuid, session: Arc<Session<S, L, P>>) {
        self.sessions.write().insert(id, session);
    }

    pub(crate) fn remove(&self, id: &Uuid) -> Option<Arc<Session<S, L, P>>> {
        self.sessions.write().remove(id)
    }

    pub(crate) fn get(&self, id: &Uuid) -> Option<Arc<Session<S, L, P>>> {
        self.sessions.read().get(id).cloned()
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<Session<S, L, P>>> {
        self.sessions.read().values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.read().len()
    }
}
