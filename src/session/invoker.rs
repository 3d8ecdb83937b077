//! Supervised execution of user callbacks and fault routing.
//!
//! Every callback runs through [`guarded`], which turns both returned errors
//! and panics into an `anyhow::Error`, so callers always regain control and
//! can reset the admission flags afterwards.

use crate::core::Symbol;
use crate::runtime::{EntryAction, FaultHandler, Graph, InterceptAction, StateDefinition};
use crate::session::{Session, TransitionContext};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// How an entry-action failure was settled.
#[derive(Debug)]
pub(crate) enum FaultOutcome {
    /// A handler ran and returned `Ok`.
    Absorbed,
    /// Neither a local nor a global handler is registered.
    Unhandled,
    /// The resolved handler failed; carries its error.
    Rethrown(anyhow::Error),
}

impl FaultOutcome {
    pub(crate) fn is_fatal(&self) -> bool {
        !matches!(self, Self::Absorbed)
    }
}

fn panic_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    anyhow::anyhow!("callback panicked: {message}")
}

/// Run a callback, catching panics raised while building or polling its future.
pub(crate) async fn guarded<F>(call: F) -> anyhow::Result<()>
where
    F: FnOnce() -> BoxFuture<'static, anyhow::Result<()>>,
{
    let future = match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(future) => future,
        Err(payload) => return Err(panic_error(payload)),
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(panic_error(payload)),
    }
}

pub(crate) async fn invoke_entry<S, L, P>(
    action: &EntryAction<S, L, P>,
    session: Arc<Session<S, L, P>>,
) -> anyhow::Result<()> {
    guarded(|| action(session)).await
}

/// Fire every intercept action and wait for all of them.
///
/// Failures are logged and discarded one by one; the number of failed
/// intercepts is returned.
pub(crate) async fn invoke_intercepts<S: Symbol, L: Symbol, P>(
    intercepts: &[InterceptAction<S, L, P>],
    context: &TransitionContext<S, L, P>,
) -> usize {
    let calls = intercepts
        .iter()
        .map(|intercept| guarded(|| intercept(context.clone())));

    let mut failures = 0;
    for (index, result) in join_all(calls).await.into_iter().enumerate() {
        if let Err(err) = result {
            failures += 1;
            tracing::warn!(
                from = context.start_state().name(),
                to = context.end_state().name(),
                label = context.label().name(),
                intercept = index,
                error = %err,
                "intercept action failed; discarding"
            );
        }
    }
    failures
}

/// Pick the handler for a failed entry action: the state's own handler wins,
/// the machine-wide handler is the fallback. Never both.
pub(crate) fn resolve_handler<'a, S: Symbol, L: Symbol, P>(
    state: &'a StateDefinition<S, L, P>,
    graph: &'a Graph<S, L, P>,
) -> Option<&'a FaultHandler<S, L, P>> {
    state
        .fault_handler
        .as_ref()
        .or_else(|| graph.global_fault_handler())
}

/// Invoke the resolved handler exactly once.
pub(crate) fn handle_fault<S, L, P>(
    handler: Option<&FaultHandler<S, L, P>>,
    session: &Arc<Session<S, L, P>>,
    error: &anyhow::Error,
) -> FaultOutcome {
    let Some(handler) = handler else {
        return FaultOutcome::Unhandled;
    };

    match panic::catch_unwind(AssertUnwindSafe(|| handler(session, error))) {
        Ok(Ok(())) => FaultOutcome::Absorbed,
        Ok(Err(err)) => FaultOutcome::Rethrown(err),
        Err(payload) => FaultOutcome::Rethrown(panic_error(payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{fault_handler, intercept_action, TransitionDefinition};
    use crate::symbol_enum;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    symbol_enum! {
        enum TestState {
            Start,
            End,
        }
    }

    symbol_enum! {
        enum TestLabel {
            Stopping,
        }
    }

    type Handler = FaultHandler<TestState, TestLabel, ()>;

    fn handler() -> Handler {
        fault_handler(|_, _| Ok(()))
    }

    fn explode(message: &str) -> anyhow::Result<()> {
        panic!("{message}");
    }

    fn context() -> TransitionContext<TestState, TestLabel, ()> {
        TransitionContext::new(
            TestState::Start,
            TestState::End,
            TestLabel::Stopping,
            Arc::new(()),
        )
    }

    #[tokio::test]
    async fn guarded_passes_results_through() {
        assert!(guarded(|| async { Ok(()) }.boxed()).await.is_ok());

        let err = guarded(|| async { Err(anyhow::anyhow!("boom")) }.boxed())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn guarded_catches_panic_while_polling() {
        let err = guarded(|| async { explode("exploded") }.boxed())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("exploded"));
    }

    #[tokio::test]
    async fn guarded_catches_panic_while_building() {
        let err = guarded(|| -> BoxFuture<'static, anyhow::Result<()>> {
            panic!("never built");
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("never built"));
    }

    #[tokio::test]
    async fn failing_intercepts_do_not_stop_siblings() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&hits);

        let intercepts: Vec<InterceptAction<TestState, TestLabel, ()>> = vec![
            intercept_action(|_| async { Err(anyhow::anyhow!("first fails")) }),
            intercept_action(move |ctx| {
                let counted = Arc::clone(&counted);
                async move {
                    assert_eq!(ctx.end_state(), &TestState::End);
                    counted.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
            intercept_action(|_| async { explode("third panics") }),
        ];

        let failures = invoke_intercepts(&intercepts, &context()).await;

        assert_eq!(failures, 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn local_handler_takes_priority() {
        let local = handler();
        let global = handler();

        let mut state = StateDefinition::<TestState, TestLabel, ()>::new(TestState::Start);
        state.fault_handler = Some(Arc::clone(&local));
        let graph = Graph {
            states: HashMap::new(),
            fault_handler: Some(Arc::clone(&global)),
        };

        let resolved = resolve_handler(&state, &graph).unwrap();
        assert!(Arc::ptr_eq(resolved, &local));
    }

    #[test]
    fn global_handler_is_the_fallback() {
        let global = handler();

        let state = StateDefinition::<TestState, TestLabel, ()>::new(TestState::Start);
        let graph = Graph {
            states: HashMap::new(),
            fault_handler: Some(Arc::clone(&global)),
        };

        let resolved = resolve_handler(&state, &graph).unwrap();
        assert!(Arc::ptr_eq(resolved, &global));
    }

    #[test]
    fn no_handler_resolves_to_none() {
        let mut state = StateDefinition::<TestState, TestLabel, ()>::new(TestState::Start);
        state.transitions.insert(
            TestLabel::Stopping,
            Arc::new(TransitionDefinition {
                label: TestLabel::Stopping,
                from: TestState::Start,
                to: TestState::End,
                intercepts: Vec::new(),
            }),
        );
        let graph = Graph {
            states: HashMap::new(),
            fault_handler: None,
        };

        assert!(resolve_handler(&state, &graph).is_none());
    }

    #[test]
    fn only_absorbed_outcome_is_survivable() {
        assert!(!FaultOutcome::Absorbed.is_fatal());
        assert!(FaultOutcome::Unhandled.is_fatal());
        assert!(FaultOutcome::Rethrown(anyhow::anyhow!("again")).is_fatal());
    }
}
