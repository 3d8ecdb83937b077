//! Builder for declaring and compiling machines.

use crate::builder::error::BuildError;
use crate::core::Symbol;
use crate::runtime::{
    entry_action, fault_handler, intercept_action, EntryAction, FaultHandler, Graph,
    InterceptAction, Machine, StateDefinition, TransitionDefinition,
};
use crate::session::{Session, TransitionContext};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

struct TransitionDecl<S, L, P> {
    label: L,
    to: S,
    intercepts: Vec<InterceptAction<S, L, P>>,
}

struct StateDecl<S, L, P> {
    entry: Option<EntryAction<S, L, P>>,
    fault_handler: Option<FaultHandler<S, L, P>>,
    transitions: Vec<TransitionDecl<S, L, P>>,
}

impl<S, L, P> StateDecl<S, L, P> {
    fn new() -> Self {
        Self {
            entry: None,
            fault_handler: None,
            transitions: Vec::new(),
        }
    }
}

/// Mutable declaration of a machine's states, transitions and callbacks.
///
/// Declarations are validated as they are added; [`compile`](Self::compile)
/// checks the graph as a whole and produces an immutable [`Machine`].
///
/// # Example
///
/// ```
/// use statecraft::builder::MachineBuilder;
/// use statecraft::symbol_enum;
///
/// symbol_enum! {
///     enum Light {
///         Red,
///         Green,
///     }
/// }
///
/// symbol_enum! {
///     enum Signal {
///         Go,
///         Halt,
///     }
/// }
///
/// # fn main() -> Result<(), statecraft::builder::BuildError> {
/// let mut builder = MachineBuilder::<Light, Signal, ()>::new();
/// builder
///     .add_state(Light::Red)?
///     .add_state(Light::Green)?
///     .add_transition(Light::Red, Signal::Go, Light::Green)?
///     .add_transition(Light::Green, Signal::Halt, Light::Red)?;
///
/// let machine = builder.compile()?;
/// assert_eq!(machine.states().len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct MachineBuilder<S, L, P> {
    order: Vec<S>,
    states: HashMap<S, StateDecl<S, L, P>>,
    fault_handler: Option<FaultHandler<S, L, P>>,
}

impl<S: Symbol, L: Symbol, P: Send + Sync + 'static> MachineBuilder<S, L, P> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            states: HashMap::new(),
            fault_handler: None,
        }
    }

    fn declared(&mut self, state: &S) -> Result<&mut StateDecl<S, L, P>, BuildError> {
        self.states
            .get_mut(state)
            .ok_or_else(|| BuildError::UnknownState {
                state: state.name().to_string(),
            })
    }

    /// Declare a state.
    pub fn add_state(&mut self, state: S) -> Result<&mut Self, BuildError> {
        if self.states.contains_key(&state) {
            return Err(BuildError::DuplicateState {
                state: state.name().to_string(),
            });
        }

        self.order.push(state.clone());
        self.states.insert(state, StateDecl::new());
        Ok(self)
    }

    /// Declare the transition `label` from `from` to `to`.
    ///
    /// `from` must already be declared; `to` only has to exist by the time
    /// the machine is compiled.
    pub fn add_transition(&mut self, from: S, label: L, to: S) -> Result<&mut Self, BuildError> {
        let decl = self.declared(&from)?;
        if decl.transitions.iter().any(|t| t.label == label) {
            return Err(BuildError::DuplicateTransition {
                from: from.name().to_string(),
                label: label.name().to_string(),
            });
        }

        decl.transitions.push(TransitionDecl {
            label,
            to,
            intercepts: Vec::new(),
        });
        Ok(self)
    }

    /// Append an intercept action to an already declared transition.
    ///
    /// Intercepts run concurrently while the transition is in flight; their
    /// failures are logged and ignored.
    pub fn intercept<F, Fut>(&mut self, from: S, label: L, action: F) -> Result<&mut Self, BuildError>
    where
        F: Fn(TransitionContext<S, L, P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let decl = self.declared(&from)?;
        let transition = decl
            .transitions
            .iter_mut()
            .find(|t| t.label == label)
            .ok_or_else(|| BuildError::UnknownTransition {
                from: from.name().to_string(),
                label: label.name().to_string(),
            })?;

        transition.intercepts.push(intercept_action(action));
        Ok(self)
    }

    /// Register the entry action of `state`. Only one is allowed per state.
    pub fn on_enter<F, Fut>(&mut self, state: S, action: F) -> Result<&mut Self, BuildError>
    where
        F: Fn(Arc<Session<S, L, P>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let decl = self.declared(&state)?;
        if decl.entry.is_some() {
            return Err(BuildError::DuplicateEntryAction {
                state: state.name().to_string(),
            });
        }

        decl.entry = Some(entry_action(action));
        Ok(self)
    }

    /// Register the handler for entry-action failures of `state`.
    ///
    /// Replaces any handler set before. When present it is used instead of
    /// the machine-wide handler, never in addition to it.
    pub fn on_enter_fault<F>(&mut self, state: S, handler: F) -> Result<&mut Self, BuildError>
    where
        F: Fn(&Arc<Session<S, L, P>>, &anyhow::Error) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let decl = self.declared(&state)?;
        decl.fault_handler = Some(fault_handler(handler));
        Ok(self)
    }

    /// Register the machine-wide fallback for entry-action failures.
    /// Replaces any handler set before.
    pub fn on_fault<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&Arc<Session<S, L, P>>, &anyhow::Error) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.fault_handler = Some(fault_handler(handler));
        self
    }

    /// Validate the declarations and produce an immutable machine.
    ///
    /// Each call returns an independent machine with its own session
    /// registry; the builder is left untouched.
    pub fn compile(&self) -> Result<Machine<S, L, P>, BuildError> {
        let mut states = HashMap::with_capacity(self.order.len());

        for id in &self.order {
            let Some(decl) = self.states.get(id) else {
                continue;
            };

            let mut state = StateDefinition::new(id.clone());
            state.entry = decl.entry.clone();
            state.fault_handler = decl.fault_handler.clone();

            for transition in &decl.transitions {
                if !self.states.contains_key(&transition.to) {
                    return Err(BuildError::DanglingTransition {
                        from: id.name().to_string(),
                        label: transition.label.name().to_string(),
                        to: transition.to.name().to_string(),
                    });
                }
                if transition.to == *id {
                    return Err(BuildError::SelfTransition {
                        state: id.name().to_string(),
                        label: transition.label.name().to_string(),
                    });
                }

                state.transitions.insert(
                    transition.label.clone(),
                    Arc::new(TransitionDefinition {
                        label: transition.label.clone(),
                        from: id.clone(),
                        to: transition.to.clone(),
                        intercepts: transition.intercepts.clone(),
                    }),
                );
            }

            states.insert(id.clone(), Arc::new(state));
        }

        tracing::debug!(states = states.len(), "machine compiled");
        Ok(Machine::new(Graph {
            states,
            fault_handler: self.fault_handler.clone(),
        }))
    }
}

impl<S: Symbol, L: Symbol, P: Send + Sync + 'static> Default for MachineBuilder<S, L, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol_enum;

    symbol_enum! {
        enum TestState {
            Start,
            Middle,
            End,
        }
    }

    symbol_enum! {
        enum TestLabel {
            Advance,
            Stopping,
        }
    }

    type Builder = MachineBuilder<TestState, TestLabel, ()>;

    #[test]
    fn add_state_rejects_duplicates() {
        let mut builder = Builder::new();
        builder.add_state(TestState::Start).unwrap();

        let result = builder.add_state(TestState::Start);

        assert!(matches!(result, Err(BuildError::DuplicateState { .. })));
    }

    #[test]
    fn add_transition_rejects_duplicates() {
        let mut builder = Builder::new();
        builder
            .add_state(TestState::Start)
            .unwrap()
            .add_state(TestState::End)
            .unwrap()
            .add_transition(TestState::Start, TestLabel::Stopping, TestState::End)
            .unwrap();

        let result = builder.add_transition(TestState::Start, TestLabel::Stopping, TestState::Middle);

        assert_eq!(
            result.err(),
            Some(BuildError::DuplicateTransition {
                from: "Start".to_string(),
                label: "Stopping".to_string(),
            })
        );
    }

    #[test]
    fn same_label_from_different_states_is_allowed() {
        let mut builder = Builder::new();
        builder
            .add_state(TestState::Start)
            .unwrap()
            .add_state(TestState::Middle)
            .unwrap()
            .add_state(TestState::End)
            .unwrap()
            .add_transition(TestState::Start, TestLabel::Advance, TestState::Middle)
            .unwrap()
            .add_transition(TestState::Middle, TestLabel::Advance, TestState::End)
            .unwrap();

        assert!(builder.compile().is_ok());
    }

    #[test]
    fn add_transition_requires_source_state() {
        let mut builder = Builder::new();

        let result = builder.add_transition(TestState::Start, TestLabel::Stopping, TestState::End);

        assert!(matches!(result, Err(BuildError::UnknownState { .. })));
    }

    #[test]
    fn on_enter_rejects_second_action() {
        let mut builder = Builder::new();
        builder
            .add_state(TestState::Start)
            .unwrap()
            .on_enter(TestState::Start, |_| async { Ok(()) })
            .unwrap();

        let result = builder.on_enter(TestState::Start, |_| async { Ok(()) });

        assert!(matches!(result, Err(BuildError::DuplicateEntryAction { .. })));
    }

    #[test]
    fn fault_handlers_are_last_write_wins() {
        let mut builder = Builder::new();
        builder.add_state(TestState::Start).unwrap();

        builder
            .on_enter_fault(TestState::Start, |_, _| Ok(()))
            .unwrap()
            .on_enter_fault(TestState::Start, |_, err| Err(anyhow::anyhow!("{err}")))
            .unwrap();
        builder.on_fault(|_, _| Ok(())).on_fault(|_, _| Ok(()));

        let machine = builder.compile().unwrap();
        assert!(machine.state(&TestState::Start).unwrap().has_fault_handler());
    }

    #[test]
    fn intercept_requires_declared_transition() {
        let mut builder = Builder::new();
        builder.add_state(TestState::Start).unwrap();

        let result = builder.intercept(TestState::Start, TestLabel::Stopping, |_| async { Ok(()) });

        assert!(matches!(result, Err(BuildError::UnknownTransition { .. })));
    }

    #[test]
    fn compile_rejects_dangling_target() {
        let mut builder = Builder::new();
        builder
            .add_state(TestState::Start)
            .unwrap()
            .add_transition(TestState::Start, TestLabel::Stopping, TestState::End)
            .unwrap();

        let result = builder.compile();

        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("Transition 'Stopping' from 'Start' targets undeclared state 'End'".to_string())
        );
    }

    #[test]
    fn target_may_be_declared_after_transition() {
        let mut builder = Builder::new();
        builder
            .add_state(TestState::Start)
            .unwrap()
            .add_transition(TestState::Start, TestLabel::Stopping, TestState::End)
            .unwrap()
            .add_state(TestState::End)
            .unwrap();

        assert!(builder.compile().is_ok());
    }

    #[test]
    fn compile_rejects_self_transition() {
        let mut builder = Builder::new();
        builder
            .add_state(TestState::Start)
            .unwrap()
            .add_transition(TestState::Start, TestLabel::Advance, TestState::Start)
            .unwrap();

        assert!(matches!(
            builder.compile(),
            Err(BuildError::SelfTransition { .. })
        ));
    }

    #[test]
    fn compile_empty_builder() {
        let machine = Builder::new().compile().unwrap();

        assert!(machine.states().is_empty());
    }

    #[test]
    fn compile_is_repeatable_and_independent() {
        let mut builder = Builder::new();
        builder
            .add_state(TestState::Start)
            .unwrap()
            .add_state(TestState::End)
            .unwrap()
            .add_transition(TestState::Start, TestLabel::Stopping, TestState::End)
            .unwrap()
            .intercept(TestState::Start, TestLabel::Stopping, |_| async { Ok(()) })
            .unwrap();

        let first = builder.compile().unwrap();
        builder.add_state(TestState::Middle).unwrap();
        let second = builder.compile().unwrap();

        assert_eq!(first.states().len(), 2);
        assert_eq!(second.states().len(), 3);

        let transition = first
            .state(&TestState::Start)
            .unwrap()
            .transition(&TestLabel::Stopping)
            .unwrap();
        assert_eq!(transition.to(), &TestState::End);
        assert_eq!(transition.intercept_count(), 1);
    }
}
