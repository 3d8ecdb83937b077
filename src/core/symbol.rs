//! Identity symbols for states and transition labels.
//!
//! A compiled machine only ever compares, hashes and names its states and
//! labels, so both are described by the same small trait.

use std::fmt::Debug;
use std::hash::Hash;

/// Opaque, comparable identity used for states and transition labels.
///
/// # Required Traits
///
/// - `Clone`: identities are copied into definitions, sessions and contexts
/// - `Eq` + `Hash`: identities key the compiled graph
/// - `Debug`: identities appear in diagnostics
/// - `Send` + `Sync` + `'static`: sessions run on worker threads
///
/// # Example
///
/// ```rust
/// use statecraft::core::Symbol;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Door {
///     Open,
///     Closed,
/// }
///
/// impl Symbol for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///         }
///     }
/// }
///
/// assert_eq!(Door::Open.name(), "Open");
/// ```
pub trait Symbol: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Human readable name for logging, errors and snapshots.
    fn name(&self) -> &str;
}

impl Symbol for &'static str {
    fn name(&self) -> &str {
        self
    }
}

impl Symbol for String {
    fn name(&self) -> &str {
        self.as_str()
    }
}
