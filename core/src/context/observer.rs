//! Context lifecycle observers.

use crate::bean::ScopeKind;
use crate::registry::ContextState;

/// Lifecycle callbacks fired by managed contexts.
///
/// Callbacks run synchronously on the thread driving the transition and
/// must not activate or terminate the same scope.
pub trait ContextObserver: Send + Sync {
    /// A fresh registry was activated (not fired when resuming a state).
    fn initialized(&self, _scope: ScopeKind, _state: &ContextState) {}

    /// A registry is about to be torn down.
    fn before_destroyed(&self, _scope: ScopeKind, _state: &ContextState) {}

    /// A registry was torn down; `destroyed` counts instances including dependents.
    fn destroyed(&self, _scope: ScopeKind, _destroyed: usize) {}
}
