//! Transferable context state.

use crate::bean::{BeanId, ScopeKind};
use crate::registry::store::InstanceRegistry;
use std::fmt;
use std::sync::Arc;

/// **CONTEXT STATE**
///
/// **PURPOSE**: Transferable handle to the live-instance set of a managed
/// context, captured with `ManagedContext::state`.
/// **GUARANTEE**: A state is a reference, not a copy. Instances resolved
/// after the capture are visible when the state is re-activated, and
/// cloning a state never touches the underlying records.
///
/// A state becomes invalid once its registry is terminated.
///
/// Discarding every state of a deactivated context leaves its instances
/// alive until the last handle is dropped, and their destructors never run.
/// Callers that suspend a context own the obligation to re-activate and
/// terminate it, or to call `ManagedContext::destroy_state`.
#[derive(Clone)]
pub struct ContextState {
    registry: Arc<InstanceRegistry>,
}

impl ContextState {
    pub(crate) fn new(registry: Arc<InstanceRegistry>) -> Self {
        Self { registry }
    }

    pub(crate) fn registry(&self) -> &Arc<InstanceRegistry> {
        &self.registry
    }

    /// Scope of the context this state was captured from.
    pub fn scope(&self) -> ScopeKind {
        self.registry.scope()
    }

    pub(crate) fn container_id(&self) -> u64 {
        self.registry.container_id()
    }

    /// Identifier of the underlying registry.
    pub fn registry_id(&self) -> u64 {
        self.registry.id()
    }

    /// False once the originating registry has been terminated.
    pub fn is_valid(&self) -> bool {
        !self.registry.is_destroyed()
    }

    /// Number of live instances currently held.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// True when no instance is live.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// True when `bean` has a live instance.
    pub fn contains(&self, bean: &BeanId) -> bool {
        self.registry.contains(bean)
    }

    /// Bean ids of the live instances, oldest first.
    pub fn bean_ids(&self) -> Vec<BeanId> {
        self.registry.bean_ids()
    }

    /// True when both states refer to the same registry.
    pub fn same_registry(&self, other: &ContextState) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry)
    }
}

impl PartialEq for ContextState {
    fn eq(&self, other: &Self) -> bool {
        self.same_registry(other)
    }
}

impl Eq for ContextState {}

impl fmt::Debug for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextState")
            .field("registry", &self.registry.id())
            .field("scope", &self.scope())
            .field("live", &self.len())
            .field("valid", &self.is_valid())
            .finish()
    }
}
