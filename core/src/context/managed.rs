//! Managed context state machine.

use crate::bean::{BeanId, Instance, ScopeKind};
use crate::context::guard::ActivationGuard;
use crate::context::local::{self, BindingKey};
use crate::context::observer::ContextObserver;
use crate::errors::ArcError;
use crate::registry::{ContextState, InstanceRegistry, LiveInstance};
use std::fmt;
use std::sync::Arc;

/// **MANAGED CONTEXT**
///
/// **PURPOSE**: State machine of one managed scope (request or custom).
/// **GUARANTEE**: The ACTIVE/INACTIVE state is per thread. One
/// `ManagedContext` object serves every thread; a registry only crosses
/// threads through an explicit [`ContextState`] hand-off.
///
/// ```text
/// INACTIVE --activate()--------> ACTIVE   (fresh registry)
/// INACTIVE --activate_with(s)--> ACTIVE   (registry of s, no copy)
/// ACTIVE   --deactivate()------> INACTIVE (instances kept)
/// ACTIVE   --terminate()-------> INACTIVE (instances destroyed, states invalid)
/// ```
pub struct ManagedContext {
    container_id: u64,
    scope: ScopeKind,
    warn_on_orphaned_state: bool,
    observers: Arc<[Arc<dyn ContextObserver>]>,
}

impl ManagedContext {
    pub(crate) fn new(
        container_id: u64,
        scope: ScopeKind,
        warn_on_orphaned_state: bool,
        observers: Arc<[Arc<dyn ContextObserver>]>,
    ) -> Self {
        Self {
            container_id,
            scope,
            warn_on_orphaned_state,
            observers,
        }
    }

    /// Scope this context governs.
    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    fn key(&self) -> BindingKey {
        BindingKey {
            container: self.container_id,
            scope: self.scope,
        }
    }

    fn not_active(&self) -> ArcError {
        ArcError::ContextNotActive { scope: self.scope }
    }

    fn invalid(&self, reason: impl Into<String>) -> ArcError {
        ArcError::InvalidState {
            scope: self.scope,
            reason: reason.into(),
        }
    }

    /// True when this scope is active on the calling thread.
    pub fn is_active(&self) -> bool {
        local::is_bound(self.key())
    }

    /// **ACTIVATE** - bind a fresh, empty registry to the calling thread.
    pub fn activate(&self) -> Result<(), ArcError> {
        if self.is_active() {
            return Err(ArcError::AlreadyActive { scope: self.scope });
        }
        let registry = Arc::new(InstanceRegistry::new(self.container_id, self.scope));
        let state = ContextState::new(Arc::clone(&registry));
        if !local::bind(self.key(), registry) {
            return Err(ArcError::AlreadyActive { scope: self.scope });
        }
        log::debug!(
            "ManagedContext {}: activated registry {}",
            self.scope,
            state.registry_id()
        );
        for observer in self.observers.iter() {
            observer.initialized(self.scope, &state);
        }
        Ok(())
    }

    /// **ACTIVATE WITH STATE** - resume the registry captured in `state`.
    ///
    /// Binding a state that is still active on another thread is a caller
    /// error this method cannot detect.
    pub fn activate_with(&self, state: &ContextState) -> Result<(), ArcError> {
        if self.is_active() {
            return Err(ArcError::AlreadyActive { scope: self.scope });
        }
        if state.scope() != self.scope {
            return Err(self.invalid(format!(
                "state was captured from scope {}",
                state.scope()
            )));
        }
        if state.container_id() != self.container_id {
            return Err(self.invalid("state belongs to another container"));
        }
        if !state.is_valid() {
            return Err(self.invalid(format!(
                "registry {} has been terminated",
                state.registry_id()
            )));
        }
        if !local::bind(self.key(), Arc::clone(state.registry())) {
            return Err(ArcError::AlreadyActive { scope: self.scope });
        }
        log::debug!(
            "ManagedContext {}: resumed registry {} with {} live instance(s)",
            self.scope,
            state.registry_id(),
            state.len()
        );
        Ok(())
    }

    /// **DEACTIVATE** - unbind without destroying anything.
    ///
    /// Instances stay reachable only through a state captured beforehand.
    pub fn deactivate(&self) -> Result<(), ArcError> {
        let registry = local::unbind(self.key()).ok_or_else(|| self.not_active())?;
        if self.warn_on_orphaned_state && Arc::strong_count(&registry) == 1 && !registry.is_empty() {
            log::warn!(
                "ManagedContext {}: registry {} deactivated with {} live instance(s) and no captured state; their destructors will not run",
                self.scope,
                registry.id(),
                registry.len()
            );
        } else {
            log::debug!(
                "ManagedContext {}: deactivated registry {}",
                self.scope,
                registry.id()
            );
        }
        Ok(())
    }

    /// **GET STATE** - side-effect-free capture of the bound registry.
    pub fn state(&self) -> Result<ContextState, ArcError> {
        local::current(self.key())
            .map(ContextState::new)
            .ok_or_else(|| self.not_active())
    }

    /// **TERMINATE** - destroy every live instance and unbind.
    ///
    /// The context ends INACTIVE even when destructors fail; failures are
    /// reported together after all destructors ran.
    pub fn terminate(&self) -> Result<(), ArcError> {
        let registry = local::unbind(self.key()).ok_or_else(|| self.not_active())?;
        self.teardown(registry)
    }

    /// Tear down a suspended state without activating it.
    ///
    /// If the state is bound on the calling thread this is `terminate`.
    pub fn destroy_state(&self, state: &ContextState) -> Result<(), ArcError> {
        if state.scope() != self.scope || state.container_id() != self.container_id {
            return Err(self.invalid("state does not belong to this context"));
        }
        if !state.is_valid() {
            return Err(self.invalid(format!(
                "registry {} has already been terminated",
                state.registry_id()
            )));
        }
        if let Some(current) = local::current(self.key()) {
            if Arc::ptr_eq(&current, state.registry()) {
                return self.terminate();
            }
        }
        self.teardown(Arc::clone(state.registry()))
    }

    fn teardown(&self, registry: Arc<InstanceRegistry>) -> Result<(), ArcError> {
        let state = ContextState::new(Arc::clone(&registry));
        for observer in self.observers.iter() {
            observer.before_destroyed(self.scope, &state);
        }
        let (destroyed, failures) = registry.destroy_all();
        log::debug!(
            "ManagedContext {}: terminated registry {} ({} destroyed)",
            self.scope,
            registry.id(),
            destroyed
        );
        for observer in self.observers.iter() {
            observer.destroyed(self.scope, destroyed);
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ArcError::Teardown {
                scope: self.scope,
                failures,
            })
        }
    }

    /// Live instance of `bean` in the active registry, without creating one.
    pub fn get_if_present(&self, bean: &BeanId) -> Result<Option<Instance>, ArcError> {
        let registry = local::current(self.key()).ok_or_else(|| self.not_active())?;
        Ok(registry.lookup(bean))
    }

    /// Destroy the live instance of `bean` in the active registry.
    ///
    /// The next resolution creates a new instance. Returns `Ok(false)` when
    /// there was nothing to destroy.
    pub fn destroy_instance(&self, bean: &BeanId) -> Result<bool, ArcError> {
        let registry = local::current(self.key()).ok_or_else(|| self.not_active())?;
        registry.destroy_one(bean)
    }

    /// Activate and return a guard that terminates the window on drop.
    pub fn activate_guarded(self: &Arc<Self>) -> Result<ActivationGuard, ArcError> {
        self.activate()?;
        Ok(ActivationGuard::new(Arc::clone(self)))
    }

    /// Resume `state` under a guard that terminates the window on drop.
    pub fn resume_guarded(self: &Arc<Self>, state: &ContextState) -> Result<ActivationGuard, ArcError> {
        self.activate_with(state)?;
        Ok(ActivationGuard::new(Arc::clone(self)))
    }

    pub(crate) fn resolve<F>(&self, bean: &BeanId, create: F) -> Result<Instance, ArcError>
    where
        F: FnOnce() -> Result<LiveInstance, ArcError>,
    {
        let registry = local::current(self.key()).ok_or_else(|| self.not_active())?;
        registry.get_or_create(bean, create)
    }
}

impl fmt::Debug for ManagedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedContext")
            .field("container", &self.container_id)
            .field("scope", &self.scope)
            .field("active", &self.is_active())
            .finish()
    }
}
