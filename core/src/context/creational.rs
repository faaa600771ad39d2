//! Creational context handed to bean factories.

use crate::bean::{BeanDefinition, BeanId, ScopeKind};
use crate::container::ContainerInner;
use crate::errors::{ArcError, DestroyFailure};
use crate::proxy::{downcast, ClientProxy};
use crate::registry::LiveInstance;
use std::any::Any;
use std::sync::Arc;

/// **CREATIONAL CONTEXT**
///
/// **PURPOSE**: Handed to a bean factory so it can satisfy its injection
/// points.
/// **GUARANTEE**: Dependent-scoped instances obtained here are owned by the
/// bean under construction and destroyed right after it, newest first.
pub struct CreationalContext<'a> {
    container: &'a Arc<ContainerInner>,
    bean: &'a Arc<BeanDefinition>,
    dependents: Vec<LiveInstance>,
}

impl<'a> CreationalContext<'a> {
    pub(crate) fn new(container: &'a Arc<ContainerInner>, bean: &'a Arc<BeanDefinition>) -> Self {
        Self {
            container,
            bean,
            dependents: Vec::new(),
        }
    }

    /// Id of the bean under construction.
    pub fn bean_id(&self) -> &BeanId {
        self.bean.id()
    }

    /// Scope of the bean under construction.
    pub fn scope(&self) -> ScopeKind {
        self.bean.scope()
    }

    /// Resolve a dependency now.
    ///
    /// Normal-scoped and singleton dependencies are resolved in their own
    /// context, which must be active. Dependent dependencies are created
    /// fresh and owned by this bean.
    pub fn get<T: Any + Send + Sync>(&mut self, id: &BeanId) -> Result<Arc<T>, ArcError> {
        self.check_declared(id)?;
        let dependency = self.container.lookup(id)?;
        let instance = if dependency.scope() == ScopeKind::Dependent {
            let record = self.container.create(&dependency)?;
            let instance = Arc::clone(record.instance());
            self.dependents.push(record);
            instance
        } else {
            self.container.resolve(&dependency)?
        };
        downcast::<T>(id, instance)
    }

    /// Shortcut for `get(&BeanId::of::<T>())`.
    pub fn get_default<T: Any + Send + Sync>(&mut self) -> Result<Arc<T>, ArcError> {
        self.get(&BeanId::of::<T>())
    }

    /// Inject a client proxy; the dependency is resolved on each use.
    pub fn proxy<T: Any + Send + Sync>(&mut self, id: &BeanId) -> Result<ClientProxy<T>, ArcError> {
        self.check_declared(id)?;
        self.container.proxy(id)
    }

    fn check_declared(&self, id: &BeanId) -> Result<(), ArcError> {
        if self.container.config().strict_dependencies && !self.bean.dependencies().contains(id) {
            return Err(ArcError::creation(
                self.bean.id(),
                format!("{} is not a declared dependency", id),
            ));
        }
        Ok(())
    }

    pub(crate) fn into_dependents(self) -> Vec<LiveInstance> {
        self.dependents
    }

    /// Destroy dependents of a failed construction, newest first.
    pub(crate) fn abandon(self) -> Vec<DestroyFailure> {
        let mut failures = Vec::new();
        for dependent in self.dependents.iter().rev() {
            dependent.destroy(&mut failures);
        }
        failures
    }
}
