//! Always-active shared contexts.

use crate::bean::{BeanId, Instance, ScopeKind};
use crate::errors::ArcError;
use crate::registry::{InstanceRegistry, LiveInstance};
use std::sync::Arc;

/// Always-active context of a container-wide scope (singleton, application).
///
/// Every thread resolves against the same registry. It is destroyed once,
/// on container shutdown.
#[derive(Debug)]
pub struct SharedContext {
    registry: Arc<InstanceRegistry>,
}

impl SharedContext {
    pub(crate) fn new(container_id: u64, scope: ScopeKind) -> Self {
        Self {
            registry: Arc::new(InstanceRegistry::new(container_id, scope)),
        }
    }

    /// Scope of this context.
    pub fn scope(&self) -> ScopeKind {
        self.registry.scope()
    }

    /// Active until the container shuts down.
    pub fn is_active(&self) -> bool {
        !self.registry.is_destroyed()
    }

    /// Live instance of `bean`, without creating one.
    pub fn get_if_present(&self, bean: &BeanId) -> Option<Instance> {
        self.registry.lookup(bean)
    }

    pub(crate) fn registry(&self) -> &Arc<InstanceRegistry> {
        &self.registry
    }

    pub(crate) fn resolve<F>(&self, bean: &BeanId, create: F) -> Result<Instance, ArcError>
    where
        F: FnOnce() -> Result<LiveInstance, ArcError>,
    {
        self.registry.get_or_create(bean, create)
    }

    pub(crate) fn destroy_instance(&self, bean: &BeanId) -> Result<bool, ArcError> {
        self.registry.destroy_one(bean)
    }

    pub(crate) fn destroy(&self) -> Result<(), ArcError> {
        let (destroyed, failures) = self.registry.destroy_all();
        log::debug!("SharedContext {}: destroyed {} instance(s)", self.scope(), destroyed);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ArcError::Teardown {
                scope: self.scope(),
                failures,
            })
        }
    }
}
