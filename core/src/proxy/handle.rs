//! Handles to resolved instances.

use crate::bean::{BeanId, ScopeKind};
use crate::container::ContainerInner;
use crate::errors::ArcError;
use crate::registry::LiveInstance;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};

/// Resolved bean instance returned by `Container::instance`.
///
/// For dependent beans the handle owns the instance and its dependents:
/// they are destroyed by [`InstanceHandle::destroy`] or when the handle is
/// dropped. For every other scope the handle only borrows the live
/// instance, and `destroy` removes it from its context.
pub struct InstanceHandle<T> {
    bean: BeanId,
    scope: ScopeKind,
    instance: Arc<T>,
    owned: Option<LiveInstance>,
    container: Weak<ContainerInner>,
}

impl<T> InstanceHandle<T> {
    pub(crate) fn contextual(
        bean: BeanId,
        scope: ScopeKind,
        instance: Arc<T>,
        container: Weak<ContainerInner>,
    ) -> Self {
        Self {
            bean,
            scope,
            instance,
            owned: None,
            container,
        }
    }

    pub(crate) fn owned(record: LiveInstance, instance: Arc<T>, container: Weak<ContainerInner>) -> Self {
        Self {
            bean: record.bean_id().clone(),
            scope: ScopeKind::Dependent,
            instance,
            owned: Some(record),
            container,
        }
    }

    /// Id of the resolved bean.
    pub fn bean_id(&self) -> &BeanId {
        &self.bean
    }

    /// Scope of the resolved bean.
    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    /// The resolved instance.
    pub fn get(&self) -> &Arc<T> {
        &self.instance
    }

    /// Destroy the instance this handle refers to.
    pub fn destroy(mut self) -> Result<(), ArcError> {
        match self.owned.take() {
            Some(record) => destroy_owned(&record, self.scope),
            None => {
                let container = self.container.upgrade().ok_or(ArcError::ContainerShutDown)?;
                container.destroy_instance(&self.bean, self.scope).map(|_| ())
            }
        }
    }
}

fn destroy_owned(record: &LiveInstance, scope: ScopeKind) -> Result<(), ArcError> {
    let mut failures = Vec::new();
    record.destroy(&mut failures);
    if failures.is_empty() {
        Ok(())
    } else {
        Err(ArcError::Teardown { scope, failures })
    }
}

impl<T> Deref for InstanceHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.instance
    }
}

impl<T> Drop for InstanceHandle<T> {
    fn drop(&mut self) {
        if let Some(record) = self.owned.take() {
            if let Err(err) = destroy_owned(&record, self.scope) {
                log::error!("InstanceHandle {}: {}", self.bean, err);
            }
        }
    }
}

impl<T> fmt::Debug for InstanceHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceHandle")
            .field("bean", &self.bean)
            .field("scope", &self.scope)
            .field("owned", &self.owned.is_some())
            .finish()
    }
}
