//! Client proxies for contextual beans.

use crate::bean::{BeanDefinition, BeanId, ScopeKind};
use crate::container::ContainerInner;
use crate::errors::ArcError;
use crate::proxy::downcast;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

/// Shared target of every proxy handed out for one bean.
pub(crate) struct ProxyTarget {
    bean: Arc<BeanDefinition>,
    container: Weak<ContainerInner>,
}

impl ProxyTarget {
    pub(crate) fn new(bean: Arc<BeanDefinition>, container: Weak<ContainerInner>) -> Self {
        Self { bean, container }
    }
}

/// **CLIENT PROXY**
///
/// **PURPOSE**: Stable stand-in for a contextual bean. Holds the bean id
/// and a lookup path, never the instance.
/// **GUARANTEE**: Every call resolves the live instance of the scope that
/// is active on the calling thread, so a proxy stays valid across
/// activate/deactivate cycles and thread hand-offs. Outside an activation
/// window every call fails with `ContextNotActive`; no stray instance is
/// ever created.
///
/// Beans expose their capability trait on the proxy by forwarding through
/// [`ClientProxy::with`]:
///
/// ```ignore
/// impl Greeter for ClientProxy<EnglishGreeter> {
///     fn greet(&self, name: &str) -> Result<String, ArcError> {
///         self.with(|bean| bean.greet(name))?
///     }
/// }
/// ```
pub struct ClientProxy<T> {
    target: Arc<ProxyTarget>,
    _bean: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClientProxy<T> {
    pub(crate) fn new(target: Arc<ProxyTarget>) -> Self {
        Self {
            target,
            _bean: PhantomData,
        }
    }

    /// Id of the proxied bean.
    pub fn bean_id(&self) -> &BeanId {
        self.target.bean.id()
    }

    /// Scope of the proxied bean.
    pub fn scope(&self) -> ScopeKind {
        self.target.bean.scope()
    }

    /// Resolve the current live instance, creating it in the active scope if needed.
    pub fn get(&self) -> Result<Arc<T>, ArcError> {
        let container = self
            .target
            .container
            .upgrade()
            .ok_or(ArcError::ContainerShutDown)?;
        let instance = container.resolve(&self.target.bean)?;
        downcast::<T>(self.bean_id(), instance)
    }

    /// Forward one call to the current live instance.
    pub fn with<R, F>(&self, call: F) -> Result<R, ArcError>
    where
        F: FnOnce(&T) -> R,
    {
        let bean = self.get()?;
        Ok(call(&bean))
    }

    /// True when a call made now on this thread would reach a live scope.
    pub fn is_resolvable(&self) -> bool {
        match self.target.container.upgrade() {
            Some(container) => container.is_scope_active(self.scope()),
            None => false,
        }
    }

    /// True when both proxies are the same proxy object.
    pub fn same_proxy(&self, other: &ClientProxy<T>) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
    }
}

impl<T> Clone for ClientProxy<T> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
            _bean: PhantomData,
        }
    }
}

impl<T> PartialEq for ClientProxy<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
    }
}

impl<T> Eq for ClientProxy<T> {}

impl<T> Hash for ClientProxy<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.target) as usize).hash(state);
    }
}

impl<T> fmt::Debug for ClientProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientProxy")
            .field("bean", self.target.bean.id())
            .field("scope", &self.target.bean.scope())
            .finish()
    }
}
