//! # ARC CONTAINER
//!
//! **COMPOSITION ROOT**: maps bean ids to definitions and to the context
//! that governs their scope, and hands out client proxies.

pub mod arc;
pub mod builder;
pub mod config;
pub mod snapshot;

pub use builder::ContainerBuilder;
pub use config::ContainerConfig;
pub use snapshot::{BeanSummary, ContainerSnapshot, RegistrySummary};

use crate::bean::{BeanDefinition, BeanId, Instance, ScopeKind};
use crate::context::local::{self, CreationFrame};
use crate::context::{ContextObserver, CreationalContext, ManagedContext, SharedContext};
use crate::errors::ArcError;
use crate::proxy::client::ProxyTarget;
use crate::proxy::{downcast, ClientProxy, InstanceHandle};
use crate::registry::LiveInstance;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

// Container counter; keys the thread-local scope bindings
static CONTAINER_COUNTER: AtomicU64 = AtomicU64::new(1);

pub(crate) struct ContainerInner {
    id: u64,
    config: ContainerConfig,
    beans: HashMap<BeanId, Arc<BeanDefinition>>,
    singleton: SharedContext,
    application: SharedContext,
    managed: RwLock<HashMap<ScopeKind, Arc<ManagedContext>>>,
    proxies: Mutex<HashMap<BeanId, Arc<ProxyTarget>>>,
    observers: Arc<[Arc<dyn ContextObserver>]>,
    running: AtomicBool,
}

impl ContainerInner {
    fn new(
        config: ContainerConfig,
        beans: HashMap<BeanId, Arc<BeanDefinition>>,
        observers: Vec<Arc<dyn ContextObserver>>,
    ) -> Self {
        let id = CONTAINER_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            config,
            beans,
            singleton: SharedContext::new(id, ScopeKind::Singleton),
            application: SharedContext::new(id, ScopeKind::Application),
            managed: RwLock::new(HashMap::new()),
            proxies: Mutex::new(HashMap::new()),
            observers: observers.into(),
            running: AtomicBool::new(true),
        }
    }

    pub(crate) fn config(&self) -> &ContainerConfig {
        &self.config
    }

    fn ensure_running(&self) -> Result<(), ArcError> {
        if self.running.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(ArcError::ContainerShutDown)
        }
    }

    pub(crate) fn lookup(&self, id: &BeanId) -> Result<Arc<BeanDefinition>, ArcError> {
        self.beans
            .get(id)
            .cloned()
            .ok_or_else(|| ArcError::UnknownBean { bean: id.clone() })
    }

    fn managed_or_insert(&self, scope: ScopeKind) -> Arc<ManagedContext> {
        if let Some(context) = self.managed.read().get(&scope) {
            return Arc::clone(context);
        }
        let mut managed = self.managed.write();
        let context = managed.entry(scope).or_insert_with(|| {
            Arc::new(ManagedContext::new(
                self.id,
                scope,
                self.config.warn_on_orphaned_state,
                Arc::clone(&self.observers),
            ))
        });
        Arc::clone(context)
    }

    pub(crate) fn managed_context(&self, scope: ScopeKind) -> Result<Arc<ManagedContext>, ArcError> {
        if !scope.is_managed() {
            return Err(ArcError::ScopeNotManaged { scope });
        }
        Ok(self.managed_or_insert(scope))
    }

    fn shared_context(&self, scope: ScopeKind) -> Option<&SharedContext> {
        match scope {
            ScopeKind::Singleton => Some(&self.singleton),
            ScopeKind::Application => Some(&self.application),
            _ => None,
        }
    }

    pub(crate) fn is_scope_active(&self, scope: ScopeKind) -> bool {
        if self.ensure_running().is_err() {
            return false;
        }
        if let Some(shared) = self.shared_context(scope) {
            return shared.is_active();
        }
        scope.is_managed() && self.managed_or_insert(scope).is_active()
    }

    /// **RESOLVE** - live instance of `bean` in the context governing its scope.
    pub(crate) fn resolve(self: &Arc<Self>, bean: &Arc<BeanDefinition>) -> Result<Instance, ArcError> {
        self.ensure_running()?;
        let id = bean.id();
        // Re-entering a slot that is being initialised on this thread would deadlock
        if local::is_under_construction(id) {
            return Err(local::circular_dependency(id));
        }
        let create = || self.create(bean);
        match bean.scope() {
            ScopeKind::Singleton => self.singleton.resolve(id, create),
            ScopeKind::Application => self.application.resolve(id, create),
            ScopeKind::Dependent => Err(ArcError::Unproxyable {
                bean: id.clone(),
                scope: ScopeKind::Dependent,
            }),
            scope => self.managed_or_insert(scope).resolve(id, create),
        }
    }

    /// **CREATE** - run the factory of `bean` and record what it injected.
    pub(crate) fn create(self: &Arc<Self>, bean: &Arc<BeanDefinition>) -> Result<LiveInstance, ArcError> {
        let _frame = CreationFrame::enter(bean.id(), self.config.max_resolution_depth)?;
        let mut ctx = CreationalContext::new(self, bean);
        match bean.create(&mut ctx) {
            Ok(instance) => Ok(LiveInstance::new(
                Arc::clone(bean),
                instance,
                ctx.into_dependents(),
            )),
            Err(err) => {
                let failures = ctx.abandon();
                if !failures.is_empty() {
                    log::warn!(
                        "Container {}: creating {} failed and {} dependent destructor(s) failed during cleanup",
                        self.id,
                        bean.id(),
                        failures.len()
                    );
                }
                Err(err)
            }
        }
    }

    pub(crate) fn proxy<T: Any + Send + Sync>(self: &Arc<Self>, id: &BeanId) -> Result<ClientProxy<T>, ArcError> {
        self.ensure_running()?;
        let bean = self.lookup(id)?;
        if !id.is_type::<T>() {
            return Err(ArcError::TypeMismatch {
                bean: id.clone(),
                expected: std::any::type_name::<T>(),
            });
        }
        if !bean.scope().is_proxyable() {
            return Err(ArcError::Unproxyable {
                bean: id.clone(),
                scope: bean.scope(),
            });
        }
        let target = {
            let mut proxies = self.proxies.lock();
            let target = proxies.entry(id.clone()).or_insert_with(|| {
                log::debug!("Container {}: created client proxy for {}", self.id, id);
                Arc::new(ProxyTarget::new(Arc::clone(&bean), Arc::downgrade(self)))
            });
            Arc::clone(target)
        };
        Ok(ClientProxy::new(target))
    }

    pub(crate) fn destroy_instance(&self, id: &BeanId, scope: ScopeKind) -> Result<bool, ArcError> {
        if let Some(shared) = self.shared_context(scope) {
            return shared.destroy_instance(id);
        }
        if scope.is_managed() {
            return self.managed_or_insert(scope).destroy_instance(id);
        }
        Ok(false)
    }

    fn shutdown(&self) -> Result<(), ArcError> {
        if !self.running.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        log::debug!("Container {}: shutting down", self.id);

        let mut first_failed = None;
        let mut failures = Vec::new();
        let mut collect = |result: Result<(), ArcError>| {
            if let Err(err) = result {
                match err {
                    ArcError::Teardown {
                        scope,
                        failures: more,
                    } => {
                        first_failed.get_or_insert(scope);
                        failures.extend(more);
                    }
                    other => log::error!("Container {}: {}", self.id, other),
                }
            }
        };

        // Only the calling thread's windows are reachable from here.
        for registry in local::bound_for(self.id) {
            let context = self.managed_or_insert(registry.scope());
            collect(context.terminate());
        }
        collect(self.application.destroy());
        collect(self.singleton.destroy());
        self.proxies.lock().clear();

        match first_failed {
            None => Ok(()),
            Some(scope) => Err(ArcError::Teardown { scope, failures }),
        }
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        if !self.config.destroy_on_drop || !self.running.load(Ordering::Acquire) {
            return;
        }
        if let Err(err) = self.shutdown() {
            log::error!("Container {}: shutdown on drop failed: {}", self.id, err);
        }
    }
}

/// **CONTAINER**
///
/// **PURPOSE**: Process-wide registry of bean definitions and the contexts
/// governing their scopes. Cheap to clone; clones share one container.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Start building a container.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub(crate) fn from_parts(
        config: ContainerConfig,
        beans: HashMap<BeanId, Arc<BeanDefinition>>,
        observers: Vec<Arc<dyn ContextObserver>>,
    ) -> Self {
        Self {
            inner: Arc::new(ContainerInner::new(config, beans, observers)),
        }
    }

    /// Container identifier, unique per process.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Configuration the container was built with.
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// False after shutdown.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Definition registered under `id`.
    pub fn bean(&self, id: &BeanId) -> Result<Arc<BeanDefinition>, ArcError> {
        self.inner.lookup(id)
    }

    /// All definitions, ordered by id.
    pub fn beans(&self) -> Vec<Arc<BeanDefinition>> {
        let mut beans: Vec<_> = self.inner.beans.values().cloned().collect();
        beans.sort_by_key(|bean| bean.id().to_string());
        beans
    }

    /// **GET INSTANCE**
    ///
    /// Returns the client proxy of `id`, created on first request. Every
    /// later request returns the same proxy object.
    pub fn get_instance<T: Any + Send + Sync>(&self, id: &BeanId) -> Result<ClientProxy<T>, ArcError> {
        self.inner.proxy(id)
    }

    /// Client proxy of the unqualified bean of type `T`.
    pub fn select<T: Any + Send + Sync>(&self) -> Result<ClientProxy<T>, ArcError> {
        self.get_instance(&BeanId::of::<T>())
    }

    /// Resolve `id` now and return a handle to the instance.
    ///
    /// Dependent beans are created fresh and owned by the handle.
    pub fn instance<T: Any + Send + Sync>(&self, id: &BeanId) -> Result<InstanceHandle<T>, ArcError> {
        self.inner.ensure_running()?;
        let bean = self.inner.lookup(id)?;
        if !id.is_type::<T>() {
            return Err(ArcError::TypeMismatch {
                bean: id.clone(),
                expected: std::any::type_name::<T>(),
            });
        }
        let container = Arc::downgrade(&self.inner);
        if bean.scope() == ScopeKind::Dependent {
            let record = self.inner.create(&bean)?;
            let instance = downcast::<T>(id, Arc::clone(record.instance()))?;
            return Ok(InstanceHandle::owned(record, instance, container));
        }
        let instance = downcast::<T>(id, self.inner.resolve(&bean)?)?;
        Ok(InstanceHandle::contextual(id.clone(), bean.scope(), instance, container))
    }

    /// **GET CONTEXT FOR SCOPE**
    ///
    /// The managed context governing `scope`; one object per scope kind,
    /// whose active state is per thread.
    pub fn context_for(&self, scope: ScopeKind) -> Result<Arc<ManagedContext>, ArcError> {
        self.inner.managed_context(scope)
    }

    /// The managed context of the request scope.
    pub fn request_context(&self) -> Arc<ManagedContext> {
        self.inner.managed_or_insert(ScopeKind::Request)
    }

    /// The always-active context of a singleton or application scope.
    pub fn shared_context(&self, scope: ScopeKind) -> Result<&SharedContext, ArcError> {
        self.inner
            .shared_context(scope)
            .ok_or(ArcError::ScopeNotManaged { scope })
    }

    /// Diagnostics snapshot as seen from the calling thread.
    pub fn snapshot(&self) -> ContainerSnapshot {
        let beans = self
            .beans()
            .iter()
            .map(|bean| BeanSummary {
                id: bean.id().clone(),
                scope: bean.scope(),
                dependencies: bean.dependencies().to_vec(),
            })
            .collect();
        let shared = vec![
            RegistrySummary::of(self.inner.singleton.registry()),
            RegistrySummary::of(self.inner.application.registry()),
        ];
        let mut active_on_thread: Vec<_> = local::bound_for(self.inner.id)
            .iter()
            .map(|registry| RegistrySummary::of(registry))
            .collect();
        active_on_thread.sort_by_key(|summary| summary.registry_id);

        ContainerSnapshot {
            container_id: self.inner.id,
            running: self.is_running(),
            beans,
            shared,
            active_on_thread,
        }
    }

    /// **SHUTDOWN**
    ///
    /// Terminates the managed contexts active on the calling thread, then
    /// destroys the application and singleton contexts. Idempotent.
    pub fn shutdown(&self) -> Result<(), ArcError> {
        self.inner.shutdown()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("beans", &self.inner.beans.len())
            .field("running", &self.is_running())
            .finish()
    }
}
