//! Per-scope instance registry.

use crate::bean::{BeanId, Instance, ScopeKind};
use crate::errors::{ArcError, DestroyFailure};
use crate::registry::instance::LiveInstance;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

// Registry counter for diagnostics and log correlation
static REGISTRY_COUNTER: AtomicU64 = AtomicU64::new(1);

type Slot = Arc<OnceCell<Arc<LiveInstance>>>;

/// **INSTANCE REGISTRY**
///
/// **PURPOSE**: Live instances of one scope, keyed by bean id.
/// **GUARANTEE**: At most one live instance per bean id, even when several
/// call paths resolve the same bean concurrently.
///
/// Records are kept in completion order. A bean's eagerly resolved
/// dependencies complete before the bean itself, so destroying in reverse
/// order never destroys a dependency before its dependent.
pub struct InstanceRegistry {
    id: u64,
    container_id: u64,
    scope: ScopeKind,
    slots: Mutex<HashMap<BeanId, Slot>>,
    order: Mutex<Vec<Arc<LiveInstance>>>,
    destroyed: AtomicBool,
}

impl InstanceRegistry {
    pub(crate) fn new(container_id: u64, scope: ScopeKind) -> Self {
        Self {
            id: REGISTRY_COUNTER.fetch_add(1, Ordering::Relaxed),
            container_id,
            scope,
            slots: Mutex::new(HashMap::new()),
            order: Mutex::new(Vec::new()),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Registry identifier, unique per process.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Scope whose instances this registry holds.
    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    pub(crate) fn container_id(&self) -> u64 {
        self.container_id
    }

    /// True once `destroy_all` has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Number of live instances, dependents not counted.
    pub fn len(&self) -> usize {
        self.order.lock().len()
    }

    /// True when no instance is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bean ids of the live instances, oldest first.
    pub fn bean_ids(&self) -> Vec<BeanId> {
        self.order
            .lock()
            .iter()
            .map(|record| record.bean_id().clone())
            .collect()
    }

    /// True when `bean` has a live instance.
    pub fn contains(&self, bean: &BeanId) -> bool {
        self.lookup(bean).is_some()
    }

    /// Live instance for `bean`, without creating one.
    pub fn lookup(&self, bean: &BeanId) -> Option<Instance> {
        let slot = self.slots.lock().get(bean).cloned()?;
        slot.get().map(|record| Arc::clone(record.instance()))
    }

    /// **INSERT-IF-ABSENT**
    ///
    /// Returns the live instance for `bean`, running `create` when there is
    /// none. Concurrent callers for the same bean wait for the first one;
    /// callers for other beans are not blocked. A failed `create` leaves the
    /// slot empty so a later call may retry.
    pub(crate) fn get_or_create<F>(&self, bean: &BeanId, create: F) -> Result<Instance, ArcError>
    where
        F: FnOnce() -> Result<LiveInstance, ArcError>,
    {
        if self.is_destroyed() {
            return Err(ArcError::ContextNotActive { scope: self.scope });
        }

        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(bean.clone()).or_default())
        };

        if let Some(record) = slot.get() {
            log::trace!("Registry {}: hit for {}", self.id, bean);
            return Ok(Arc::clone(record.instance()));
        }

        let record = slot.get_or_try_init(|| {
            let record = Arc::new(create()?);
            let mut order = self.order.lock();
            // Teardown may have drained the registry while the factory ran
            if self.is_destroyed() {
                drop(order);
                let mut failures = Vec::new();
                record.destroy(&mut failures);
                log::debug!(
                    "Registry {} ({}): destroyed {} created during teardown",
                    self.id,
                    self.scope,
                    bean
                );
                return Err(ArcError::ContextNotActive { scope: self.scope });
            }
            order.push(Arc::clone(&record));
            drop(order);
            log::debug!(
                "Registry {} ({}): created {}",
                self.id,
                self.scope,
                bean
            );
            Ok::<_, ArcError>(record)
        })?;
        Ok(Arc::clone(record.instance()))
    }

    /// Remove and destroy the live instance of one bean.
    ///
    /// Returns `Ok(false)` when there was none. A slot whose instance is
    /// still being created is left in place.
    pub(crate) fn destroy_one(&self, bean: &BeanId) -> Result<bool, ArcError> {
        let record = {
            let mut slots = self.slots.lock();
            let record = match slots.get(bean).and_then(|slot| slot.get()) {
                Some(record) => Arc::clone(record),
                None => return Ok(false),
            };
            slots.remove(bean);
            record
        };
        self.order.lock().retain(|other| !Arc::ptr_eq(other, &record));

        let mut failures = Vec::new();
        record.destroy(&mut failures);
        if failures.is_empty() {
            Ok(true)
        } else {
            Err(ArcError::Teardown {
                scope: self.scope,
                failures,
            })
        }
    }

    /// **TEARDOWN**
    ///
    /// Marks the registry destroyed and destroys every record, newest first.
    /// Every destructor runs even when earlier ones fail. A second call
    /// destroys nothing. Returns the number of destroyed instances (including
    /// dependents) and the collected failures.
    pub(crate) fn destroy_all(&self) -> (usize, Vec<DestroyFailure>) {
        let records = {
            let mut order = self.order.lock();
            if self.destroyed.swap(true, Ordering::AcqRel) {
                return (0, Vec::new());
            }
            std::mem::take(&mut *order)
        };
        self.slots.lock().clear();

        let mut failures = Vec::new();
        let mut destroyed = 0;
        for record in records.iter().rev() {
            destroyed += record.destroy(&mut failures);
        }
        log::debug!(
            "Registry {} ({}): destroyed {} instance(s), {} failure(s)",
            self.id,
            self.scope,
            destroyed,
            failures.len()
        );
        (destroyed, failures)
    }
}

impl fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("live", &self.len())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::BeanDefinition;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[derive(Debug)]
    struct Token(usize);

    fn live(value: usize) -> Result<LiveInstance, ArcError> {
        let definition = BeanDefinition::builder(ScopeKind::Request, |_| Ok(Token(0))).build();
        Ok(LiveInstance::new(
            Arc::new(definition),
            Arc::new(Token(value)),
            Vec::new(),
        ))
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let registry = InstanceRegistry::new(1, ScopeKind::Request);
        let id = BeanId::of::<Token>();

        let first = registry.get_or_create(&id, || live(1)).unwrap();
        let second = registry.get_or_create(&id, || live(2)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.downcast_ref::<Token>().unwrap().0, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_failed_creation_can_retry() {
        let registry = InstanceRegistry::new(1, ScopeKind::Request);
        let id = BeanId::of::<Token>();

        let err = registry
            .get_or_create(&id, || Err(ArcError::creation(&id, "not yet")))
            .unwrap_err();
        assert!(matches!(err, ArcError::Creation { .. }));
        assert!(!registry.contains(&id));

        assert!(registry.get_or_create(&id, || live(3)).is_ok());
        assert!(registry.contains(&id));
    }

    #[test]
    fn test_concurrent_resolution_creates_once() {
        let registry = Arc::new(InstanceRegistry::new(1, ScopeKind::Request));
        let created = Arc::new(AtomicUsize::new(0));
        let id = BeanId::of::<Token>();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let created = Arc::clone(&created);
                let id = id.clone();
                thread::spawn(move || {
                    registry
                        .get_or_create(&id, || {
                            created.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(std::time::Duration::from_millis(5));
                            live(9)
                        })
                        .unwrap()
                })
            })
            .collect();

        let instances: Vec<Instance> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_destroyed_registry_rejects_resolution() {
        let registry = InstanceRegistry::new(1, ScopeKind::Request);
        let id = BeanId::of::<Token>();
        registry.get_or_create(&id, || live(1)).unwrap();

        let (destroyed, failures) = registry.destroy_all();
        assert_eq!(destroyed, 1);
        assert!(failures.is_empty());
        assert!(registry.is_empty());
        assert_eq!(registry.destroy_all().0, 0);

        let err = registry.get_or_create(&id, || live(2)).unwrap_err();
        assert!(matches!(err, ArcError::ContextNotActive { .. }));
    }

    #[test]
    fn test_destroy_one_allows_recreation() {
        let registry = InstanceRegistry::new(1, ScopeKind::Request);
        let id = BeanId::of::<Token>();
        let first = registry.get_or_create(&id, || live(1)).unwrap();

        assert!(registry.destroy_one(&id).unwrap());
        assert!(!registry.destroy_one(&id).unwrap());

        let second = registry.get_or_create(&id, || live(2)).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    fn counted(value: usize, destroyed: &Arc<AtomicUsize>) -> Result<LiveInstance, ArcError> {
        let destroyed = Arc::clone(destroyed);
        let definition = BeanDefinition::builder(ScopeKind::Application, |_| Ok(Token(0)))
            .destructor(move |_: &Token| {
                destroyed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build();
        Ok(LiveInstance::new(
            Arc::new(definition),
            Arc::new(Token(value)),
            Vec::new(),
        ))
    }

    #[test]
    fn test_instance_finished_during_teardown_is_destroyed() {
        let registry = InstanceRegistry::new(1, ScopeKind::Application);
        let destroyed = Arc::new(AtomicUsize::new(0));
        let id = BeanId::of::<Token>();

        let err = registry
            .get_or_create(&id, || {
                // Teardown lands while the factory is still running
                assert_eq!(registry.destroy_all().0, 0);
                counted(1, &destroyed)
            })
            .unwrap_err();

        assert!(matches!(err, ArcError::ContextNotActive { .. }));
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
        assert!(!registry.contains(&id));
    }

    #[test]
    fn test_destroy_one_skips_instance_under_construction() {
        let registry = InstanceRegistry::new(1, ScopeKind::Application);
        let destroyed = Arc::new(AtomicUsize::new(0));
        let id = BeanId::of::<Token>();

        let first = registry
            .get_or_create(&id, || {
                assert!(!registry.destroy_one(&id).unwrap());
                counted(1, &destroyed)
            })
            .unwrap();
        let second = registry.get_or_create(&id, || counted(2, &destroyed)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert_eq!(destroyed.load(Ordering::SeqCst), 0);
    }
}
