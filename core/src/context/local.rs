//! Thread-local bindings of managed scopes and the creation stack.
//!
//! Only activate/deactivate/terminate write the bindings.

use crate::bean::{BeanId, ScopeKind};
use crate::errors::ArcError;
use crate::registry::InstanceRegistry;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BindingKey {
    pub(crate) container: u64,
    pub(crate) scope: ScopeKind,
}

thread_local! {
    static BINDINGS: RefCell<HashMap<BindingKey, Arc<InstanceRegistry>>> = RefCell::new(HashMap::new());
    static CREATION_STACK: RefCell<Vec<BeanId>> = const { RefCell::new(Vec::new()) };
}

/// Registry bound to `key` on this thread.
pub(crate) fn current(key: BindingKey) -> Option<Arc<InstanceRegistry>> {
    BINDINGS.with(|bindings| bindings.borrow().get(&key).cloned())
}

pub(crate) fn is_bound(key: BindingKey) -> bool {
    BINDINGS.with(|bindings| bindings.borrow().contains_key(&key))
}

/// Bind `registry` unless `key` is already bound.
pub(crate) fn bind(key: BindingKey, registry: Arc<InstanceRegistry>) -> bool {
    BINDINGS.with(|bindings| {
        let mut bindings = bindings.borrow_mut();
        if bindings.contains_key(&key) {
            return false;
        }
        bindings.insert(key, registry);
        true
    })
}

pub(crate) fn unbind(key: BindingKey) -> Option<Arc<InstanceRegistry>> {
    BINDINGS.with(|bindings| bindings.borrow_mut().remove(&key))
}

/// Every registry of `container` bound on this thread.
pub(crate) fn bound_for(container: u64) -> Vec<Arc<InstanceRegistry>> {
    BINDINGS.with(|bindings| {
        bindings
            .borrow()
            .iter()
            .filter(|(key, _)| key.container == container)
            .map(|(_, registry)| Arc::clone(registry))
            .collect()
    })
}

/// True while a factory for `bean` is running on this thread.
pub(crate) fn is_under_construction(bean: &BeanId) -> bool {
    CREATION_STACK.with(|stack| stack.borrow().contains(bean))
}

pub(crate) fn circular_dependency(bean: &BeanId) -> ArcError {
    CREATION_STACK.with(|stack| {
        let stack = stack.borrow();
        let start = stack.iter().position(|id| id == bean).unwrap_or(0);
        let mut chain: Vec<String> = stack[start..].iter().map(ToString::to_string).collect();
        chain.push(bean.to_string());
        ArcError::CircularDependency {
            chain: chain.join(" -> "),
        }
    })
}

/// Frame on the creation stack; popped on drop.
pub(crate) struct CreationFrame {
    _private: (),
}

impl CreationFrame {
    pub(crate) fn enter(bean: &BeanId, max_depth: usize) -> Result<Self, ArcError> {
        if is_under_construction(bean) {
            return Err(circular_dependency(bean));
        }
        CREATION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.len() >= max_depth {
                return Err(ArcError::creation(
                    bean,
                    format!("resolution depth exceeds {}", max_depth),
                ));
            }
            stack.push(bean.clone());
            Ok(CreationFrame { _private: () })
        })
    }
}

impl Drop for CreationFrame {
    fn drop(&mut self) {
        CREATION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
