//! Diagnostics snapshot of a container.

use crate::bean::{BeanId, ScopeKind};
use crate::registry::InstanceRegistry;
use serde::Serialize;

/// Snapshot of a container for diagnostics.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContainerSnapshot {
    /// Container identifier
    pub container_id: u64,
    /// False after shutdown
    pub running: bool,
    /// Registered beans, sorted by id
    pub beans: Vec<BeanSummary>,
    /// Singleton and application registries
    pub shared: Vec<RegistrySummary>,
    /// Managed registries active on the calling thread
    pub active_on_thread: Vec<RegistrySummary>,
}

/// One registered bean.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BeanSummary {
    /// Bean identifier
    pub id: BeanId,
    /// Declared scope
    pub scope: ScopeKind,
    /// Dependencies declared with `depends_on`
    pub dependencies: Vec<BeanId>,
}

/// One instance registry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegistrySummary {
    /// Registry identifier
    pub registry_id: u64,
    /// Scope of the registry
    pub scope: ScopeKind,
    /// True after teardown
    pub destroyed: bool,
    /// Live instances, oldest first
    pub live_instances: Vec<BeanId>,
}

impl RegistrySummary {
    pub(crate) fn of(registry: &InstanceRegistry) -> Self {
        Self {
            registry_id: registry.id(),
            scope: registry.scope(),
            destroyed: registry.is_destroyed(),
            live_instances: registry.bean_ids(),
        }
    }
}

impl ContainerSnapshot {
    /// Snapshot as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
