//! Public API surface.

pub use crate::bean::{BeanDefinition, BeanId, Instance, ScopeKind};
pub use crate::container::{arc, Container, ContainerBuilder, ContainerConfig, ContainerSnapshot};
pub use crate::context::{ActivationGuard, ContextObserver, CreationalContext, ManagedContext};
pub use crate::errors::{ArcError, DestroyFailure};
pub use crate::proxy::{ClientProxy, InstanceHandle};
pub use crate::registry::ContextState;
