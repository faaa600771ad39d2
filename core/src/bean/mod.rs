//! Bean identity, scopes and definitions.

pub mod definition;
pub mod types;

pub use definition::{BeanDefinition, BeanDefinitionBuilder, Instance};
pub use types::{BeanId, ScopeKind};
