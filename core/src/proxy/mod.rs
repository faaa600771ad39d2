//! Client proxies and instance handles.

pub mod client;
pub mod handle;

pub use client::ClientProxy;
pub use handle::InstanceHandle;

use crate::bean::{BeanId, Instance};
use crate::errors::ArcError;
use std::any::Any;
use std::sync::Arc;

/// View a type-erased instance as `T`.
pub(crate) fn downcast<T: Any + Send + Sync>(bean: &BeanId, instance: Instance) -> Result<Arc<T>, ArcError> {
    instance.downcast::<T>().map_err(|_| ArcError::TypeMismatch {
        bean: bean.clone(),
        expected: std::any::type_name::<T>(),
    })
}
