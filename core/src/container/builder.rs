//! Container builder.

use crate::bean::{BeanDefinition, BeanId};
use crate::container::{Container, ContainerConfig};
use crate::context::ContextObserver;
use crate::errors::ArcError;
use std::collections::HashMap;
use std::sync::Arc;

/// Collects bean definitions from the metadata source and builds a [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
    config: ContainerConfig,
    beans: Vec<BeanDefinition>,
    observers: Vec<Arc<dyn ContextObserver>>,
}

impl ContainerBuilder {
    /// Empty builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the container configuration.
    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// Add one bean definition.
    pub fn register(mut self, bean: BeanDefinition) -> Self {
        self.beans.push(bean);
        self
    }

    /// Add every definition yielded by `beans`.
    pub fn register_all(mut self, beans: impl IntoIterator<Item = BeanDefinition>) -> Self {
        self.beans.extend(beans);
        self
    }

    /// Observe lifecycle events of every managed context.
    pub fn observer(mut self, observer: Arc<dyn ContextObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// **BUILD**
    ///
    /// **RETURNS**:
    /// - `Ok(Container)` - running container
    /// - `Err(ArcError::DuplicateBean)` - two definitions share an id
    /// - `Err(ArcError::UnknownBean)` - a declared dependency is not registered
    /// - `Err(ArcError::Config)` - invalid configuration
    pub fn build(self) -> Result<Container, ArcError> {
        self.config.validate()?;

        let mut beans: HashMap<BeanId, Arc<BeanDefinition>> = HashMap::with_capacity(self.beans.len());
        for bean in self.beans {
            let id = bean.id().clone();
            if beans.contains_key(&id) {
                return Err(ArcError::DuplicateBean { bean: id });
            }
            beans.insert(id, Arc::new(bean));
        }

        for bean in beans.values() {
            if let Some(missing) = bean
                .dependencies()
                .iter()
                .find(|dependency| !beans.contains_key(*dependency))
            {
                log::error!("Bean {} declares unknown dependency {}", bean.id(), missing);
                return Err(ArcError::UnknownBean {
                    bean: missing.clone(),
                });
            }
        }

        let container = Container::from_parts(self.config, beans, self.observers);
        log::debug!(
            "Container {}: built with {} bean(s)",
            container.id(),
            container.beans().len()
        );
        Ok(container)
    }
}
