//! Bean definitions and their builder.

use crate::bean::types::{BeanId, ScopeKind};
use crate::context::CreationalContext;
use crate::errors::ArcError;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Type-erased handle to a live bean instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

type Factory = Box<dyn Fn(&mut CreationalContext<'_>) -> Result<Instance, ArcError> + Send + Sync>;
type Destructor = Box<dyn Fn(&Instance) -> Result<(), String> + Send + Sync>;

/// **BEAN DEFINITION**
///
/// **PURPOSE**: Everything the container needs to manage one bean: its id,
/// scope, declared dependencies, factory and optional destructor.
pub struct BeanDefinition {
    id: BeanId,
    scope: ScopeKind,
    dependencies: Vec<BeanId>,
    factory: Factory,
    destructor: Option<Destructor>,
}

impl BeanDefinition {
    /// Start a definition for beans of type `T` created by `factory`.
    pub fn builder<T, F>(scope: ScopeKind, factory: F) -> BeanDefinitionBuilder<T>
    where
        T: Any + Send + Sync,
        F: Fn(&mut CreationalContext<'_>) -> Result<T, ArcError> + Send + Sync + 'static,
    {
        BeanDefinitionBuilder {
            id: BeanId::of::<T>(),
            scope,
            dependencies: Vec::new(),
            factory: Box::new(move |ctx| factory(ctx).map(|bean| Arc::new(bean) as Instance)),
            destructor: None,
            _bean: PhantomData,
        }
    }

    /// Bean identifier.
    pub fn id(&self) -> &BeanId {
        &self.id
    }

    /// Declared scope.
    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    /// Identifiers declared with `depends_on`.
    pub fn dependencies(&self) -> &[BeanId] {
        &self.dependencies
    }

    /// True when a destructor was registered.
    pub fn has_destructor(&self) -> bool {
        self.destructor.is_some()
    }

    pub(crate) fn create(&self, ctx: &mut CreationalContext<'_>) -> Result<Instance, ArcError> {
        (self.factory)(ctx)
    }

    pub(crate) fn destroy(&self, instance: &Instance) -> Result<(), String> {
        match &self.destructor {
            Some(destructor) => destructor(instance),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("dependencies", &self.dependencies)
            .field("has_destructor", &self.destructor.is_some())
            .finish()
    }
}

/// Builder returned by [`BeanDefinition::builder`].
pub struct BeanDefinitionBuilder<T> {
    id: BeanId,
    scope: ScopeKind,
    dependencies: Vec<BeanId>,
    factory: Factory,
    destructor: Option<Destructor>,
    _bean: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> BeanDefinitionBuilder<T> {
    /// Qualify the bean id so several definitions of `T` can coexist.
    pub fn qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.id = self.id.with_qualifier(qualifier);
        self
    }

    /// Declare a dependency resolved by the factory.
    pub fn depends_on(mut self, dependency: BeanId) -> Self {
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
        self
    }

    /// Destructor invoked exactly once when the instance leaves its scope.
    pub fn destructor<D>(mut self, destructor: D) -> Self
    where
        D: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    {
        self.destructor = Some(Box::new(move |instance: &Instance| {
            match instance.downcast_ref::<T>() {
                Some(bean) => destructor(bean),
                None => Err(format!(
                    "instance is not a {}",
                    std::any::type_name::<T>()
                )),
            }
        }));
        self
    }

    /// Finish the definition.
    pub fn build(self) -> BeanDefinition {
        BeanDefinition {
            id: self.id,
            scope: self.scope,
            dependencies: self.dependencies,
            factory: self.factory,
            destructor: self.destructor,
        }
    }
}
