//! Bean identifiers and scope kinds.

use serde::{Serialize, Serializer};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Lifecycle policy of a bean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// One instance per container, created on first use and destroyed at shutdown.
    Singleton,
    /// One instance per container, always active.
    Application,
    /// One instance per activation window on the calling thread.
    Request,
    /// A fresh instance per injection point, owned by the bean it was injected into.
    Dependent,
    /// A caller-defined scope driven through a managed context, like `Request`.
    Custom(&'static str),
}

impl ScopeKind {
    /// Scopes whose state is thread-affine and driven by activate/deactivate/terminate.
    pub fn is_managed(&self) -> bool {
        matches!(self, ScopeKind::Request | ScopeKind::Custom(_))
    }

    /// Scopes backed by one container-wide registry.
    pub fn is_shared(&self) -> bool {
        matches!(self, ScopeKind::Singleton | ScopeKind::Application)
    }

    /// Every scope except `Dependent` has a live instance a proxy can forward to.
    pub fn is_proxyable(&self) -> bool {
        !matches!(self, ScopeKind::Dependent)
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Singleton => f.write_str("singleton"),
            ScopeKind::Application => f.write_str("application"),
            ScopeKind::Request => f.write_str("request"),
            ScopeKind::Dependent => f.write_str("dependent"),
            ScopeKind::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// **BEAN IDENTIFIER**
///
/// **PURPOSE**: Stable lookup key for one bean declaration: the bean type
/// plus an optional qualifier.
/// **GUARANTEE**: Equality and hashing ignore the type name and use the
/// `TypeId`, so two ids for the same type and qualifier always match.
#[derive(Clone)]
pub struct BeanId {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Option<Arc<str>>,
}

impl BeanId {
    /// Unqualified id of `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifier: None,
        }
    }

    /// Id of `T` with the given qualifier.
    pub fn qualified<T: Any>(qualifier: impl Into<String>) -> Self {
        Self::of::<T>().with_qualifier(qualifier)
    }

    /// Replace the qualifier.
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(Arc::from(qualifier.into()));
        self
    }

    /// Fully qualified Rust type name of the bean.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Qualifier, if any.
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// True when instances of this bean are of type `T`.
    pub fn is_type<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    fn short_name(&self) -> &'static str {
        let base = self.type_name.split('<').next().unwrap_or(self.type_name);
        match base.rfind("::") {
            Some(idx) => &self.type_name[idx + 2..],
            None => self.type_name,
        }
    }
}

impl PartialEq for BeanId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for BeanId {}

impl Hash for BeanId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Display for BeanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}[{}]", self.short_name(), qualifier),
            None => f.write_str(self.short_name()),
        }
    }
}

impl fmt::Debug for BeanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanId")
            .field("type", &self.type_name)
            .field("qualifier", &self.qualifier)
            .finish()
    }
}

impl Serialize for BeanId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Button;
    struct Controller;

    #[test]
    fn test_same_type_same_id() {
        assert_eq!(BeanId::of::<Button>(), BeanId::of::<Button>());
        assert_ne!(BeanId::of::<Button>(), BeanId::of::<Controller>());
    }

    #[test]
    fn test_qualifier_distinguishes_ids() {
        let plain = BeanId::of::<Button>();
        let red = BeanId::qualified::<Button>("red");
        let blue = BeanId::qualified::<Button>("blue");

        let ids: HashSet<_> = [plain.clone(), red.clone(), blue, red.clone()]
            .into_iter()
            .collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(red.qualifier(), Some("red"));
        assert_eq!(plain.qualifier(), None);
    }

    #[test]
    fn test_display_uses_short_name() {
        assert_eq!(BeanId::of::<Button>().to_string(), "Button");
        assert_eq!(BeanId::qualified::<Button>("red").to_string(), "Button[red]");
        assert_eq!(BeanId::of::<Vec<u8>>().to_string(), "Vec<u8>");
    }

    #[test]
    fn test_scope_classification() {
        assert!(ScopeKind::Request.is_managed());
        assert!(ScopeKind::Custom("conversation").is_managed());
        assert!(!ScopeKind::Application.is_managed());
        assert!(ScopeKind::Singleton.is_shared());
        assert!(ScopeKind::Singleton.is_proxyable());
        assert!(!ScopeKind::Dependent.is_proxyable());
        assert_eq!(ScopeKind::Custom("session").to_string(), "custom:session");
    }

    #[test]
    fn test_bean_id_serializes_as_string() {
        let value = serde_json::to_value(BeanId::qualified::<Button>("red")).unwrap();
        assert_eq!(value, serde_json::json!("Button[red]"));
    }
}
