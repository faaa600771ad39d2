//! # ARC ERROR TAXONOMY
//!
//! **MANDATE**: Every state-machine violation surfaces as a typed `ArcError`.
//! Nothing in the runtime recovers from these silently.

use crate::bean::{BeanId, ScopeKind};
use std::fmt;
use thiserror::Error;

/// **ARC ERROR CODES**
///
/// Stable identifiers for adapters that map failures onto their own
/// reporting channels.
pub mod error_codes {
    pub const CONTEXT_NOT_ACTIVE: &str = "ARC_CONTEXT_NOT_ACTIVE";
    pub const ALREADY_ACTIVE: &str = "ARC_CONTEXT_ALREADY_ACTIVE";
    pub const INVALID_STATE: &str = "ARC_CONTEXT_INVALID_STATE";
    pub const UNKNOWN_BEAN: &str = "ARC_CONTAINER_UNKNOWN_BEAN";
    pub const TEARDOWN: &str = "ARC_CONTEXT_TEARDOWN_FAILED";
    pub const DUPLICATE_BEAN: &str = "ARC_CONTAINER_DUPLICATE_BEAN";
    pub const CREATION: &str = "ARC_BEAN_CREATION_FAILED";
    pub const CIRCULAR_DEPENDENCY: &str = "ARC_BEAN_CIRCULAR_DEPENDENCY";
    pub const TYPE_MISMATCH: &str = "ARC_BEAN_TYPE_MISMATCH";
    pub const UNPROXYABLE: &str = "ARC_BEAN_UNPROXYABLE";
    pub const SCOPE_NOT_MANAGED: &str = "ARC_SCOPE_NOT_MANAGED";
    pub const CONTAINER_SHUT_DOWN: &str = "ARC_CONTAINER_SHUT_DOWN";
    pub const CONFIG: &str = "ARC_CONTAINER_CONFIG";
}

/// A single destructor failure collected during teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyFailure {
    /// Bean whose destructor failed
    pub bean: BeanId,
    /// Error returned by the destructor, or the panic payload
    pub message: String,
}

impl fmt::Display for DestroyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.bean, self.message)
    }
}

/// Failures produced by the contextual runtime.
#[derive(Debug, Error)]
pub enum ArcError {
    /// An operation required an active context and found none.
    #[error("CONTEXT NOT ACTIVE: no active context for scope {scope}")]
    ContextNotActive {
        /// Scope that was not active
        scope: ScopeKind,
    },

    /// `activate` was called on a context that is already active.
    #[error("CONTEXT ALREADY ACTIVE: scope {scope} is already active on this thread")]
    AlreadyActive {
        /// Scope that was already active
        scope: ScopeKind,
    },

    /// A captured state cannot be bound.
    #[error("INVALID CONTEXT STATE: scope {scope} - {reason}")]
    InvalidState {
        /// Scope of the context asked to bind the state
        scope: ScopeKind,
        /// Why the state was rejected
        reason: String,
    },

    /// The identifier is not registered with the container.
    #[error("UNKNOWN BEAN: {bean} is not registered")]
    UnknownBean {
        /// Identifier that was looked up
        bean: BeanId,
    },

    /// One or more destructors failed; all remaining destructors still ran.
    #[error("TEARDOWN ERROR: {} destructor(s) failed while destroying scope {scope}", failures.len())]
    Teardown {
        /// Scope being torn down
        scope: ScopeKind,
        /// Every destructor failure, in teardown order
        failures: Vec<DestroyFailure>,
    },

    /// Two definitions share an identifier.
    #[error("DUPLICATE BEAN: {bean} is registered more than once")]
    DuplicateBean {
        /// Identifier registered twice
        bean: BeanId,
    },

    /// A factory failed to produce an instance.
    #[error("CREATION ERROR: {bean} - {message}")]
    Creation {
        /// Bean whose factory failed
        bean: BeanId,
        /// Failure reported by the factory
        message: String,
    },

    /// A bean transitively requires itself during creation.
    #[error("CIRCULAR DEPENDENCY: {chain}")]
    CircularDependency {
        /// Resolution chain, for example `A -> B -> A`
        chain: String,
    },

    /// The live instance is not of the requested type.
    #[error("TYPE MISMATCH: {bean} cannot be viewed as {expected}")]
    TypeMismatch {
        /// Bean that was resolved
        bean: BeanId,
        /// Requested type name
        expected: &'static str,
    },

    /// Dependent beans have no shared live instance to forward to.
    #[error("UNPROXYABLE BEAN: {bean} has scope {scope} and cannot be proxied")]
    Unproxyable {
        /// Bean that was asked for a proxy
        bean: BeanId,
        /// Its scope
        scope: ScopeKind,
    },

    /// The scope is not governed by a managed context.
    #[error("SCOPE NOT MANAGED: {scope} has no managed context")]
    ScopeNotManaged {
        /// Scope that was asked for
        scope: ScopeKind,
    },

    /// The container backing a proxy or handle is gone.
    #[error("CONTAINER SHUT DOWN: the container is no longer running")]
    ContainerShutDown,

    /// Configuration could not be loaded.
    #[error("CONFIG ERROR: {message}")]
    Config {
        /// What was wrong
        message: String,
    },
}

impl ArcError {
    /// Stable error code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            ArcError::ContextNotActive { .. } => error_codes::CONTEXT_NOT_ACTIVE,
            ArcError::AlreadyActive { .. } => error_codes::ALREADY_ACTIVE,
            ArcError::InvalidState { .. } => error_codes::INVALID_STATE,
            ArcError::UnknownBean { .. } => error_codes::UNKNOWN_BEAN,
            ArcError::Teardown { .. } => error_codes::TEARDOWN,
            ArcError::DuplicateBean { .. } => error_codes::DUPLICATE_BEAN,
            ArcError::Creation { .. } => error_codes::CREATION,
            ArcError::CircularDependency { .. } => error_codes::CIRCULAR_DEPENDENCY,
            ArcError::TypeMismatch { .. } => error_codes::TYPE_MISMATCH,
            ArcError::Unproxyable { .. } => error_codes::UNPROXYABLE,
            ArcError::ScopeNotManaged { .. } => error_codes::SCOPE_NOT_MANAGED,
            ArcError::ContainerShutDown => error_codes::CONTAINER_SHUT_DOWN,
            ArcError::Config { .. } => error_codes::CONFIG,
        }
    }

    /// **CREATION FAILURE CONSTRUCTOR** - for use inside bean factories
    pub fn creation(bean: &BeanId, message: impl Into<String>) -> Self {
        ArcError::Creation {
            bean: bean.clone(),
            message: message.into(),
        }
    }

    /// True for the failures that indicate a misused state machine.
    pub fn is_state_violation(&self) -> bool {
        matches!(
            self,
            ArcError::ContextNotActive { .. }
                | ArcError::AlreadyActive { .. }
                | ArcError::InvalidState { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    #[test]
    fn test_error_codes_exist() {
        assert!(!error_codes::CONTEXT_NOT_ACTIVE.is_empty());
        assert!(!error_codes::ALREADY_ACTIVE.is_empty());
        assert!(!error_codes::INVALID_STATE.is_empty());
        assert!(!error_codes::UNKNOWN_BEAN.is_empty());
        assert!(!error_codes::TEARDOWN.is_empty());
    }

    #[test]
    fn test_codes_follow_variants() {
        let err = ArcError::ContextNotActive {
            scope: ScopeKind::Request,
        };
        assert_eq!(err.code(), error_codes::CONTEXT_NOT_ACTIVE);
        assert!(err.is_state_violation());

        let err = ArcError::UnknownBean {
            bean: BeanId::of::<Probe>(),
        };
        assert_eq!(err.code(), error_codes::UNKNOWN_BEAN);
        assert!(!err.is_state_violation());
    }

    #[test]
    fn test_teardown_message_counts_failures() {
        let failure = DestroyFailure {
            bean: BeanId::of::<Probe>(),
            message: "boom".to_string(),
        };
        let err = ArcError::Teardown {
            scope: ScopeKind::Request,
            failures: vec![failure.clone(), failure],
        };
        let message = err.to_string();
        assert!(message.contains("2 destructor(s)"));
        assert!(message.contains("request"));
    }
}
