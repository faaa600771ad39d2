//! Contexts: the managed state machine, always-active shared contexts and
//! the creational context handed to factories.

pub mod creational;
pub mod guard;
pub(crate) mod local;
pub mod managed;
pub mod observer;
pub mod shared;

pub use creational::CreationalContext;
pub use guard::ActivationGuard;
pub use managed::ManagedContext;
pub use observer::ContextObserver;
pub use shared::SharedContext;
