//! # ARC CORE LIBRARY
//!
//! **CONTEXTUAL DEPENDENCY-INJECTION RUNTIME**
//!
//! **ARCHITECTURE**: Instance registries per scope, a thread-affine managed
//! context state machine, client proxies and a composition-root container
//! **GUARANTEE**: Exactly one live instance per bean per registry; every
//! destructor runs exactly once, newest instance first
//! **HAND-OFF**: A scope's live instances move between threads only as an
//! explicit `ContextState`
//!
//! ```rust
//! use arc_core::api::*;
//!
//! struct Greeter;
//!
//! let container = Container::builder()
//!     .register(BeanDefinition::builder(ScopeKind::Request, |_| Ok(Greeter)).build())
//!     .build()?;
//! let greeter = container.select::<Greeter>()?;
//! let request = container.request_context();
//!
//! assert!(greeter.get().is_err());
//! request.activate()?;
//! assert!(greeter.get().is_ok());
//! request.terminate()?;
//! # Ok::<(), ArcError>(())
//! ```

pub mod api;
pub mod bean;
pub mod container;
pub mod context;
pub mod errors;
pub mod proxy;
pub mod registry;
