//! Process-global container access.
//!
//! Adapters that cannot thread a [`Container`] through their call chain
//! initialise one container at startup and look it up here.

use crate::container::{Container, ContainerBuilder};
use crate::errors::ArcError;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// Global container slot
static CONTAINER: Lazy<RwLock<Option<Container>>> = Lazy::new(|| RwLock::new(None));

/// Build and install the global container.
///
/// Returns the installed container unchanged when one is already running.
pub fn initialize(builder: ContainerBuilder) -> Result<Container, ArcError> {
    let mut slot = CONTAINER.write();
    if let Some(existing) = slot.as_ref() {
        if existing.is_running() {
            return Ok(existing.clone());
        }
    }
    let container = builder.build()?;
    log::debug!("Installed global container {}", container.id());
    *slot = Some(container.clone());
    Ok(container)
}

/// The global container, if one is installed.
pub fn container() -> Option<Container> {
    CONTAINER.read().clone()
}

/// Remove the global container and shut it down.
pub fn shutdown() -> Result<(), ArcError> {
    let taken = CONTAINER.write().take();
    match taken {
        Some(container) => container.shutdown(),
        None => Ok(()),
    }
}
