//! RAII activation windows.

use crate::context::managed::ManagedContext;
use crate::errors::ArcError;
use crate::registry::ContextState;
use std::sync::Arc;

/// Guard returned by `ManagedContext::activate_guarded`.
///
/// Dropping the guard while the window is still open terminates it and
/// logs any teardown failure. Request-boundary adapters hold one guard per
/// inbound call.
pub struct ActivationGuard {
    context: Arc<ManagedContext>,
    armed: bool,
}

impl ActivationGuard {
    pub(crate) fn new(context: Arc<ManagedContext>) -> Self {
        Self {
            context,
            armed: true,
        }
    }

    /// The guarded context.
    pub fn context(&self) -> &Arc<ManagedContext> {
        &self.context
    }

    /// Capture the current state without ending the window.
    pub fn state(&self) -> Result<ContextState, ArcError> {
        self.context.state()
    }

    /// Capture the state and deactivate; the instances survive in the returned state.
    pub fn suspend(mut self) -> Result<ContextState, ArcError> {
        self.armed = false;
        let state = self.context.state()?;
        self.context.deactivate()?;
        Ok(state)
    }

    /// End the window, destroying every live instance.
    pub fn terminate(mut self) -> Result<(), ArcError> {
        self.armed = false;
        self.context.terminate()
    }
}

impl Drop for ActivationGuard {
    fn drop(&mut self) {
        if !self.armed || !self.context.is_active() {
            return;
        }
        if let Err(err) = self.context.terminate() {
            log::error!(
                "ActivationGuard: terminating scope {} failed: {}",
                self.context.scope(),
                err
            );
        }
    }
}
