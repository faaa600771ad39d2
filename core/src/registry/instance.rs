//! Live instance records and their teardown.

use crate::bean::{BeanDefinition, BeanId, Instance};
use crate::errors::DestroyFailure;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// **LIVE INSTANCE RECORD**
///
/// A created bean instance together with the dependent-scoped instances
/// that were created to satisfy its injection points, in creation order.
pub struct LiveInstance {
    bean: Arc<BeanDefinition>,
    instance: Instance,
    dependents: Vec<LiveInstance>,
    destroyed: AtomicBool,
}

impl LiveInstance {
    pub(crate) fn new(bean: Arc<BeanDefinition>, instance: Instance, dependents: Vec<LiveInstance>) -> Self {
        Self {
            bean,
            instance,
            dependents,
            destroyed: AtomicBool::new(false),
        }
    }

    /// Id of the bean this instance belongs to.
    pub fn bean_id(&self) -> &BeanId {
        self.bean.id()
    }

    /// The type-erased instance.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Dependent instances in creation order.
    pub fn dependents(&self) -> &[LiveInstance] {
        &self.dependents
    }

    /// True once the destructor has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Run the destructor, then destroy dependents last-created-first.
    ///
    /// Runs at most once per record. Failures and panics are pushed onto
    /// `failures` and never stop the remaining destructors. Returns the
    /// number of instances destroyed by this call.
    pub(crate) fn destroy(&self, failures: &mut Vec<DestroyFailure>) -> usize {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return 0;
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| self.bean.destroy(&self.instance)));
        let message = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(message)) => Some(message),
            Err(payload) => Some(panic_message(payload.as_ref())),
        };
        if let Some(message) = message {
            log::warn!("Destructor of {} failed: {}", self.bean_id(), message);
            failures.push(DestroyFailure {
                bean: self.bean_id().clone(),
                message,
            });
        }

        let mut destroyed = 1;
        for dependent in self.dependents.iter().rev() {
            destroyed += dependent.destroy(failures);
        }
        destroyed
    }
}

impl fmt::Debug for LiveInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveInstance")
            .field("bean", self.bean_id())
            .field("dependents", &self.dependents.len())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("destructor panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("destructor panicked: {}", message)
    } else {
        "destructor panicked".to_string()
    }
}
