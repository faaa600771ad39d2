//! Instance registries and the records they hold.

pub mod instance;
pub mod state;
pub mod store;

pub use instance::LiveInstance;
pub use state::ContextState;
pub use store::InstanceRegistry;
