//! Remote Trigger Registry
//!
//! Triggers are stored by name as opaque bytes. A [`TriggerLoader`] turns the
//! stored bytes into something that implements [`Trigger`], and a
//! [`TriggerRegistry`] combines storage and loading behind `load`/`save`.
//!
//! The built-in [`DefinitionLoader`] understands small JSON trigger
//! definitions (see [`TriggerDefinition`]).

mod definition;
mod error;
mod fs_registry;
mod memory;
mod registry;
mod trigger;

pub use definition::{DefinitionLoader, TriggerDefinition};
pub use error::{RegistryError, TriggerError};
pub use fs_registry::FsTriggerRegistry;
pub use memory::MemoryTriggerRegistry;
pub use registry::{TriggerLoader, TriggerRegistry, validate_trigger_name};
pub use trigger::Trigger;
