//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, RegistrationStore)
//! but are themselves concrete structs, not traits.

mod builder;
mod prune;
mod registry;
mod selection;

pub use builder::FontTreeBuilder;
pub use prune::{PruneOutcome, StalePruner};
pub use registry::{RegistryService, RegistryStatus};
pub use selection::{SelectionService, StoreFailure, ToggleReport};
