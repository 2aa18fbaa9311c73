//! Infrastructure layer: store implementations and DI container
//!
//! This layer implements the boundary traits and wires up services.

pub mod di;
pub mod memory;
pub mod render;
pub mod traits;

pub use di::ServiceContainer;
pub use memory::{InMemoryUnitStore, UnitTreeBuilder};
pub use render::render_unit_tree;
pub use traits::{GroupClassifier, OrganisationUnitStore, StoreError, StoreResult};
