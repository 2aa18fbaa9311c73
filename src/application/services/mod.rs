//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on boundary traits (OrganisationUnitStore,
//! GroupClassifier) but are themselves concrete structs, not traits.

mod resolver;

pub use resolver::OrganisationResolver;
