//! Hierarchical organisation-unit resolution.
//!
//! `orgtree` resolves ancestor/descendant relationships over an external
//! tree of organisational nodes (facilities, districts, regions, ...). It
//! wraps raw nodes in [`Organisation`] views that lazily cache level,
//! parent, children and classification group, supports skip-level
//! traversal (treating configured intermediate levels as transparent), and
//! classifies nodes against a configured group set.
//!
//! The tree itself lives behind the [`OrganisationUnitStore`] and
//! [`GroupClassifier`] boundary traits. [`InMemoryUnitStore`] is the
//! bundled reference implementation; [`ServiceContainer`] wires settings,
//! store and classifier into an [`OrganisationResolver`].

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod util;

pub use application::{OrganisationResolver, ResolveError, ResolveResult};
pub use config::Settings;
pub use domain::{DomainError, Organisation, OrganisationUnit, UnitGroup, UnitGroupSet, UnitId};
pub use infrastructure::{
    render_unit_tree, GroupClassifier, InMemoryUnitStore, OrganisationUnitStore,
    ServiceContainer, StoreError, StoreResult, UnitTreeBuilder,
};
