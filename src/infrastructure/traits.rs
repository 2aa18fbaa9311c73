//! Boundary traits for the external unit store and group classifier
//!
//! These traits abstract the backing organisation-unit tree and the group
//! classification provider, allowing the resolver to be tested with mock
//! implementations.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{OrganisationUnit, UnitGroup, UnitGroupSet, UnitId};

/// Failures of the external store or classifier, including malformed tree
/// data discovered while answering a query.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unit id referenced by the store's own data does not resolve.
    #[error("organisation unit not found: {0}")]
    MissingUnit(UnitId),

    #[error("duplicate organisation unit id: {0}")]
    DuplicateUnit(UnitId),

    #[error("organisation unit {unit} references unknown parent {parent}")]
    DanglingParent { unit: UnitId, parent: UnitId },

    #[error("cycle in organisation unit hierarchy at {0}")]
    Cycle(UnitId),

    #[error("no level recorded for organisation unit {0}")]
    UnknownLevel(UnitId),

    #[error("organisation unit group set not found: {0}")]
    MissingGroupSet(String),

    #[error("store backend failure: {context}")]
    Backend {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    /// Wrap an arbitrary backend failure with context.
    pub fn backend(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// Result type for store and classifier calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Backing store for the raw organisation-unit tree.
///
/// Levels are intrinsic to the store (1-based by convention, roots at
/// level 1); the resolver never derives them itself. A store that reports
/// 0 for its root collides with the resolver's "unresolved" level sentinel
/// and defeats the level cache for that node.
pub trait OrganisationUnitStore: Send + Sync {
    /// All units with no parent.
    fn root_units(&self) -> StoreResult<Vec<Arc<OrganisationUnit>>>;

    /// Intrinsic level of a unit.
    fn level_of(&self, unit: &OrganisationUnit) -> StoreResult<u32>;

    /// All units at the given intrinsic level, in store enumeration order.
    fn units_at_level(&self, level: u32) -> StoreResult<Vec<Arc<OrganisationUnit>>>;

    /// Units at the given intrinsic level that are descendants of
    /// `ancestor`.
    fn units_at_level_under(
        &self,
        level: u32,
        ancestor: &OrganisationUnit,
    ) -> StoreResult<Vec<Arc<OrganisationUnit>>>;

    /// Look a unit up by id; `Ok(None)` when the id is unknown.
    fn unit_by_id(&self, id: UnitId) -> StoreResult<Option<Arc<OrganisationUnit>>>;
}

/// Provider of group-set classifications for organisation units.
pub trait GroupClassifier: Send + Sync {
    /// Fetch a group set by name, with all member groups materialized.
    fn group_set_by_name(&self, name: &str) -> StoreResult<UnitGroupSet>;

    /// The group `unit` belongs to within `set`; `Ok(None)` when the unit
    /// is in no group of the set.
    fn group_of(
        &self,
        unit: &OrganisationUnit,
        set: &UnitGroupSet,
    ) -> StoreResult<Option<UnitGroup>>;
}
