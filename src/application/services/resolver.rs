//! Organisation resolution service
//!
//! Resolves parents, children and group membership over an external unit
//! store. Traversal can treat configured levels as transparent, and
//! resolved state sticks to the handed-out views.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use itertools::Itertools;
use tracing::{debug, error, info};

use crate::application::ResolveResult;
use crate::config::Settings;
use crate::domain::{DomainError, Organisation, OrganisationUnit, UnitGroupSet, UnitId};
use crate::infrastructure::traits::{GroupClassifier, OrganisationUnitStore, StoreError};

/// Service resolving `Organisation` views over a raw unit tree.
///
/// The resolver itself is shareable; the views it hands out are single
/// threaded. The configured group set is fetched once per resolver instance
/// and cached for its lifetime.
pub struct OrganisationResolver {
    store: Arc<dyn OrganisationUnitStore>,
    classifier: Arc<dyn GroupClassifier>,
    settings: Arc<Settings>,
    group_set: Mutex<Option<Arc<UnitGroupSet>>>,
}

impl OrganisationResolver {
    /// Create a new resolver.
    pub fn new(
        store: Arc<dyn OrganisationUnitStore>,
        classifier: Arc<dyn GroupClassifier>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            store,
            classifier,
            settings,
            group_set: Mutex::new(None),
        }
    }

    /// Get the root of the tree.
    ///
    /// Succeeds only if the store reports exactly one parentless unit.
    /// Anything else is a fatal configuration problem (malformed or empty
    /// tree), not a normal empty-result case.
    pub fn root_organisation(&self) -> ResolveResult<Organisation> {
        debug!("root_organisation");
        let roots = self.store.root_units()?;
        match roots.as_slice() {
            [root] => Ok(Organisation::new(Arc::clone(root))),
            _ => {
                error!(
                    "root_organisation: expected exactly one root, found {}",
                    roots.len()
                );
                Err(DomainError::NoUniqueRoot { count: roots.len() }.into())
            }
        }
    }

    /// Get the level of an organisation, querying the store only when the
    /// view holds no resolved level yet.
    ///
    /// Level 0 is the "not yet resolved" sentinel, so a store that reports 0
    /// keeps the view unresolved and gets queried again on the next call.
    /// The reported value is still returned to the caller.
    pub fn level_of(&self, org: &Organisation) -> ResolveResult<u32> {
        let cached = org.level();
        if cached != 0 {
            return Ok(cached);
        }
        debug!("level_of: querying store for unit={}", org.unit().id);
        let level = self.store.level_of(org.unit())?;
        org.fill_level(level);
        Ok(level)
    }

    /// Get all organisations at an intrinsic level, in the store's
    /// enumeration order.
    pub fn organisations_at_level(&self, level: u32) -> ResolveResult<Vec<Organisation>> {
        debug!("organisations_at_level: level={}", level);
        let units = self.store.units_at_level(level)?;
        Ok(units.into_iter().map(Organisation::new).collect())
    }

    /// Look an organisation up by id. Absence is a normal outcome, not an
    /// error.
    pub fn organisation(&self, id: UnitId) -> ResolveResult<Option<Organisation>> {
        debug!("organisation: id={}", id);
        Ok(Self::wrap(self.store.unit_by_id(id)?))
    }

    /// Load the parent of an organisation, treating the given levels as
    /// transparent: a parent sitting at a skipped level is passed over and
    /// its own parent considered instead, repeatedly.
    ///
    /// Returns `Ok(true)` once the parent is loaded (or was already loaded,
    /// an idempotent no-op) and `Ok(false)` at the top of the tree, where
    /// the parent stays unloaded.
    pub fn load_parent(
        &self,
        org: &Organisation,
        skip_levels: &HashSet<u32>,
    ) -> ResolveResult<bool> {
        debug!(
            "load_parent: unit={}, skip=[{}]",
            org.unit().id,
            fmt_levels(skip_levels)
        );
        Ok(self.ensure_parent(org, skip_levels)?.is_some())
    }

    /// Get the ancestor of an organisation at exactly the given level,
    /// climbing one generation at a time with no skips. `Ok(None)` when the
    /// top is reached without a match.
    pub fn parent_of_level(
        &self,
        org: &Organisation,
        level: u32,
    ) -> ResolveResult<Option<Organisation>> {
        debug!("parent_of_level: unit={}, level={}", org.unit().id, level);
        let no_skips = HashSet::new();
        let mut current = org.clone();
        while let Some(parent) = self.ensure_parent(&current, &no_skips)? {
            if self.level_of(&parent)? == level {
                return Ok(Some(parent));
            }
            current = parent;
        }
        Ok(None)
    }

    /// Load the children of an organisation, treating the given levels as
    /// transparent: when the child generation sits at a skipped level, the
    /// grandchildren are spliced in (recursively) instead of the children
    /// themselves, in encounter order.
    ///
    /// Idempotent no-op once children are loaded. Every loaded child gets
    /// a non-owning back-reference to `org`. The skip check assumes direct
    /// children sit one level below their parent; each spliced node's own
    /// level is read back from the store rather than carried down
    /// arithmetically.
    pub fn load_children(
        &self,
        org: &Organisation,
        skip_levels: &HashSet<u32>,
    ) -> ResolveResult<()> {
        debug!(
            "load_children: unit={}, skip=[{}]",
            org.unit().id,
            fmt_levels(skip_levels)
        );
        if org.children().is_some() {
            return Ok(());
        }

        let mut collected = Vec::new();
        self.effective_children(org.unit(), skip_levels, &mut collected)?;

        let children: Vec<Organisation> = collected.into_iter().map(Organisation::new).collect();
        for child in &children {
            child.fill_parent_weak(org);
        }
        org.fill_children(children);
        Ok(())
    }

    /// Get the descendants of an organisation at an intrinsic level,
    /// straight from the store. No skip-level logic applies here.
    pub fn children_at_level(
        &self,
        org: &Organisation,
        level: u32,
    ) -> ResolveResult<Vec<Organisation>> {
        debug!("children_at_level: unit={}, level={}", org.unit().id, level);
        let units = self.store.units_at_level_under(level, org.unit())?;
        Ok(units.into_iter().map(Organisation::new).collect())
    }

    /// Classify an organisation against the configured group set.
    ///
    /// The group set is fetched once per resolver and cached; the lookup
    /// and the assignment happen on every call, overwriting whatever the
    /// view held before. A unit outside every group of the set gets `None`.
    pub fn load_group(&self, org: &Organisation) -> ResolveResult<()> {
        debug!("load_group: unit={}", org.unit().id);
        let set = self.group_set()?;
        let group = self.classifier.group_of(org.unit(), &set)?;
        org.set_group(group);
        Ok(())
    }

    /// The configured facility level. Opaque passthrough for callers.
    pub fn facility_level(&self) -> u32 {
        self.settings.facility_level
    }

    fn wrap(unit: Option<Arc<OrganisationUnit>>) -> Option<Organisation> {
        unit.map(Organisation::new)
    }

    /// Load the parent if needed and hand back the stored view, or `None` at
    /// the top of the tree.
    fn ensure_parent(
        &self,
        org: &Organisation,
        skip_levels: &HashSet<u32>,
    ) -> ResolveResult<Option<Organisation>> {
        if let Some(parent) = org.parent() {
            return Ok(Some(parent));
        }
        match self.effective_parent(org.unit(), skip_levels)? {
            Some(unit) => {
                let parent = Organisation::new(unit);
                org.fill_parent(parent.clone());
                Ok(Some(parent))
            }
            None => Ok(None),
        }
    }

    /// Walk up the raw tree to the nearest ancestor not at a skipped level.
    ///
    /// A parent id the store cannot resolve is a store failure and
    /// propagates. Terminates on any acyclic tree; cycles are an external
    /// store invariant, not enforced here.
    fn effective_parent(
        &self,
        unit: &Arc<OrganisationUnit>,
        skip_levels: &HashSet<u32>,
    ) -> ResolveResult<Option<Arc<OrganisationUnit>>> {
        let Some(parent_id) = unit.parent else {
            return Ok(None);
        };
        let parent = self
            .store
            .unit_by_id(parent_id)?
            .ok_or(StoreError::MissingUnit(parent_id))?;
        let level = self.store.level_of(&parent)?;
        if skip_levels.contains(&level) {
            info!("load_parent: skipping {} at level {}", parent.name, level);
            return self.effective_parent(&parent, skip_levels);
        }
        Ok(Some(parent))
    }

    /// Collect the effective children of `unit`, splicing in grandchildren
    /// for skipped generations.
    ///
    /// Queries the store for `unit`'s own level and trusts children to sit
    /// one level below it; each recursion re-queries for its splice root.
    fn effective_children(
        &self,
        unit: &Arc<OrganisationUnit>,
        skip_levels: &HashSet<u32>,
        out: &mut Vec<Arc<OrganisationUnit>>,
    ) -> ResolveResult<()> {
        let level = self.store.level_of(unit)?;
        for &child_id in &unit.children {
            let child = self
                .store
                .unit_by_id(child_id)?
                .ok_or(StoreError::MissingUnit(child_id))?;
            if skip_levels.contains(&(level + 1)) {
                info!("load_children: skipping {} at level {}", child.name, level + 1);
                self.effective_children(&child, skip_levels, out)?;
            } else {
                out.push(child);
            }
        }
        Ok(())
    }

    /// Fetch the configured group set, at most once per resolver.
    ///
    /// The lock is held across the fetch so concurrent first callers do not
    /// issue duplicate queries.
    fn group_set(&self) -> ResolveResult<Arc<UnitGroupSet>> {
        let mut cached = self
            .group_set
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(set) = cached.as_ref() {
            return Ok(Arc::clone(set));
        }
        debug!("group_set: fetching {:?}", self.settings.group_set_name);
        let set = Arc::new(
            self.classifier
                .group_set_by_name(&self.settings.group_set_name)?,
        );
        *cached = Some(Arc::clone(&set));
        Ok(set)
    }
}

fn fmt_levels(levels: &HashSet<u32>) -> String {
    levels.iter().sorted().join(", ")
}
