//! In-memory organisation-unit store
//!
//! Reference implementation of both boundary traits, backed by maps frozen
//! at build time. Serves as the test double and as the model for real
//! store adapters.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::domain::{OrganisationUnit, UnitGroup, UnitGroupSet, UnitId};
use crate::infrastructure::traits::{
    GroupClassifier, OrganisationUnitStore, StoreError, StoreResult,
};

/// In-memory store over a frozen unit tree, with optional group sets.
///
/// Enumeration order is registration order. Levels are computed once at
/// build time from root distance (roots at level 1), so this store always
/// "already provides" levels.
pub struct InMemoryUnitStore {
    units: Vec<Arc<OrganisationUnit>>,
    by_id: HashMap<UnitId, Arc<OrganisationUnit>>,
    levels: HashMap<UnitId, u32>,
    roots: Vec<UnitId>,
    group_sets: HashMap<String, GroupSetDef>,
}

struct GroupSetDef {
    set: UnitGroupSet,
    membership: HashMap<UnitId, UnitGroup>,
}

impl InMemoryUnitStore {
    /// Start building a store.
    pub fn builder() -> UnitTreeBuilder {
        UnitTreeBuilder::new()
    }

    fn is_descendant_of(&self, unit: &OrganisationUnit, ancestor: UnitId) -> bool {
        let mut current = unit.parent;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.by_id.get(&id).and_then(|u| u.parent);
        }
        false
    }
}

impl OrganisationUnitStore for InMemoryUnitStore {
    fn root_units(&self) -> StoreResult<Vec<Arc<OrganisationUnit>>> {
        Ok(self
            .roots
            .iter()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect())
    }

    fn level_of(&self, unit: &OrganisationUnit) -> StoreResult<u32> {
        self.levels
            .get(&unit.id)
            .copied()
            .ok_or(StoreError::UnknownLevel(unit.id))
    }

    fn units_at_level(&self, level: u32) -> StoreResult<Vec<Arc<OrganisationUnit>>> {
        Ok(self
            .units
            .iter()
            .filter(|u| self.levels.get(&u.id) == Some(&level))
            .cloned()
            .collect())
    }

    fn units_at_level_under(
        &self,
        level: u32,
        ancestor: &OrganisationUnit,
    ) -> StoreResult<Vec<Arc<OrganisationUnit>>> {
        Ok(self
            .units
            .iter()
            .filter(|u| {
                self.levels.get(&u.id) == Some(&level) && self.is_descendant_of(u, ancestor.id)
            })
            .cloned()
            .collect())
    }

    fn unit_by_id(&self, id: UnitId) -> StoreResult<Option<Arc<OrganisationUnit>>> {
        Ok(self.by_id.get(&id).cloned())
    }
}

impl GroupClassifier for InMemoryUnitStore {
    fn group_set_by_name(&self, name: &str) -> StoreResult<UnitGroupSet> {
        self.group_sets
            .get(name)
            .map(|def| def.set.clone())
            .ok_or_else(|| StoreError::MissingGroupSet(name.to_string()))
    }

    fn group_of(
        &self,
        unit: &OrganisationUnit,
        set: &UnitGroupSet,
    ) -> StoreResult<Option<UnitGroup>> {
        let def = self
            .group_sets
            .get(&set.name)
            .ok_or_else(|| StoreError::MissingGroupSet(set.name.clone()))?;
        Ok(def.membership.get(&unit.id).cloned())
    }
}

struct UnitReg {
    id: UnitId,
    name: String,
    parent: Option<UnitId>,
}

struct GroupReg {
    set: String,
    group: String,
    members: Vec<UnitId>,
}

/// Builder assembling an [`InMemoryUnitStore`] from unit and group
/// registrations.
///
/// `build` wires children in registration order, discovers roots, computes
/// 1-based levels from the roots, and rejects malformed input (duplicate
/// ids, dangling parent references, parent cycles).
pub struct UnitTreeBuilder {
    units: Vec<UnitReg>,
    set_names: Vec<String>,
    groups: Vec<GroupReg>,
}

impl Default for UnitTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitTreeBuilder {
    pub fn new() -> Self {
        Self {
            units: Vec::new(),
            set_names: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Register a unit. Pass `parent: None` for a root.
    pub fn unit(mut self, id: u64, name: &str, parent: Option<u64>) -> Self {
        self.units.push(UnitReg {
            id: UnitId(id),
            name: name.to_string(),
            parent: parent.map(UnitId),
        });
        self
    }

    /// Register an empty group set.
    pub fn group_set(mut self, name: &str) -> Self {
        if !self.set_names.iter().any(|n| n == name) {
            self.set_names.push(name.to_string());
        }
        self
    }

    /// Register a group within a set (creating the set if needed) together
    /// with its member units. Within one set a unit's last registered group
    /// wins: groups of a set are mutually exclusive.
    pub fn group(mut self, set: &str, group: &str, members: &[u64]) -> Self {
        if !self.set_names.iter().any(|n| n == set) {
            self.set_names.push(set.to_string());
        }
        self.groups.push(GroupReg {
            set: set.to_string(),
            group: group.to_string(),
            members: members.iter().copied().map(UnitId).collect(),
        });
        self
    }

    pub fn build(self) -> StoreResult<InMemoryUnitStore> {
        debug!(
            "build: {} units, {} group sets",
            self.units.len(),
            self.set_names.len()
        );

        let mut ids: HashSet<UnitId> = HashSet::new();
        for reg in &self.units {
            if !ids.insert(reg.id) {
                return Err(StoreError::DuplicateUnit(reg.id));
            }
        }

        let mut children: HashMap<UnitId, Vec<UnitId>> = HashMap::new();
        let mut roots = Vec::new();
        for reg in &self.units {
            match reg.parent {
                Some(parent) => {
                    if !ids.contains(&parent) {
                        return Err(StoreError::DanglingParent {
                            unit: reg.id,
                            parent,
                        });
                    }
                    children.entry(parent).or_default().push(reg.id);
                }
                None => roots.push(reg.id),
            }
        }

        // Levels by root distance. Units caught in a parent cycle are
        // unreachable from any root and surface as leftovers below.
        let mut levels: HashMap<UnitId, u32> = HashMap::new();
        let mut stack: Vec<(UnitId, u32)> = roots.iter().map(|&id| (id, 1)).collect();
        while let Some((id, level)) = stack.pop() {
            levels.insert(id, level);
            if let Some(kids) = children.get(&id) {
                for &kid in kids {
                    stack.push((kid, level + 1));
                }
            }
        }
        if levels.len() != self.units.len() {
            let stranded = self
                .units
                .iter()
                .find(|reg| !levels.contains_key(&reg.id))
                .map(|reg| reg.id)
                .unwrap_or(UnitId(0));
            return Err(StoreError::Cycle(stranded));
        }

        let mut units = Vec::with_capacity(self.units.len());
        let mut by_id = HashMap::with_capacity(self.units.len());
        for reg in &self.units {
            let unit = Arc::new(OrganisationUnit {
                id: reg.id,
                name: reg.name.clone(),
                parent: reg.parent,
                children: children.get(&reg.id).cloned().unwrap_or_default(),
            });
            units.push(Arc::clone(&unit));
            by_id.insert(reg.id, unit);
        }

        let mut group_sets: HashMap<String, GroupSetDef> = self
            .set_names
            .iter()
            .map(|name| {
                (
                    name.clone(),
                    GroupSetDef {
                        set: UnitGroupSet {
                            name: name.clone(),
                            groups: Vec::new(),
                        },
                        membership: HashMap::new(),
                    },
                )
            })
            .collect();
        for reg in &self.groups {
            let def = group_sets
                .get_mut(&reg.set)
                .ok_or_else(|| StoreError::MissingGroupSet(reg.set.clone()))?;
            let group = UnitGroup::new(reg.group.clone());
            def.set.groups.push(group.clone());
            for &member in &reg.members {
                if !by_id.contains_key(&member) {
                    return Err(StoreError::MissingUnit(member));
                }
                def.membership.insert(member, group.clone());
            }
        }

        Ok(InMemoryUnitStore {
            units,
            by_id,
            levels,
            roots,
            group_sets,
        })
    }
}
