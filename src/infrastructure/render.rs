//! Diagnostic rendering of a unit tree

use std::sync::Arc;

use termtree::Tree;

use crate::domain::OrganisationUnit;
use crate::infrastructure::traits::{OrganisationUnitStore, StoreError, StoreResult};

/// Render the subtree below `unit` as a `termtree::Tree` for display.
///
/// Children are rendered in the order the unit lists them. A child id the
/// store cannot resolve is a store defect and fails the render.
pub fn render_unit_tree(
    store: &dyn OrganisationUnitStore,
    unit: &Arc<OrganisationUnit>,
) -> StoreResult<Tree<String>> {
    let label = format!("{} ({})", unit.name, unit.id);
    let mut leaves = Vec::with_capacity(unit.children.len());
    for &child_id in &unit.children {
        let child = store
            .unit_by_id(child_id)?
            .ok_or(StoreError::MissingUnit(child_id))?;
        leaves.push(render_unit_tree(store, &child)?);
    }
    Ok(Tree::new(label).with_leaves(leaves))
}
