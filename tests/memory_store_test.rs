//! Tests for the in-memory store, its builder validation and tree rendering

use std::sync::Arc;

use orgtree::domain::{OrganisationUnit, UnitId};
use orgtree::infrastructure::memory::InMemoryUnitStore;
use orgtree::infrastructure::render::render_unit_tree;
use orgtree::infrastructure::traits::{GroupClassifier, OrganisationUnitStore, StoreError};
use orgtree::util::testing;

fn small_store() -> InMemoryUnitStore {
    InMemoryUnitStore::builder()
        .unit(1, "Rwanda", None)
        .unit(2, "North Province", Some(1))
        .unit(3, "South Province", Some(1))
        .unit(4, "Burera District", Some(2))
        .build()
        .expect("small tree")
}

// ============================================================
// Builder wiring
// ============================================================

#[test]
fn given_registrations_when_building_then_roots_and_children_are_wired() {
    // Arrange / Act
    let store = small_store();

    // Assert
    let roots = store.root_units().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, UnitId(1));
    assert_eq!(roots[0].children, vec![UnitId(2), UnitId(3)]);
    assert_eq!(roots[0].parent, None);
}

#[test]
fn given_built_store_when_asking_levels_then_counted_from_root() {
    // Arrange
    let store = small_store();
    let root = store.unit_by_id(UnitId(1)).unwrap().expect("root");
    let province = store.unit_by_id(UnitId(2)).unwrap().expect("province");
    let district = store.unit_by_id(UnitId(4)).unwrap().expect("district");

    // Act / Assert - levels are 1-based
    assert_eq!(store.level_of(&root).unwrap(), 1);
    assert_eq!(store.level_of(&province).unwrap(), 2);
    assert_eq!(store.level_of(&district).unwrap(), 3);
}

#[test]
fn given_duplicate_id_when_building_then_rejects_it() {
    // Arrange / Act
    let result = InMemoryUnitStore::builder()
        .unit(1, "Rwanda", None)
        .unit(7, "Butaro Hospital", Some(1))
        .unit(7, "Butaro Hospital again", Some(1))
        .build();

    // Assert
    assert!(matches!(result, Err(StoreError::DuplicateUnit(UnitId(7)))));
}

#[test]
fn given_dangling_parent_when_building_then_rejects_it() {
    // Arrange / Act
    let result = InMemoryUnitStore::builder()
        .unit(1, "Rwanda", None)
        .unit(2, "Orphaned District", Some(99))
        .build();

    // Assert
    assert!(matches!(
        result,
        Err(StoreError::DanglingParent {
            unit: UnitId(2),
            parent: UnitId(99),
        })
    ));
}

#[test]
fn given_parent_cycle_when_building_then_rejects_it() {
    // Arrange - 2 and 3 form a cycle unreachable from the root
    let result = InMemoryUnitStore::builder()
        .unit(1, "Rwanda", None)
        .unit(2, "Escher Province", Some(3))
        .unit(3, "Escher District", Some(2))
        .build();

    // Assert
    assert!(matches!(result, Err(StoreError::Cycle(UnitId(2)))));
}

// ============================================================
// Store queries
// ============================================================

#[test]
fn given_level_query_when_listing_then_registration_order() {
    // Arrange
    let store = small_store();

    // Act
    let provinces = store.units_at_level(2).unwrap();

    // Assert
    let ids: Vec<UnitId> = provinces.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![UnitId(2), UnitId(3)]);
}

#[test]
fn given_subtree_query_when_listing_then_filters_by_ancestor() {
    // Arrange
    let store = small_store();
    let north = store.unit_by_id(UnitId(2)).unwrap().expect("north");

    // Act
    let districts = store.units_at_level_under(3, &north).unwrap();

    // Assert - only Burera; South Province has no districts
    let ids: Vec<UnitId> = districts.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![UnitId(4)]);
}

#[test]
fn given_unknown_id_when_looking_up_then_none() {
    // Arrange
    let store = small_store();

    // Act / Assert
    assert!(store.unit_by_id(UnitId(42)).unwrap().is_none());
}

#[test]
fn given_foreign_unit_when_asking_level_then_unknown_level_error() {
    // Arrange - a unit the store never registered
    let store = small_store();
    let foreign = OrganisationUnit {
        id: UnitId(77),
        name: "Elsewhere".to_string(),
        parent: None,
        children: Vec::new(),
    };

    // Act
    let result = store.level_of(&foreign);

    // Assert
    assert!(matches!(result, Err(StoreError::UnknownLevel(UnitId(77)))));
}

// ============================================================
// Group sets
// ============================================================

#[test]
fn given_group_registrations_when_building_then_set_carries_the_groups() {
    // Arrange
    let store = InMemoryUnitStore::builder()
        .unit(1, "Butaro Hospital", None)
        .group("Type", "Hospital", &[1])
        .group("Type", "Health Centre", &[])
        .build()
        .expect("store");

    // Act
    let set = store.group_set_by_name("Type").unwrap();

    // Assert - fully materialized on fetch
    assert_eq!(set.name, "Type");
    let names: Vec<&str> = set.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Hospital", "Health Centre"]);
}

#[test]
fn given_unknown_set_name_when_fetching_then_missing_group_set() {
    // Arrange
    let store = small_store();

    // Act
    let result = store.group_set_by_name("Type");

    // Assert
    match result {
        Err(StoreError::MissingGroupSet(name)) => assert_eq!(name, "Type"),
        other => panic!("expected missing group set, got {:?}", other),
    }
}

#[test]
fn given_unit_in_two_groups_of_one_set_when_classifying_then_last_registration_wins() {
    // Arrange - groups of a set are mutually exclusive
    let store = InMemoryUnitStore::builder()
        .unit(1, "Kivu Clinic", None)
        .group("Type", "Hospital", &[1])
        .group("Type", "Health Centre", &[1])
        .build()
        .expect("store");
    let unit = store.unit_by_id(UnitId(1)).unwrap().expect("unit");
    let set = store.group_set_by_name("Type").unwrap();

    // Act
    let group = store.group_of(&unit, &set).unwrap();

    // Assert
    assert_eq!(group.expect("classified").name, "Health Centre");
}

#[test]
fn given_group_member_not_registered_when_building_then_rejects_it() {
    // Arrange / Act
    let result = InMemoryUnitStore::builder()
        .unit(1, "Rwanda", None)
        .group("Type", "Hospital", &[42])
        .build();

    // Assert
    assert!(matches!(result, Err(StoreError::MissingUnit(UnitId(42)))));
}

// ============================================================
// Rendering
// ============================================================

#[test]
fn given_tree_when_rendering_then_every_unit_appears_once() {
    // Arrange
    testing::init_test_setup();
    let store = small_store();
    let root = store.unit_by_id(UnitId(1)).unwrap().expect("root");

    // Act
    let tree = render_unit_tree(&store, &root).unwrap();
    let rendered = tree.to_string();

    // Assert
    assert!(rendered.starts_with("Rwanda (1)"));
    assert!(rendered.contains("North Province (2)"));
    assert!(rendered.contains("Burera District (4)"));
    assert!(rendered.contains("South Province (3)"));
    assert_eq!(rendered.matches("Province").count(), 2);
}

#[test]
fn given_subtree_when_rendering_then_only_that_branch() {
    // Arrange
    let store = small_store();
    let north = store.unit_by_id(UnitId(2)).unwrap().expect("north");

    // Act
    let rendered = render_unit_tree(&store, &north).unwrap().to_string();

    // Assert
    assert!(rendered.starts_with("North Province (2)"));
    assert!(rendered.contains("Burera District (4)"));
    assert!(!rendered.contains("South Province"));
}

// ============================================================
// Service container
// ============================================================

#[test]
fn given_container_when_wiring_memory_store_then_resolver_answers() {
    // Arrange
    use orgtree::config::Settings;
    use orgtree::infrastructure::di::ServiceContainer;

    let container = ServiceContainer::new(Settings::default(), small_store());

    // Act
    let root = container.resolver.root_organisation().unwrap();
    let level = container.resolver.level_of(&root).unwrap();

    // Assert
    assert_eq!(root.id(), UnitId(1));
    assert_eq!(level, 1);
    assert_eq!(container.resolver.facility_level(), 4);
}

#[test]
fn given_container_with_custom_deps_when_wiring_then_uses_them() {
    // Arrange
    use orgtree::config::Settings;
    use orgtree::infrastructure::di::ServiceContainer;

    let store = Arc::new(small_store());
    let container = ServiceContainer::with_deps(
        Settings {
            facility_level: 5,
            ..Settings::default()
        },
        Arc::clone(&store) as Arc<dyn OrganisationUnitStore>,
        store as Arc<dyn GroupClassifier>,
    );

    // Act / Assert
    assert_eq!(container.resolver.facility_level(), 5);
    assert_eq!(container.settings.facility_level, 5);
}
