//! Domain entities: the raw organisation-unit tree and its cached view

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// Identity of a raw organisation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UnitId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Raw node of the external organisation hierarchy (a facility, district,
/// region, ...).
///
/// Immutable from the resolver's perspective. Navigation fields carry unit
/// ids; resolving an id to a node goes through the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganisationUnit {
    /// Unit identity
    pub id: UnitId,
    /// Human-readable unit name
    pub name: String,
    /// Parent unit, None only at a root
    pub parent: Option<UnitId>,
    /// Direct children, in store order
    pub children: Vec<UnitId>,
}

impl fmt::Display for OrganisationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Classification tag assigned to organisation units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitGroup {
    /// Group name, unique within its group set
    pub name: String,
}

impl UnitGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for UnitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Named collection of mutually exclusive unit groups.
///
/// A set handed out by the classifier carries all its member groups fully
/// materialized; nothing about it is fetched lazily afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitGroupSet {
    /// Group-set name (the classification dimension, e.g. "Type")
    pub name: String,
    /// Member groups
    pub groups: Vec<UnitGroup>,
}

/// Cached view over one raw organisation unit.
///
/// An `Organisation` is a cheaply cloneable shared handle: clones refer to
/// the same underlying cache, so parent/child wiring created during one
/// traversal stays consistent across all handles. Handles are `Rc`-based
/// and stay on one thread, while the resolver that produces them is freely
/// shareable.
///
/// The cache fields (level, parent, children) fill at most once and are
/// never invalidated or refreshed for the lifetime of the view. The group
/// field is the exception: it is overwritten on every group load.
///
/// A view owns the children loaded under it and any ancestor an upward
/// load discovers. The child-to-parent back-reference left by a children
/// load is weak and reads as `None` once every handle on the parent view
/// is gone.
#[derive(Clone)]
pub struct Organisation {
    inner: Rc<OrgInner>,
}

struct OrgInner {
    unit: Arc<OrganisationUnit>,
    cache: OrgCache,
}

/// Lazily filled fields of an [`Organisation`].
#[derive(Default)]
struct OrgCache {
    /// Resolved level; 0 means "not yet resolved". A store that reports
    /// level 0 for a true root keeps this slot unfilled, so the level is
    /// re-queried on every call. Resolution does not special-case roots.
    level: Cell<u32>,
    /// Effective parent; unset means "not yet loaded", NOT "has no parent".
    parent: OnceCell<ParentLink>,
    /// Effective children; unset means "not yet loaded".
    children: OnceCell<Vec<Organisation>>,
    /// Group within the configured group set; None is a valid outcome.
    group: RefCell<Option<UnitGroup>>,
}

/// Link from a view to its loaded parent.
///
/// An upward load owns the ancestor it discovers. A children load leaves a
/// weak back-reference on each child instead: the parent view owns its
/// children, never the reverse, and a wired family is reclaimed once the
/// last outside handle is dropped.
enum ParentLink {
    Owned(Organisation),
    Back(Weak<OrgInner>),
}

impl ParentLink {
    fn resolve(&self) -> Option<Organisation> {
        match self {
            ParentLink::Owned(parent) => Some(parent.clone()),
            ParentLink::Back(inner) => inner.upgrade().map(|inner| Organisation { inner }),
        }
    }
}

impl Organisation {
    /// Wrap a raw unit in a fresh view with nothing resolved yet.
    pub fn new(unit: Arc<OrganisationUnit>) -> Self {
        Self {
            inner: Rc::new(OrgInner {
                unit,
                cache: OrgCache::default(),
            }),
        }
    }

    /// The wrapped raw unit.
    pub fn unit(&self) -> &Arc<OrganisationUnit> {
        &self.inner.unit
    }

    /// Identity of the wrapped raw unit.
    pub fn id(&self) -> UnitId {
        self.inner.unit.id
    }

    /// Cached level; 0 while unresolved.
    pub fn level(&self) -> u32 {
        self.inner.cache.level.get()
    }

    /// Fill the level cache if it is still unresolved. Filling an already
    /// resolved level is ignored; filling 0 leaves the slot unresolved.
    pub fn fill_level(&self, level: u32) {
        if self.inner.cache.level.get() == 0 {
            self.inner.cache.level.set(level);
        }
    }

    /// The loaded parent view.
    ///
    /// `None` while parent resolution has not run, at the top of the tree,
    /// and for a back-reference whose parent view has since been dropped.
    pub fn parent(&self) -> Option<Organisation> {
        self.inner.cache.parent.get().and_then(ParentLink::resolve)
    }

    /// Fill the parent slot with an owned link if it is still unloaded; a
    /// second fill is ignored (the slot never changes once set).
    pub fn fill_parent(&self, parent: Organisation) {
        let _ = self.inner.cache.parent.set(ParentLink::Owned(parent));
    }

    /// Fill the parent slot with a non-owning back-reference; a second
    /// fill is ignored. This is the form a children load wires onto each
    /// child it hands out.
    pub fn fill_parent_weak(&self, parent: &Organisation) {
        let _ = self
            .inner
            .cache
            .parent
            .set(ParentLink::Back(Rc::downgrade(&parent.inner)));
    }

    /// The loaded children views, if children resolution has run.
    pub fn children(&self) -> Option<&[Organisation]> {
        self.inner.cache.children.get().map(Vec::as_slice)
    }

    /// Fill the children slot if it is still unloaded; a second fill is
    /// ignored (the slot never changes once set).
    pub fn fill_children(&self, children: Vec<Organisation>) {
        let _ = self.inner.cache.children.set(children);
    }

    /// The most recently assigned group, if any.
    pub fn group(&self) -> Option<UnitGroup> {
        self.inner.cache.group.borrow().clone()
    }

    /// Assign the group unconditionally. Unlike the other cache fields this
    /// slot is overwritten on every group load; the fetch-once behavior
    /// lives in the resolver's group-set cache, not here.
    pub fn set_group(&self, group: Option<UnitGroup>) {
        *self.inner.cache.group.borrow_mut() = group;
    }
}

// Parent and children link back to each other, so a derived Debug would
// walk the wired graph without terminating. Report load state instead.
impl fmt::Debug for Organisation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Organisation")
            .field("unit", &self.inner.unit.id)
            .field("name", &self.inner.unit.name)
            .field("level", &self.inner.cache.level.get())
            .field("parent_loaded", &self.inner.cache.parent.get().is_some())
            .field(
                "children_loaded",
                &self.inner.cache.children.get().is_some(),
            )
            .field("group", &self.inner.cache.group.borrow())
            .finish()
    }
}
