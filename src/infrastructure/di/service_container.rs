//! Service container for dependency injection
//!
//! Wires up the resolver with its boundary dependencies.

use std::sync::Arc;

use crate::application::services::OrganisationResolver;
use crate::config::Settings;
use crate::infrastructure::memory::InMemoryUnitStore;
use crate::infrastructure::traits::{GroupClassifier, OrganisationUnitStore};

/// Container holding the resolver and its wired dependencies.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Unit store abstraction
    pub store: Arc<dyn OrganisationUnitStore>,

    /// Group classifier abstraction
    pub classifier: Arc<dyn GroupClassifier>,

    /// The resolver service
    pub resolver: OrganisationResolver,
}

impl ServiceContainer {
    /// Create a new service container backed by an in-memory store, which
    /// serves as both unit store and group classifier.
    pub fn new(settings: Settings, store: InMemoryUnitStore) -> Self {
        let store = Arc::new(store);
        Self::with_deps(
            settings,
            Arc::clone(&store) as Arc<dyn OrganisationUnitStore>,
            store as Arc<dyn GroupClassifier>,
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        store: Arc<dyn OrganisationUnitStore>,
        classifier: Arc<dyn GroupClassifier>,
    ) -> Self {
        let settings = Arc::new(settings);
        let resolver = OrganisationResolver::new(
            Arc::clone(&store),
            Arc::clone(&classifier),
            Arc::clone(&settings),
        );

        Self {
            settings,
            store,
            classifier,
            resolver,
        }
    }
}
