//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::RegistryService;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::FontMatcher;
use crate::infrastructure::store::TomlRegistrationStore;
use crate::infrastructure::traits::{FileSystem, RealFileSystem, RegistrationStore};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Registration store backing the checked state of font files
    pub store: Arc<dyn RegistrationStore>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let store = TomlRegistrationStore::new(&settings.store_file, &settings.namespace);
        Self::with_deps(settings, Arc::new(RealFileSystem), Arc::new(store))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn RegistrationStore>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs, store }
    }

    /// Registry service using the configured font extensions.
    pub fn registry_service(&self) -> ApplicationResult<RegistryService> {
        let matcher = FontMatcher::new(&self.settings.font_extensions)?;
        Ok(RegistryService::new(
            Arc::clone(&self.fs),
            Arc::clone(&self.store),
            matcher,
        ))
    }
}
