//! Static registry mapping migration identifiers to factories.
//!
//! Identifiers are `<namespace>::<name>`, where `name` is the stem of the
//! migration's definition file. The registry is filled once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::definition::{Migration, MigrationContext};
use common::{AppError, AppResult};

/// Builds a migration for one run.
pub type MigrationFactory =
    Arc<dyn for<'c> Fn(MigrationContext<'c>) -> Box<dyn Migration + 'c> + Send + Sync>;

/// Identifier → factory map.
#[derive(Clone)]
pub struct MigrationRegistry {
    namespace: String,
    factories: HashMap<String, MigrationFactory>,
}

impl MigrationRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            factories: HashMap::new(),
        }
    }

    /// Register a factory under `name`, qualified into the registry namespace.
    ///
    /// Fails with [`AppError::DuplicateMigration`] if `name` is already taken.
    pub fn try_register<F>(mut self, name: &str, factory: F) -> AppResult<Self>
    where
        F: for<'c> Fn(MigrationContext<'c>) -> Box<dyn Migration + 'c> + Send + Sync + 'static,
    {
        let identifier = self.qualify(name);
        if self.factories.contains_key(&identifier) {
            return Err(AppError::DuplicateMigration(identifier));
        }
        self.factories.insert(identifier, Arc::new(factory));
        Ok(self)
    }

    /// Builder form of [`try_register`](Self::try_register).
    ///
    /// A duplicate name is logged and the first factory is kept.
    pub fn register<F>(self, name: &str, factory: F) -> Self
    where
        F: for<'c> Fn(MigrationContext<'c>) -> Box<dyn Migration + 'c> + Send + Sync + 'static,
    {
        let identifier = self.qualify(name);
        if self.factories.contains_key(&identifier) {
            warn!("Ignoring second registration of migration {}", identifier);
            return self;
        }
        let mut registry = self;
        registry.factories.insert(identifier, Arc::new(factory));
        registry
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Map a file stem into the registry namespace.
    pub fn qualify(&self, name: &str) -> String {
        format!("{}::{}", self.namespace, name)
    }

    pub fn resolve(&self, identifier: &str) -> Option<&MigrationFactory> {
        self.factories.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// All registered identifiers, sorted
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationRegistry")
            .field("namespace", &self.namespace)
            .field("identifiers", &self.identifiers())
            .finish()
    }
}
