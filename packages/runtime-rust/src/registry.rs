//! Module container and collection registration.
//!
//! [`StorageModuleRegistry`] holds the modules of an application by name.
//! [`CollectionRegistrar`] resolves every declared collection's history as of
//! a point in time, "now" by default, and hands the qualifying revisions to a
//! [`CollectionRegistry`].

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use stormod_core::{
    resolve, ClockSource, ModuleError, ResolvedCollection, Result, SchemaVersion, SystemClock,
};

use crate::module::StorageModule;
use crate::traits::CollectionRegistry;

// ---------------------------------------------------------------------------
// StorageModuleRegistry
// ---------------------------------------------------------------------------

/// Registry of storage modules, looked up by name.
///
/// Iteration follows registration order.
pub struct StorageModuleRegistry {
    by_name: DashMap<String, Arc<StorageModule>>,
    order: RwLock<Vec<String>>,
}

impl StorageModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_name: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Registers `module` under `name`, replacing any module previously registered there.
    pub fn register(&self, name: impl Into<String>, module: StorageModule) -> Arc<StorageModule> {
        let name = name.into();
        let module = Arc::new(module);
        if self.by_name.insert(name.clone(), Arc::clone(&module)).is_none() {
            self.order.write().push(name);
        } else {
            tracing::debug!(module = %name, "replaced registered storage module");
        }
        module
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<StorageModule>> {
        self.by_name.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// All modules in registration order.
    #[must_use]
    pub fn modules(&self) -> Vec<(String, Arc<StorageModule>)> {
        self.order
            .read()
            .iter()
            .filter_map(|name| self.get(name).map(|module| (name.clone(), module)))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for StorageModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Collection registration
// ---------------------------------------------------------------------------

/// Resolves module collections and hands them to a [`CollectionRegistry`].
///
/// When no resolution time is given, "now" is read from the registrar's
/// clock source.
pub struct CollectionRegistrar {
    clock_source: Box<dyn ClockSource>,
}

impl CollectionRegistrar {
    /// Registrar reading the real system time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(clock_source: Box<dyn ClockSource>) -> Self {
        Self { clock_source }
    }

    /// `as_of`, or the clock's current time when absent.
    #[must_use]
    pub fn resolution_time(&self, as_of: Option<SchemaVersion>) -> SchemaVersion {
        as_of.unwrap_or_else(|| self.clock_source.now_version())
    }

    /// Registers every collection of `module` with `registry`.
    ///
    /// All collections are resolved before any is registered, so a malformed
    /// history leaves `registry` untouched. Collections with no revision
    /// effective at the resolution time are skipped. Returns the names of the
    /// collections that were registered.
    ///
    /// # Errors
    ///
    /// - Initialization errors of `module`.
    /// - [`ModuleError::InvalidHistory`] for a malformed revision chain.
    /// - [`ModuleError::Registry`] if the registry rejects a collection.
    pub fn register_module(
        &self,
        registry: &dyn CollectionRegistry,
        module: &StorageModule,
        as_of: Option<SchemaVersion>,
    ) -> Result<Vec<String>> {
        let as_of = self.resolution_time(as_of);
        let resolved = resolve_module(module, as_of)?;
        commit(registry, resolved)
    }

    /// Registers the collections of every module in `modules`, in registration order.
    ///
    /// Every module shares one resolution time. Duplicate names and malformed
    /// histories are detected before anything is registered.
    ///
    /// # Errors
    ///
    /// Everything [`CollectionRegistrar::register_module`] returns, plus
    /// [`ModuleError::DuplicateCollection`] if two modules declare the same
    /// collection.
    pub fn register_modules(
        &self,
        registry: &dyn CollectionRegistry,
        modules: &StorageModuleRegistry,
        as_of: Option<SchemaVersion>,
    ) -> Result<Vec<String>> {
        let as_of = self.resolution_time(as_of);
        let modules = modules.modules();

        let mut seen = HashSet::new();
        for (_, module) in &modules {
            for name in module.collections()?.keys() {
                if !seen.insert(name.clone()) {
                    return Err(ModuleError::DuplicateCollection { name: name.clone() });
                }
            }
        }

        let mut staged = Vec::with_capacity(modules.len());
        for (module_name, module) in &modules {
            staged.push((module_name, resolve_module(module, as_of)?));
        }

        let mut registered = Vec::new();
        for (module_name, resolved) in staged {
            let names = commit(registry, resolved)?;
            tracing::info!(
                module = module_name.as_str(),
                collections = names.len(),
                as_of = as_of.as_millis(),
                "registered module collections"
            );
            registered.extend(names);
        }
        Ok(registered)
    }
}

impl Default for CollectionRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers every collection of `module` with `registry`, resolved as of
/// `as_of` or the current system time.
///
/// # Errors
///
/// See [`CollectionRegistrar::register_module`].
pub fn register_module_collections(
    registry: &dyn CollectionRegistry,
    module: &StorageModule,
    as_of: Option<SchemaVersion>,
) -> Result<Vec<String>> {
    CollectionRegistrar::new().register_module(registry, module, as_of)
}

/// Registers the collections of every module in `modules`, resolved as of
/// `as_of` or the current system time.
///
/// # Errors
///
/// See [`CollectionRegistrar::register_modules`].
pub fn register_module_registry_collections(
    registry: &dyn CollectionRegistry,
    modules: &StorageModuleRegistry,
    as_of: Option<SchemaVersion>,
) -> Result<Vec<String>> {
    CollectionRegistrar::new().register_modules(registry, modules, as_of)
}

fn resolve_module(
    module: &StorageModule,
    as_of: SchemaVersion,
) -> Result<Vec<(String, ResolvedCollection)>> {
    let collections = module.collections()?;
    let mut resolved = Vec::with_capacity(collections.len());
    for (name, schema) in collections.iter() {
        let collection = resolve(name, schema, as_of)?;
        if collection.is_empty() {
            tracing::debug!(
                module = module.name(),
                collection = name.as_str(),
                as_of = as_of.as_millis(),
                "no revision effective yet, collection not registered"
            );
            continue;
        }
        resolved.push((name.clone(), collection));
    }
    Ok(resolved)
}

fn commit(
    registry: &dyn CollectionRegistry,
    resolved: Vec<(String, ResolvedCollection)>,
) -> Result<Vec<String>> {
    let mut registered = Vec::with_capacity(resolved.len());
    for (name, collection) in resolved {
        registry
            .register_collection(&name, collection)
            .map_err(ModuleError::Registry)?;
        registered.push(name);
    }
    Ok(registered)
}

// ---------------------------------------------------------------------------
// InMemoryCollectionRegistry
// ---------------------------------------------------------------------------

/// Collection registry that keeps the latest registration per name in memory.
#[derive(Default)]
pub struct InMemoryCollectionRegistry {
    collections: DashMap<String, ResolvedCollection>,
}

impl InMemoryCollectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<ResolvedCollection> {
        self.collections.get(name).map(|entry| entry.value().clone())
    }

    /// Registered collection names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}

impl CollectionRegistry for InMemoryCollectionRegistry {
    fn register_collection(&self, name: &str, collection: ResolvedCollection) -> anyhow::Result<()> {
        self.collections.insert(name.to_string(), collection);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
