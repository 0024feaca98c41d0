//! Storage module facade with lazily materialized configuration.
//!
//! A [`StorageModule`] wraps a [`ModuleDeclaration`] and turns it into a
//! [`ModuleConfig`] the first time its collections or operations are needed:
//! the declaration runs, then `createObject` arguments are generated. The
//! result is cached for the module's lifetime. A failed transition caches
//! nothing, so the next access retries from scratch.

use std::sync::Arc;

use parking_lot::Mutex;
use stormod_core::autogen;
use stormod_core::{
    ModuleError, RenderContext, Result, StorageModuleCollections, StorageOperationDefinitions,
    Value,
};

use crate::config::DebugConfig;
use crate::executor::{ExecutionRequest, OperationExecutor, OperationRender};
use crate::traits::ModuleDeclaration;

/// Materialized configuration of one module, after auto-generation.
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    pub collections: Arc<StorageModuleCollections>,
    pub operations: Arc<StorageOperationDefinitions>,
}

/// A unit declaring storage collections and named operations.
pub struct StorageModule {
    name: String,
    declaration: Box<dyn ModuleDeclaration>,
    executor: Option<Arc<dyn OperationExecutor>>,
    debug: Option<DebugConfig>,
    /// `None` until the first successful initialization.
    config: Mutex<Option<Arc<ModuleConfig>>>,
}

impl StorageModule {
    /// Creates a module without an executor: its operations resolve to `None`.
    #[must_use]
    pub fn new(name: impl Into<String>, declaration: impl ModuleDeclaration + 'static) -> Self {
        Self::builder(name, declaration).build()
    }

    #[must_use]
    pub fn builder(
        name: impl Into<String>,
        declaration: impl ModuleDeclaration + 'static,
    ) -> StorageModuleBuilder {
        StorageModuleBuilder {
            name: name.into(),
            declaration: Box::new(declaration),
            executor: None,
            debug: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the configuration has been materialized.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.config.lock().is_some()
    }

    /// Returns the module configuration, materializing it on first call.
    ///
    /// The lock is held across the declaration callback, so concurrent first
    /// callers observe exactly one invocation.
    ///
    /// # Errors
    ///
    /// - [`ModuleError::Declaration`] if the declaration callback fails.
    /// - Any error from [`autogen::generate`]. Nothing is cached in either case.
    pub fn config(&self) -> Result<Arc<ModuleConfig>> {
        let mut slot = self.config.lock();
        if let Some(config) = slot.as_ref() {
            return Ok(Arc::clone(config));
        }

        let declared = self.declaration.declare().map_err(ModuleError::Declaration)?;
        let mut operations = declared.operations;
        if let Err(e) = autogen::generate(&mut operations, &declared.collections) {
            tracing::warn!(module = %self.name, error = %e, "module configuration rejected");
            return Err(e);
        }

        let config = Arc::new(ModuleConfig {
            collections: Arc::new(declared.collections),
            operations: Arc::new(operations),
        });
        tracing::debug!(
            module = %self.name,
            collections = config.collections.len(),
            operations = config.operations.len(),
            "module configuration initialized"
        );
        *slot = Some(Arc::clone(&config));
        Ok(config)
    }

    /// Collections declared by this module.
    ///
    /// # Errors
    ///
    /// See [`StorageModule::config`].
    pub fn collections(&self) -> Result<Arc<StorageModuleCollections>> {
        Ok(Arc::clone(&self.config()?.collections))
    }

    /// Operations declared by this module, with generated `createObject` arguments.
    ///
    /// # Errors
    ///
    /// See [`StorageModule::config`].
    pub fn operations(&self) -> Result<Arc<StorageOperationDefinitions>> {
        Ok(Arc::clone(&self.config()?.operations))
    }

    /// Runs the module operation `name` against `context`.
    ///
    /// Returns `Ok(None)` when the module has no executor.
    ///
    /// # Errors
    ///
    /// - [`ModuleError::UnknownOperation`] before any rendering if `name` is not declared.
    /// - Initialization, rendering and backend errors, unchanged.
    pub async fn operation(
        &self,
        name: &str,
        context: &RenderContext,
        method: Option<&str>,
    ) -> Result<Option<Value>> {
        let operations = self.operations()?;
        let definition = operations
            .get(name)
            .ok_or_else(|| ModuleError::UnknownOperation {
                name: name.to_string(),
            })?;

        let Some(executor) = &self.executor else {
            tracing::trace!(module = %self.name, operation = name, "no executor, skipping");
            return Ok(None);
        };

        let request = ExecutionRequest {
            name,
            context,
            method,
            debug: self.debug.as_ref(),
            render: OperationRender::new(definition, context),
        };
        executor.execute(request).await.map(Some)
    }
}

impl std::fmt::Debug for StorageModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageModule")
            .field("name", &self.name)
            .field("has_executor", &self.executor.is_some())
            .field("debug", &self.debug)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

/// Builder for [`StorageModule`].
pub struct StorageModuleBuilder {
    name: String,
    declaration: Box<dyn ModuleDeclaration>,
    executor: Option<Arc<dyn OperationExecutor>>,
    debug: Option<DebugConfig>,
}

impl StorageModuleBuilder {
    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn OperationExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: DebugConfig) -> Self {
        self.debug = Some(debug);
        self
    }

    #[must_use]
    pub fn build(self) -> StorageModule {
        StorageModule {
            name: self.name,
            declaration: self.declaration,
            executor: self.executor,
            debug: self.debug,
            config: Mutex::new(None),
        }
    }
}
