//! Operation executor bridge.
//!
//! A [`StorageModule`](crate::module::StorageModule) never talks to a backend
//! directly. It hands an [`ExecutionRequest`] to an [`OperationExecutor`],
//! which decides when (and whether) to render the operation and how to
//! dispatch the rendered call. [`DefaultOperationExecutor`] dispatches to a
//! [`StorageBackend`](crate::traits::StorageBackend) with optional tracing.

pub mod debug;
pub mod default;

use async_trait::async_trait;
use stormod_core::{render_operation, CallDescriptor, OperationDefinition, RenderContext, Result, Value};

use crate::config::DebugConfig;

pub use default::DefaultOperationExecutor;

/// Deferred rendering of one operation against its context.
#[derive(Debug, Clone, Copy)]
pub struct OperationRender<'a> {
    definition: &'a OperationDefinition,
    context: &'a RenderContext,
}

impl<'a> OperationRender<'a> {
    #[must_use]
    pub fn new(definition: &'a OperationDefinition, context: &'a RenderContext) -> Self {
        Self {
            definition,
            context,
        }
    }

    #[must_use]
    pub fn definition(&self) -> &'a OperationDefinition {
        self.definition
    }

    /// Renders the operation into `[kind, collection?, args]`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::MissingContextKey`](stormod_core::ModuleError::MissingContextKey)
    /// if the template references a key absent from the context.
    pub fn render(&self) -> Result<CallDescriptor> {
        render_operation(self.definition, self.context)
    }
}

/// Everything an executor receives for one `operation(...)` call.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionRequest<'a> {
    /// Module operation name, e.g. `createNote`.
    pub name: &'a str,
    pub context: &'a RenderContext,
    /// Caller-supplied method hint, passed through untouched.
    pub method: Option<&'a str>,
    /// Module-level debug configuration, if any.
    pub debug: Option<&'a DebugConfig>,
    pub render: OperationRender<'a>,
}

/// Executes module operations. Substitutable in tests with a recording stub.
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    /// Render (if needed) and dispatch one operation, returning the backend result.
    async fn execute(&self, request: ExecutionRequest<'_>) -> Result<Value>;
}
