//! Default executor: render, trace, dispatch to a [`StorageBackend`].

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use stormod_core::{ModuleError, Result, Value};
use tracing::{info_span, Instrument};

use super::debug::{post_execution_trace, pre_execution_trace};
use super::{ExecutionRequest, OperationExecutor};
use crate::config::DebugConfig;
use crate::traits::StorageBackend;

/// Executor that renders each operation and forwards it to a storage backend.
///
/// Debug traces use the request's debug configuration when present, else the
/// executor's own. Every dispatch is wrapped in a `module_operation` span and
/// counted in the `stormod_backend_operations_total` metric.
pub struct DefaultOperationExecutor {
    backend: Arc<dyn StorageBackend>,
    debug: Option<DebugConfig>,
}

impl DefaultOperationExecutor {
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            debug: None,
        }
    }

    /// Enables debug traces for every request that carries no debug config of its own.
    #[must_use]
    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.debug = Some(debug);
        self
    }
}

#[async_trait]
impl OperationExecutor for DefaultOperationExecutor {
    async fn execute(&self, request: ExecutionRequest<'_>) -> Result<Value> {
        let (operation, args) = request.render.render()?.into_positional();
        let debug = request.debug.or(self.debug.as_ref());

        if let Some(line) =
            debug.and_then(|d| pre_execution_trace(d, request.name, &operation, &args))
        {
            tracing::debug!(
                module_operation = request.name,
                operation = operation.as_str(),
                "{line}"
            );
        }

        let span = info_span!(
            "module_operation",
            module_operation = request.name,
            operation = operation.as_str(),
        );
        let start = Instant::now();
        let result = self
            .backend
            .operation(&operation, args)
            .instrument(span)
            .await;

        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(
            "stormod_backend_operations_total",
            "operation" => operation.clone(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!(
            "stormod_backend_operation_duration_seconds",
            "operation" => operation.clone()
        )
        .record(start.elapsed().as_secs_f64());

        let value = result.map_err(ModuleError::Backend)?;

        if let Some(line) =
            debug.and_then(|d| post_execution_trace(d, request.name, &operation, &value))
        {
            tracing::debug!(
                module_operation = request.name,
                operation = operation.as_str(),
                "{line}"
            );
        }

        Ok(value)
    }
}
