use async_trait::async_trait;
use stormod_core::{ResolvedCollection, StorageModuleConfig, Value};

/// Storage backend that executes physical operations.
///
/// `args` is the positional argument list of the call: the target collection
/// name first when the operation has one, then either a single map of named
/// arguments or each positional argument in order.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Execute one physical operation and return its raw result.
    async fn operation(&self, operation: &str, args: Vec<Value>) -> anyhow::Result<Value>;
}

/// Schema registry that receives resolved collection definitions.
pub trait CollectionRegistry: Send + Sync {
    /// Register the qualifying revisions of one collection, oldest first.
    fn register_collection(&self, name: &str, collection: ResolvedCollection) -> anyhow::Result<()>;
}

/// Source of a module's collections and operations.
///
/// Called when a module's configuration is first needed, and again on a
/// later access only if the previous call failed. Plain closures returning a
/// [`StorageModuleConfig`] qualify.
pub trait ModuleDeclaration: Send + Sync {
    /// Produce the raw (not yet auto-generated) module configuration.
    fn declare(&self) -> anyhow::Result<StorageModuleConfig>;
}

impl<F> ModuleDeclaration for F
where
    F: Fn() -> StorageModuleConfig + Send + Sync,
{
    fn declare(&self) -> anyhow::Result<StorageModuleConfig> {
        Ok(self())
    }
}
