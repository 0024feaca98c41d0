//! `stormod` Runtime — storage modules, operation executors, and collection registration.

pub mod backends;
pub mod config;
pub mod declaration;
pub mod executor;
pub mod module;
pub mod registry;
pub mod traits;

pub use config::{DebugConfig, DebugSetting};
pub use declaration::JsonDeclaration;
pub use executor::{DefaultOperationExecutor, ExecutionRequest, OperationExecutor, OperationRender};
pub use module::{ModuleConfig, StorageModule, StorageModuleBuilder};
pub use registry::{
    register_module_collections, register_module_registry_collections,
    CollectionRegistrar, InMemoryCollectionRegistry, StorageModuleRegistry,
};
pub use traits::{CollectionRegistry, ModuleDeclaration, StorageBackend};
