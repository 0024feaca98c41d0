//! `stormod` Core — collection schemas, schema history, and operation templates.

pub mod autogen;
pub mod collection;
pub mod error;
pub mod history;
pub mod operation;
pub mod template;
pub mod types;
pub mod version;

pub use collection::{
    CollectionDefinition, CollectionSchema, FieldDefinition, FieldType, Relationship,
};
pub use error::{ModuleError, Result};
pub use history::{resolve, ResolvedCollection};
pub use operation::{
    CallDescriptor, OperationArgs, OperationDefinition, OperationKind, StorageModuleCollections,
    StorageModuleConfig, StorageOperationDefinitions, CREATE_OBJECT,
};
pub use template::{render, render_args, render_operation, Placeholder};
pub use types::{RenderContext, Value};
pub use version::{ClockSource, FixedClock, SchemaVersion, SystemClock};
