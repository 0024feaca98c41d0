//! Error type shared by the core algorithms and the module runtime.

/// Errors raised while declaring, resolving, rendering or executing module operations.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// A placeholder names a key the render context does not carry.
    #[error("missing context key: {key}")]
    MissingContextKey { key: String },

    /// The module declares no operation with this name.
    #[error("unknown operation: {name}")]
    UnknownOperation { name: String },

    /// A `createObject` operation targets a collection the module does not declare.
    #[error("operation {operation} targets undeclared collection {collection}")]
    UnresolvedCollection {
        operation: String,
        collection: String,
    },

    /// An operation definition is structurally unusable.
    #[error("invalid operation {operation}: {reason}")]
    InvalidOperation { operation: String, reason: String },

    /// A collection's revision chain violates version ordering.
    #[error("invalid history for collection {collection}: {reason}")]
    InvalidHistory { collection: String, reason: String },

    /// Two modules declare a collection with the same name.
    #[error("collection {name} is declared by more than one module")]
    DuplicateCollection { name: String },

    /// The module's declaration callback failed.
    #[error("module declaration failed: {0}")]
    Declaration(#[source] anyhow::Error),

    /// The storage backend rejected or failed the call.
    #[error("backend error: {0}")]
    Backend(#[source] anyhow::Error),

    /// The collection registry rejected a registration.
    #[error("registry error: {0}")]
    Registry(#[source] anyhow::Error),
}

pub type Result<T, E = ModuleError> = std::result::Result<T, E>;
