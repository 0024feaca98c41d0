//! No-op [`StorageBackend`] implementation.
//!
//! [`NullBackend`] accepts every operation and returns `Null`. Useful for
//! exercising module wiring and debug traces without any storage.

use async_trait::async_trait;
use stormod_core::Value;

use crate::traits::StorageBackend;

/// Backend that discards every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

#[async_trait]
impl StorageBackend for NullBackend {
    async fn operation(&self, _operation: &str, _args: Vec<Value>) -> anyhow::Result<Value> {
        Ok(Value::Null)
    }
}
