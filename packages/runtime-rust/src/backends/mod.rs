//! Reference [`StorageBackend`](crate::traits::StorageBackend) implementations.

pub mod memory;
pub mod null;

pub use memory::{MemoryBackend, MemoryBackendError, RecordedCall};
pub use null::NullBackend;
