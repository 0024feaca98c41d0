//! In-memory [`StorageBackend`] for tests and the CLI.
//!
//! Objects live in per-collection vectors behind a mutex. Filters are
//! equality maps (`{"field": value}`); a missing or empty filter matches
//! every object. Every call is recorded and can be inspected via
//! [`MemoryBackend::calls`].

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use stormod_core::Value;

use crate::traits::StorageBackend;

type Object = BTreeMap<String, Value>;

/// Errors raised by [`MemoryBackend`] for calls it cannot interpret.
#[derive(Debug, thiserror::Error)]
pub enum MemoryBackendError {
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("{operation}: expected collection name as first argument")]
    MissingCollection { operation: String },
    #[error("{operation}: argument {position} must be an object")]
    ExpectedObject { operation: String, position: usize },
}

/// One call received by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: String,
    pub args: Vec<Value>,
}

#[derive(Default)]
struct MemoryState {
    collections: HashMap<String, Vec<Object>>,
    next_id: i64,
    calls: Vec<RecordedCall>,
}

/// Backend keeping all objects in memory.
///
/// Supports `createObject`, `findObject`, `findObjects`, `countObjects`,
/// `updateObjects` and `deleteObjects`.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// Current objects of `collection`.
    #[must_use]
    pub fn objects(&self, collection: &str) -> Vec<Value> {
        self.state
            .lock()
            .collections
            .get(collection)
            .map(|objects| objects.iter().cloned().map(Value::Map).collect())
            .unwrap_or_default()
    }

    fn apply(&self, operation: &str, args: &[Value]) -> Result<Value, MemoryBackendError> {
        let collection = args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| MemoryBackendError::MissingCollection {
                operation: operation.to_string(),
            })?;
        let mut state = self.state.lock();

        match operation {
            "createObject" => {
                let mut object = object_arg(operation, args, 1)?.cloned().unwrap_or_default();
                if !object.contains_key("id") {
                    state.next_id += 1;
                    object.insert("id".to_string(), Value::Int(state.next_id));
                }
                state
                    .collections
                    .entry(collection.to_string())
                    .or_default()
                    .push(object.clone());
                Ok(Value::map([("object", Value::Map(object))]))
            }
            "findObject" => {
                let filter = object_arg(operation, args, 1)?;
                Ok(matching(&state, collection, filter)
                    .next()
                    .map_or(Value::Null, |object| Value::Map(object.clone())))
            }
            "findObjects" => {
                let filter = object_arg(operation, args, 1)?;
                Ok(Value::Array(
                    matching(&state, collection, filter)
                        .map(|object| Value::Map(object.clone()))
                        .collect(),
                ))
            }
            "countObjects" => {
                let filter = object_arg(operation, args, 1)?;
                let count = matching(&state, collection, filter).count();
                Ok(Value::Int(i64::try_from(count).unwrap_or(i64::MAX)))
            }
            "updateObjects" => {
                let filter = object_arg(operation, args, 1)?.cloned();
                let updates = object_arg(operation, args, 2)?.cloned().unwrap_or_default();
                if let Some(objects) = state.collections.get_mut(collection) {
                    for object in objects.iter_mut().filter(|o| matches(o, filter.as_ref())) {
                        object.extend(updates.clone());
                    }
                }
                Ok(Value::Null)
            }
            "deleteObjects" => {
                let filter = object_arg(operation, args, 1)?.cloned();
                if let Some(objects) = state.collections.get_mut(collection) {
                    objects.retain(|o| !matches(o, filter.as_ref()));
                }
                Ok(Value::Null)
            }
            other => Err(MemoryBackendError::UnsupportedOperation(other.to_string())),
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn operation(&self, operation: &str, args: Vec<Value>) -> anyhow::Result<Value> {
        let result = self.apply(operation, &args);
        self.state.lock().calls.push(RecordedCall {
            operation: operation.to_string(),
            args,
        });
        Ok(result?)
    }
}

/// Argument `position` as an object; absent or `Null` reads as `None`.
fn object_arg<'a>(
    operation: &str,
    args: &'a [Value],
    position: usize,
) -> Result<Option<&'a Object>, MemoryBackendError> {
    match args.get(position) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Map(object)) => Ok(Some(object)),
        Some(_) => Err(MemoryBackendError::ExpectedObject {
            operation: operation.to_string(),
            position,
        }),
    }
}

fn matches(object: &Object, filter: Option<&Object>) -> bool {
    filter.is_none_or(|filter| {
        filter
            .iter()
            .all(|(key, expected)| object.get(key) == Some(expected))
    })
}

fn matching<'a>(
    state: &'a MemoryState,
    collection: &str,
    filter: Option<&'a Object>,
) -> impl Iterator<Item = &'a Object> {
    state
        .collections
        .get(collection)
        .into_iter()
        .flatten()
        .filter(move |object| matches(object, filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(entries: &[(&str, Value)]) -> Value {
        Value::map(entries.iter().map(|(k, v)| (*k, v.clone())))
    }

    async fn create(backend: &MemoryBackend, title: &str) -> Value {
        backend
            .operation(
                "createObject",
                vec![Value::from("note"), obj(&[("title", Value::from(title))])],
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_assigns_incremental_ids() {
        let backend = MemoryBackend::new();
        let first = create(&backend, "a").await;
        let second = create(&backend, "b").await;

        let id = |v: &Value| {
            v.as_map()
                .and_then(|m| m.get("object"))
                .and_then(Value::as_map)
                .and_then(|m| m.get("id"))
                .and_then(Value::as_int)
        };
        assert_eq!(id(&first), Some(1));
        assert_eq!(id(&second), Some(2));
        assert_eq!(backend.objects("note").len(), 2);
    }

    #[tokio::test]
    async fn find_and_count_filter_by_equality() {
        let backend = MemoryBackend::new();
        create(&backend, "a").await;
        create(&backend, "b").await;
        let filter = obj(&[("title", Value::from("b"))]);

        let found = backend
            .operation("findObject", vec![Value::from("note"), filter.clone()])
            .await
            .unwrap();
        assert_eq!(
            found.as_map().and_then(|m| m.get("title")),
            Some(&Value::from("b"))
        );

        let all = backend
            .operation("findObjects", vec![Value::from("note")])
            .await
            .unwrap();
        assert!(matches!(all, Value::Array(ref items) if items.len() == 2));

        let count = backend
            .operation("countObjects", vec![Value::from("note"), filter])
            .await
            .unwrap();
        assert_eq!(count, Value::Int(1));
    }

    #[tokio::test]
    async fn update_and_delete_apply_to_matches() {
        let backend = MemoryBackend::new();
        create(&backend, "a").await;
        create(&backend, "b").await;

        backend
            .operation(
                "updateObjects",
                vec![
                    Value::from("note"),
                    obj(&[("title", Value::from("a"))]),
                    obj(&[("done", Value::Bool(true))]),
                ],
            )
            .await
            .unwrap();
        let done = backend
            .operation(
                "countObjects",
                vec![Value::from("note"), obj(&[("done", Value::Bool(true))])],
            )
            .await
            .unwrap();
        assert_eq!(done, Value::Int(1));

        backend
            .operation(
                "deleteObjects",
                vec![Value::from("note"), obj(&[("title", Value::from("a"))])],
            )
            .await
            .unwrap();
        assert_eq!(backend.objects("note").len(), 1);
    }

    #[tokio::test]
    async fn missing_collection_yields_empty_results() {
        let backend = MemoryBackend::new();
        let found = backend
            .operation("findObject", vec![Value::from("nothing")])
            .await
            .unwrap();
        assert!(found.is_null());
    }

    #[tokio::test]
    async fn unsupported_operation_fails_but_is_recorded() {
        let backend = MemoryBackend::new();
        let err = backend
            .operation("explode", vec![Value::from("note")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported operation: explode"));
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn malformed_arguments_are_rejected() {
        let backend = MemoryBackend::new();
        assert!(backend.operation("findObjects", Vec::new()).await.is_err());
        assert!(backend
            .operation("findObjects", vec![Value::from("note"), Value::Int(1)])
            .await
            .is_err());
    }
}
