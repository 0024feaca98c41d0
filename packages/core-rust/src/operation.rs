//! Declarative operation definitions and the call descriptors they render to.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collection::CollectionSchema;
use crate::types::Value;

/// Wire name of the one operation kind with auto-generated arguments.
pub const CREATE_OBJECT: &str = "createObject";

/// Collections declared by a module, keyed by collection name.
pub type StorageModuleCollections = BTreeMap<String, CollectionSchema>;

/// Operations declared by a module, keyed by operation name.
pub type StorageOperationDefinitions = BTreeMap<String, OperationDefinition>;

/// Physical operation kind an operation definition dispatches to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationKind {
    /// Insert one object; arguments are derived from the collection schema.
    CreateObject,
    /// Any other backend-defined operation, passed through untouched.
    Other(String),
}

impl OperationKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            OperationKind::CreateObject => CREATE_OBJECT,
            OperationKind::Other(name) => name,
        }
    }

    #[must_use]
    pub fn is_create_object(&self) -> bool {
        matches!(self, OperationKind::CreateObject)
    }
}

impl From<String> for OperationKind {
    fn from(name: String) -> Self {
        if name == CREATE_OBJECT {
            OperationKind::CreateObject
        } else {
            OperationKind::Other(name)
        }
    }
}

impl From<&str> for OperationKind {
    fn from(name: &str) -> Self {
        OperationKind::from(name.to_string())
    }
}

impl From<OperationKind> for String {
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::CreateObject => CREATE_OBJECT.to_string(),
            OperationKind::Other(name) => name,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of an operation: a template before rendering, concrete values after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationArgs {
    /// Ordered arguments, spread into the backend call.
    Positional(Vec<Value>),
    /// Named arguments, passed to the backend as a single map.
    Named(BTreeMap<String, Value>),
}

impl OperationArgs {
    /// Builds named arguments from string-keyed pairs.
    pub fn named<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        OperationArgs::Named(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn positional<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        OperationArgs::Positional(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            OperationArgs::Positional(items) => items.is_empty(),
            OperationArgs::Named(entries) => entries.is_empty(),
        }
    }

    /// Appends these arguments to a positional call list.
    fn push_into(self, out: &mut Vec<Value>) {
        match self {
            OperationArgs::Positional(items) => out.extend(items),
            OperationArgs::Named(entries) => out.push(Value::Map(entries)),
        }
    }
}

/// Declarative definition of one module operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDefinition {
    /// Physical operation kind.
    pub operation: OperationKind,
    /// Target collection. Required for `createObject`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    /// Argument template. Generated for `createObject` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<OperationArgs>,
}

impl OperationDefinition {
    #[must_use]
    pub fn new(operation: impl Into<OperationKind>) -> Self {
        Self {
            operation: operation.into(),
            collection: None,
            args: None,
        }
    }

    /// A `createObject` operation on `collection` whose arguments will be generated.
    #[must_use]
    pub fn create_object(collection: impl Into<String>) -> Self {
        Self::new(OperationKind::CreateObject).collection(collection)
    }

    #[must_use]
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    #[must_use]
    pub fn args(mut self, args: OperationArgs) -> Self {
        self.args = Some(args);
        self
    }
}

/// Raw declaration of a module: its collections and operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageModuleConfig {
    #[serde(default)]
    pub collections: StorageModuleCollections,
    #[serde(default)]
    pub operations: StorageOperationDefinitions,
}

impl StorageModuleConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn collection(mut self, name: impl Into<String>, schema: impl Into<CollectionSchema>) -> Self {
        self.collections.insert(name.into(), schema.into());
        self
    }

    #[must_use]
    pub fn operation(mut self, name: impl Into<String>, definition: OperationDefinition) -> Self {
        self.operations.insert(name.into(), definition);
        self
    }
}

/// A rendered operation, ready for dispatch to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CallDescriptor {
    pub operation: String,
    pub collection: Option<String>,
    pub args: OperationArgs,
}

impl CallDescriptor {
    /// Splits into the operation kind and the positional backend arguments:
    /// the collection name (if any), then a single map for named arguments
    /// or every element for positional ones.
    #[must_use]
    pub fn into_positional(self) -> (String, Vec<Value>) {
        let mut args = Vec::new();
        if let Some(collection) = self.collection {
            args.push(Value::String(collection));
        }
        self.args.push_into(&mut args);
        (self.operation, args)
    }

    /// Full call as a flat list: `[operation, collection?, args...]`.
    #[must_use]
    pub fn to_values(&self) -> Vec<Value> {
        let (operation, args) = self.clone().into_positional();
        let mut values = Vec::with_capacity(args.len() + 1);
        values.push(Value::String(operation));
        values.extend(args);
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_object_kind_is_recognized() {
        assert_eq!(OperationKind::from("createObject"), OperationKind::CreateObject);
        assert_eq!(
            OperationKind::from("findObjects"),
            OperationKind::Other("findObjects".into())
        );
        assert_eq!(OperationKind::CreateObject.as_str(), "createObject");
    }

    #[test]
    fn definition_parses_from_json() {
        let def: OperationDefinition = serde_json::from_str(
            r#"{"operation": "findObjects", "collection": "note", "args": {"title": "$title"}}"#,
        )
        .unwrap();
        assert_eq!(def.operation, OperationKind::Other("findObjects".into()));
        assert_eq!(def.collection.as_deref(), Some("note"));
        assert_eq!(def.args, Some(OperationArgs::named([("title", "$title")])));
    }

    #[test]
    fn positional_args_parse_from_array() {
        let args: OperationArgs = serde_json::from_str(r#"[{"id": "$id"}, "$updates"]"#).unwrap();
        assert!(matches!(args, OperationArgs::Positional(ref items) if items.len() == 2));
    }

    #[test]
    fn named_args_are_one_positional_value() {
        let call = CallDescriptor {
            operation: "createObject".into(),
            collection: Some("note".into()),
            args: OperationArgs::named([("title", "Hello")]),
        };
        let (operation, args) = call.into_positional();
        assert_eq!(operation, "createObject");
        assert_eq!(
            args,
            vec![
                Value::from("note"),
                Value::map([("title", Value::from("Hello"))])
            ]
        );
    }

    #[test]
    fn positional_args_are_spread() {
        let call = CallDescriptor {
            operation: "updateObjects".into(),
            collection: Some("note".into()),
            args: OperationArgs::positional([Value::from("a"), Value::from("b")]),
        };
        assert_eq!(
            call.to_values(),
            vec![
                Value::from("updateObjects"),
                Value::from("note"),
                Value::from("a"),
                Value::from("b")
            ]
        );
    }

    #[test]
    fn collection_is_omitted_when_absent() {
        let call = CallDescriptor {
            operation: "rawQuery".into(),
            collection: None,
            args: OperationArgs::positional(["SELECT 1"]),
        };
        assert_eq!(call.to_values(), vec![Value::from("rawQuery"), Value::from("SELECT 1")]);
    }

    #[test]
    fn module_config_parses_with_defaults() {
        let config: StorageModuleConfig = serde_json::from_str(
            r#"{"collections": {"note": {"version": 1, "fields": {"title": {"type": "string"}}}}}"#,
        )
        .unwrap();
        assert_eq!(config.collections.len(), 1);
        assert!(config.operations.is_empty());
    }
}
