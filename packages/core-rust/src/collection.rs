//! Collection schemas: fields, relationships and revision chains.
//!
//! A module declares each of its collections either as a single
//! [`CollectionDefinition`] (optionally carrying its prior revisions in
//! `history`) or as an explicit sequence of revisions, oldest first. Both
//! shapes are captured by [`CollectionSchema`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::SchemaVersion;

/// Declared scalar type of a collection field.
///
/// The spelling given in the declaration is preserved and echoed back by
/// [`FieldType::as_str`], which is what auto-generated type hints carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Text,
    Json,
    Datetime,
    Timestamp,
    Boolean,
    Float,
    Int,
    Integer,
    Blob,
    Binary,
    Url,
    Media,
    /// Backend-specific type not known to this crate.
    Custom(String),
}

impl FieldType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Json => "json",
            FieldType::Datetime => "datetime",
            FieldType::Timestamp => "timestamp",
            FieldType::Boolean => "boolean",
            FieldType::Float => "float",
            FieldType::Int => "int",
            FieldType::Integer => "integer",
            FieldType::Blob => "blob",
            FieldType::Binary => "binary",
            FieldType::Url => "url",
            FieldType::Media => "media",
            FieldType::Custom(name) => name,
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "string" => FieldType::String,
            "text" => FieldType::Text,
            "json" => FieldType::Json,
            "datetime" => FieldType::Datetime,
            "timestamp" => FieldType::Timestamp,
            "boolean" => FieldType::Boolean,
            "float" => FieldType::Float,
            "int" => FieldType::Int,
            "integer" => FieldType::Integer,
            "blob" => FieldType::Blob,
            "binary" => FieldType::Binary,
            "url" => FieldType::Url,
            "media" => FieldType::Media,
            _ => FieldType::Custom(name),
        }
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        FieldType::from(name.to_string())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single field definition within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Declared scalar type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether objects may omit this field.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl FieldDefinition {
    #[must_use]
    pub fn new(field_type: impl Into<FieldType>) -> Self {
        Self {
            field_type: field_type.into(),
            optional: false,
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Reference from one collection to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRelationship", into = "RawRelationship")]
pub enum Relationship {
    /// The owning object is created together with its parent's identifier.
    ChildOf {
        /// Name of the parent collection.
        target: String,
        /// Key under which the parent reference is passed. Defaults to `target`.
        alias: Option<String>,
        /// At most one child per parent (`singleChildOf`).
        single: bool,
    },
    /// Many-to-many link between two collections.
    Connects {
        collections: [String; 2],
        aliases: Option<[String; 2]>,
    },
}

impl Relationship {
    /// A `childOf` relationship to `target` without an alias.
    #[must_use]
    pub fn child_of(target: impl Into<String>) -> Self {
        Relationship::ChildOf {
            target: target.into(),
            alias: None,
            single: false,
        }
    }

    /// Sets the alias of a child-of relationship. No effect on other kinds.
    #[must_use]
    pub fn with_alias(self, new_alias: impl Into<String>) -> Self {
        match self {
            Relationship::ChildOf { target, single, .. } => Relationship::ChildOf {
                target,
                alias: Some(new_alias.into()),
                single,
            },
            other => other,
        }
    }

    #[must_use]
    pub fn is_child_of(&self) -> bool {
        matches!(self, Relationship::ChildOf { .. })
    }

    /// Key under which a child-of relationship's parent reference travels:
    /// the explicit alias if present, else the parent collection's name.
    #[must_use]
    pub fn child_of_alias(&self) -> Option<&str> {
        match self {
            Relationship::ChildOf { target, alias, .. } => {
                Some(alias.as_deref().unwrap_or(target))
            }
            Relationship::Connects { .. } => None,
        }
    }
}

/// Declaration-file shape of a relationship: exactly one of the kind keys is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRelationship {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    child_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    single_child_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connects: Option<[String; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aliases: Option<[String; 2]>,
}

impl TryFrom<RawRelationship> for Relationship {
    type Error = String;

    fn try_from(raw: RawRelationship) -> Result<Self, Self::Error> {
        match (raw.child_of, raw.single_child_of, raw.connects) {
            (Some(target), None, None) => Ok(Relationship::ChildOf {
                target,
                alias: raw.alias,
                single: false,
            }),
            (None, Some(target), None) => Ok(Relationship::ChildOf {
                target,
                alias: raw.alias,
                single: true,
            }),
            (None, None, Some(collections)) => Ok(Relationship::Connects {
                collections,
                aliases: raw.aliases,
            }),
            (None, None, None) => Err(
                "relationship needs one of childOf, singleChildOf or connects".to_string(),
            ),
            _ => Err("relationship declares more than one kind".to_string()),
        }
    }
}

impl From<Relationship> for RawRelationship {
    fn from(relationship: Relationship) -> Self {
        match relationship {
            Relationship::ChildOf {
                target,
                alias,
                single,
            } => {
                let mut raw = RawRelationship {
                    alias,
                    ..RawRelationship::default()
                };
                if single {
                    raw.single_child_of = Some(target);
                } else {
                    raw.child_of = Some(target);
                }
                raw
            }
            Relationship::Connects {
                collections,
                aliases,
            } => RawRelationship {
                connects: Some(collections),
                aliases,
                ..RawRelationship::default()
            },
        }
    }
}

/// One revision of a collection's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDefinition {
    /// Moment from which this revision is effective.
    pub version: SchemaVersion,
    pub fields: BTreeMap<String, FieldDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    /// Names of indexed fields, passed through to the registry untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<String>,
    /// Prior revisions of this collection, oldest first. The definition
    /// itself is implicitly the newest revision.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<CollectionDefinition>,
}

impl CollectionDefinition {
    #[must_use]
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            version,
            fields: BTreeMap::new(),
            relationships: Vec::new(),
            indices: Vec::new(),
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.fields.insert(name.into(), definition);
        self
    }

    #[must_use]
    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    #[must_use]
    pub fn index(mut self, field: impl Into<String>) -> Self {
        self.indices.push(field.into());
        self
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<CollectionDefinition>) -> Self {
        self.history = history;
        self
    }

    /// Iterates the child-of relationships of this revision.
    pub fn child_of_relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(|r| r.is_child_of())
    }
}

/// How a module declares one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionSchema {
    /// Explicit revision sequence, oldest first.
    Versions(Vec<CollectionDefinition>),
    /// Current definition, optionally carrying prior revisions in `history`.
    Definition(CollectionDefinition),
}

impl CollectionSchema {
    /// Most recent shape of the collection, ignoring effective-from times.
    ///
    /// `None` only for an empty revision sequence.
    #[must_use]
    pub fn latest(&self) -> Option<&CollectionDefinition> {
        match self {
            CollectionSchema::Versions(versions) => versions.last(),
            CollectionSchema::Definition(definition) => Some(definition),
        }
    }
}

impl From<CollectionDefinition> for CollectionSchema {
    fn from(definition: CollectionDefinition) -> Self {
        CollectionSchema::Definition(definition)
    }
}

impl From<Vec<CollectionDefinition>> for CollectionSchema {
    fn from(versions: Vec<CollectionDefinition>) -> Self {
        CollectionSchema::Versions(versions)
    }
}
