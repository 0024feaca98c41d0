//! Argument generation for `createObject` operations.
//!
//! Module authors may declare a `createObject` operation with only a target
//! collection. [`generate`] fills in its argument template from the latest
//! shape of that collection: one typed placeholder per field and one untyped
//! placeholder per child-of relationship.

use std::collections::BTreeMap;

use crate::collection::{CollectionDefinition, CollectionSchema};
use crate::error::{ModuleError, Result};
use crate::operation::{
    OperationArgs, OperationDefinition, StorageModuleCollections, StorageOperationDefinitions,
};
use crate::template::placeholder;
use crate::types::Value;

/// Generates argument templates for every `createObject` operation lacking one.
///
/// Operations that already carry a template, even an empty one, are left
/// untouched. Templates are computed for all operations before any is
/// written back, so on error `operations` is unchanged.
///
/// # Errors
///
/// - [`ModuleError::InvalidOperation`] if a `createObject` operation names no collection.
/// - [`ModuleError::UnresolvedCollection`] if it names an undeclared collection.
/// - [`ModuleError::InvalidHistory`] if the collection is an empty revision sequence.
pub fn generate(
    operations: &mut StorageOperationDefinitions,
    collections: &StorageModuleCollections,
) -> Result<()> {
    let mut generated = Vec::new();
    for (name, definition) in operations.iter() {
        if !definition.operation.is_create_object() || definition.args.is_some() {
            continue;
        }
        let args = create_object_args(name, definition, collections)?;
        tracing::debug!(
            operation = name.as_str(),
            arg_count = args.len(),
            "generated createObject arguments"
        );
        generated.push((name.clone(), args));
    }

    for (name, args) in generated {
        if let Some(definition) = operations.get_mut(&name) {
            definition.args = Some(OperationArgs::Named(args));
        }
    }
    Ok(())
}

fn create_object_args(
    name: &str,
    definition: &OperationDefinition,
    collections: &StorageModuleCollections,
) -> Result<BTreeMap<String, Value>> {
    let collection = definition
        .collection
        .as_deref()
        .ok_or_else(|| ModuleError::InvalidOperation {
            operation: name.to_string(),
            reason: "createObject requires a target collection".to_string(),
        })?;

    let schema = collections
        .get(collection)
        .ok_or_else(|| ModuleError::UnresolvedCollection {
            operation: name.to_string(),
            collection: collection.to_string(),
        })?;

    let latest = latest_definition(collection, schema)?;
    Ok(template_for(latest))
}

fn latest_definition<'a>(
    collection: &str,
    schema: &'a CollectionSchema,
) -> Result<&'a CollectionDefinition> {
    schema.latest().ok_or_else(|| ModuleError::InvalidHistory {
        collection: collection.to_string(),
        reason: "revision sequence is empty".to_string(),
    })
}

/// Builds the named `createObject` template for one collection revision.
#[must_use]
pub fn template_for(definition: &CollectionDefinition) -> BTreeMap<String, Value> {
    let mut args = BTreeMap::new();
    for (field, field_def) in &definition.fields {
        args.insert(
            field.clone(),
            Value::String(placeholder(field, Some(field_def.field_type.as_str()))),
        );
    }
    for alias in definition
        .child_of_relationships()
        .filter_map(|rel| rel.child_of_alias())
    {
        args.insert(alias.to_string(), Value::String(placeholder(alias, None)));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{FieldDefinition, Relationship};
    use crate::version::SchemaVersion;

    fn collections(entries: Vec<(&str, CollectionSchema)>) -> StorageModuleCollections {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn ops(entries: Vec<(&str, OperationDefinition)>) -> StorageOperationDefinitions {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn args_of(operations: &StorageOperationDefinitions, name: &str) -> OperationArgs {
        operations[name].args.clone().unwrap()
    }

    #[test]
    fn fields_become_typed_placeholders() {
        let cols = collections(vec![(
            "thing",
            CollectionDefinition::new(SchemaVersion(1))
                .field("a", FieldDefinition::new("string"))
                .field("b", FieldDefinition::new("integer"))
                .into(),
        )]);
        let mut operations = ops(vec![("createThing", OperationDefinition::create_object("thing"))]);

        generate(&mut operations, &cols).unwrap();

        assert_eq!(
            args_of(&operations, "createThing"),
            OperationArgs::named([("a", "$a:string"), ("b", "$b:integer")])
        );
    }

    #[test]
    fn child_of_uses_target_name_without_alias() {
        let cols = collections(vec![(
            "entry",
            CollectionDefinition::new(SchemaVersion(1))
                .field("label", FieldDefinition::new("text"))
                .relationship(Relationship::child_of("parent"))
                .into(),
        )]);
        let mut operations = ops(vec![("createEntry", OperationDefinition::create_object("entry"))]);

        generate(&mut operations, &cols).unwrap();

        assert_eq!(
            args_of(&operations, "createEntry"),
            OperationArgs::named([("label", "$label:text"), ("parent", "$parent")])
        );
    }

    #[test]
    fn child_of_uses_explicit_alias() {
        let cols = collections(vec![(
            "entry",
            CollectionDefinition::new(SchemaVersion(1))
                .relationship(Relationship::child_of("parent").with_alias("owner"))
                .into(),
        )]);
        let mut operations = ops(vec![("createEntry", OperationDefinition::create_object("entry"))]);

        generate(&mut operations, &cols).unwrap();

        assert_eq!(
            args_of(&operations, "createEntry"),
            OperationArgs::named([("owner", "$owner")])
        );
    }

    #[test]
    fn connects_relationships_are_ignored() {
        let cols = collections(vec![(
            "link",
            CollectionDefinition::new(SchemaVersion(1))
                .relationship(Relationship::Connects {
                    collections: ["a".into(), "b".into()],
                    aliases: None,
                })
                .into(),
        )]);
        let mut operations = ops(vec![("createLink", OperationDefinition::create_object("link"))]);

        generate(&mut operations, &cols).unwrap();

        assert!(args_of(&operations, "createLink").is_empty());
    }

    #[test]
    fn existing_template_is_kept_even_if_empty() {
        let cols = collections(vec![(
            "thing",
            CollectionDefinition::new(SchemaVersion(1))
                .field("a", FieldDefinition::new("string"))
                .into(),
        )]);
        let empty = OperationArgs::Named(BTreeMap::new());
        let custom = OperationArgs::named([("a", "fixed")]);
        let mut operations = ops(vec![
            (
                "createEmpty",
                OperationDefinition::create_object("thing").args(empty.clone()),
            ),
            (
                "createCustom",
                OperationDefinition::create_object("thing").args(custom.clone()),
            ),
        ]);

        generate(&mut operations, &cols).unwrap();

        assert_eq!(args_of(&operations, "createEmpty"), empty);
        assert_eq!(args_of(&operations, "createCustom"), custom);
    }

    #[test]
    fn generation_is_idempotent() {
        let cols = collections(vec![(
            "thing",
            CollectionDefinition::new(SchemaVersion(1))
                .field("a", FieldDefinition::new("string"))
                .into(),
        )]);
        let mut operations = ops(vec![("createThing", OperationDefinition::create_object("thing"))]);

        generate(&mut operations, &cols).unwrap();
        let once = operations.clone();
        generate(&mut operations, &cols).unwrap();

        assert_eq!(operations, once);
    }

    #[test]
    fn other_kinds_are_untouched() {
        let mut operations = ops(vec![(
            "findThings",
            OperationDefinition::new("findObjects").collection("missing"),
        )]);

        generate(&mut operations, &StorageModuleCollections::new()).unwrap();

        assert!(operations["findThings"].args.is_none());
    }

    #[test]
    fn history_sequence_uses_last_revision() {
        let cols = collections(vec![(
            "thing",
            CollectionSchema::Versions(vec![
                CollectionDefinition::new(SchemaVersion(1)).field("old", FieldDefinition::new("string")),
                CollectionDefinition::new(SchemaVersion(2)).field("new", FieldDefinition::new("boolean")),
            ]),
        )]);
        let mut operations = ops(vec![("createThing", OperationDefinition::create_object("thing"))]);

        generate(&mut operations, &cols).unwrap();

        assert_eq!(
            args_of(&operations, "createThing"),
            OperationArgs::named([("new", "$new:boolean")])
        );
    }

    #[test]
    fn unknown_collection_fails_and_leaves_operations_unchanged() {
        let cols = collections(vec![(
            "thing",
            CollectionDefinition::new(SchemaVersion(1))
                .field("a", FieldDefinition::new("string"))
                .into(),
        )]);
        let mut operations = ops(vec![
            ("createThing", OperationDefinition::create_object("thing")),
            ("createGhost", OperationDefinition::create_object("ghost")),
        ]);
        let before = operations.clone();

        let err = generate(&mut operations, &cols).unwrap_err();

        assert!(matches!(
            err,
            ModuleError::UnresolvedCollection { ref operation, ref collection }
                if operation == "createGhost" && collection == "ghost"
        ));
        assert_eq!(operations, before);
    }

    #[test]
    fn create_object_without_collection_is_invalid() {
        let mut operations = ops(vec![(
            "createNothing",
            OperationDefinition::new(crate::operation::OperationKind::CreateObject),
        )]);
        let err = generate(&mut operations, &StorageModuleCollections::new()).unwrap_err();
        assert!(matches!(err, ModuleError::InvalidOperation { .. }));
    }
}
