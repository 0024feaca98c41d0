//! Point-in-time resolution of collection revision chains.
//!
//! [`resolve`] turns a declared [`CollectionSchema`] into the list of
//! revisions that are effective as of a given moment, so a registry can
//! register only the schema revisions already active and stage later ones.

use crate::collection::{CollectionDefinition, CollectionSchema};
use crate::error::{ModuleError, Result};
use crate::version::SchemaVersion;

/// Revisions of one collection that qualify at a resolution time, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCollection {
    pub snapshots: Vec<CollectionDefinition>,
}

impl ResolvedCollection {
    /// The revision in effect: the most recent qualifying snapshot.
    #[must_use]
    pub fn effective(&self) -> Option<&CollectionDefinition> {
        self.snapshots.last()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}

/// Resolves `schema` to the revisions effective at or before `as_of`.
///
/// A plain definition without prior revisions is returned as-is, whatever its
/// version. A definition carrying `history` is placed after its prior
/// revisions to form the full chain; neither input is modified.
///
/// # Errors
///
/// Returns [`ModuleError::InvalidHistory`] if the chain's versions do not
/// strictly increase.
pub fn resolve(
    collection: &str,
    schema: &CollectionSchema,
    as_of: SchemaVersion,
) -> Result<ResolvedCollection> {
    let chain = match schema {
        CollectionSchema::Definition(definition) if definition.history.is_empty() => {
            return Ok(ResolvedCollection {
                snapshots: vec![definition.clone()],
            });
        }
        CollectionSchema::Definition(definition) => chronological_chain(definition),
        CollectionSchema::Versions(versions) => versions.clone(),
    };

    check_monotonic(collection, &chain)?;

    let snapshots: Vec<CollectionDefinition> = chain
        .into_iter()
        .filter(|revision| revision.version <= as_of)
        .collect();

    tracing::trace!(
        collection,
        as_of = as_of.as_millis(),
        qualifying = snapshots.len(),
        "resolved collection history"
    );

    Ok(ResolvedCollection { snapshots })
}

/// Builds `history ++ [current]`, with the current revision stripped of its history list.
fn chronological_chain(current: &CollectionDefinition) -> Vec<CollectionDefinition> {
    let mut chain = Vec::with_capacity(current.history.len() + 1);
    chain.extend(current.history.iter().cloned());
    chain.push(CollectionDefinition {
        history: Vec::new(),
        ..current.clone()
    });
    chain
}

fn check_monotonic(collection: &str, chain: &[CollectionDefinition]) -> Result<()> {
    for pair in chain.windows(2) {
        if pair[0].version >= pair[1].version {
            return Err(ModuleError::InvalidHistory {
                collection: collection.to_string(),
                reason: format!(
                    "version {} is not after version {}",
                    pair[1].version, pair[0].version
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::FieldDefinition;

    const T1: SchemaVersion = SchemaVersion(1_000);
    const T2: SchemaVersion = SchemaVersion(2_000);

    fn revision(version: SchemaVersion, field: &str) -> CollectionDefinition {
        CollectionDefinition::new(version).field(field, FieldDefinition::new("string"))
    }

    fn versions() -> CollectionSchema {
        CollectionSchema::Versions(vec![revision(T1, "f1"), revision(T2, "f2")])
    }

    #[test]
    fn before_first_version_nothing_qualifies() {
        let resolved = resolve("note", &versions(), SchemaVersion(500)).unwrap();
        assert!(resolved.is_empty());
        assert!(resolved.effective().is_none());
    }

    #[test]
    fn between_versions_only_first_qualifies() {
        let resolved = resolve("note", &versions(), SchemaVersion(1_500)).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.effective().unwrap().version, T1);
    }

    #[test]
    fn at_latest_version_both_qualify_in_order() {
        for as_of in [T2, SchemaVersion(9_999)] {
            let resolved = resolve("note", &versions(), as_of).unwrap();
            let got: Vec<_> = resolved.snapshots.iter().map(|s| s.version).collect();
            assert_eq!(got, vec![T1, T2]);
        }
    }

    #[test]
    fn exact_first_version_is_inclusive() {
        let resolved = resolve("note", &versions(), T1).unwrap();
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn definition_with_history_appends_current_last() {
        let current = revision(T2, "f2").with_history(vec![revision(T1, "f1")]);
        let schema = CollectionSchema::Definition(current.clone());

        let resolved = resolve("note", &schema, T2).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.snapshots[0].version, T1);
        let effective = resolved.effective().unwrap();
        assert_eq!(effective.version, T2);
        assert!(effective.history.is_empty());

        // The declared schema is left untouched.
        assert_eq!(schema, CollectionSchema::Definition(current));
    }

    #[test]
    fn resolving_twice_does_not_grow_history() {
        let schema =
            CollectionSchema::Definition(revision(T2, "f2").with_history(vec![revision(T1, "f1")]));
        let first = resolve("note", &schema, T2).unwrap();
        let second = resolve("note", &schema, T2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn plain_definition_is_returned_as_is() {
        let schema = CollectionSchema::Definition(revision(T2, "f2"));
        let resolved = resolve("note", &schema, SchemaVersion(0)).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.effective().unwrap().version, T2);
    }

    #[test]
    fn out_of_order_versions_are_rejected() {
        let schema = CollectionSchema::Versions(vec![revision(T2, "f2"), revision(T1, "f1")]);
        let err = resolve("note", &schema, T2).unwrap_err();
        assert!(matches!(err, ModuleError::InvalidHistory { ref collection, .. } if collection == "note"));
    }

    #[test]
    fn duplicate_versions_are_rejected() {
        let schema = CollectionSchema::Versions(vec![revision(T1, "a"), revision(T1, "b")]);
        assert!(resolve("note", &schema, T2).is_err());
    }
}
