//! Placeholder rendering for operation argument templates.
//!
//! A placeholder is a string of the form `$name` or `$name:hint`. Rendering
//! replaces it with the context value stored under `name`; the hint only
//! documents the expected type and is dropped. Placeholders may sit at any
//! depth inside arrays and maps. Everything else passes through unchanged.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ModuleError, Result};
use crate::operation::{CallDescriptor, OperationArgs, OperationDefinition};
use crate::types::{RenderContext, Value};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$([^\s:$]+)(?::(\S+))?$").unwrap_or_else(|e| panic!("placeholder regex: {e}"))
});

/// A parsed `$name[:hint]` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Context key the placeholder resolves to.
    pub name: &'a str,
    /// Advisory type hint, e.g. `string` in `$title:string`.
    pub type_hint: Option<&'a str>,
}

impl<'a> Placeholder<'a> {
    /// Parses `text` as a placeholder, or `None` if it is a literal.
    #[must_use]
    pub fn parse(text: &'a str) -> Option<Self> {
        let captures = PLACEHOLDER.captures(text)?;
        let name = captures.get(1)?.as_str();
        let type_hint = captures.get(2).map(|m| m.as_str());
        Some(Self { name, type_hint })
    }
}

/// Formats a placeholder string for `name`, with an optional type hint.
#[must_use]
pub fn placeholder(name: &str, type_hint: Option<&str>) -> String {
    match type_hint {
        Some(hint) => format!("${name}:{hint}"),
        None => format!("${name}"),
    }
}

/// Renders a template value against `context`.
///
/// # Errors
///
/// Returns [`ModuleError::MissingContextKey`] for the first placeholder
/// whose name is absent from `context`. A key present with a `Null` value
/// renders as `Null`.
pub fn render(template: &Value, context: &RenderContext) -> Result<Value> {
    match template {
        Value::String(text) => match Placeholder::parse(text) {
            Some(ph) => context
                .get(ph.name)
                .cloned()
                .ok_or_else(|| ModuleError::MissingContextKey {
                    key: ph.name.to_string(),
                }),
            None => Ok(template.clone()),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| render(item, context))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Map(entries) => entries
            .iter()
            .map(|(key, value)| Ok((key.clone(), render(value, context)?)))
            .collect::<Result<_>>()
            .map(Value::Map),
        _ => Ok(template.clone()),
    }
}

/// Renders every argument of a template, keeping its named/positional shape.
///
/// # Errors
///
/// See [`render`].
pub fn render_args(args: &OperationArgs, context: &RenderContext) -> Result<OperationArgs> {
    match args {
        OperationArgs::Positional(items) => items
            .iter()
            .map(|item| render(item, context))
            .collect::<Result<Vec<_>>>()
            .map(OperationArgs::Positional),
        OperationArgs::Named(entries) => entries
            .iter()
            .map(|(key, value)| Ok((key.clone(), render(value, context)?)))
            .collect::<Result<_>>()
            .map(OperationArgs::Named),
    }
}

/// Renders an operation definition into a call descriptor.
///
/// A definition without arguments renders to an empty positional list, so
/// the backend receives only the operation kind and collection.
///
/// # Errors
///
/// See [`render`].
pub fn render_operation(
    definition: &OperationDefinition,
    context: &RenderContext,
) -> Result<CallDescriptor> {
    let args = match &definition.args {
        Some(template) => render_args(template, context)?,
        None => OperationArgs::Positional(Vec::new()),
    };
    Ok(CallDescriptor {
        operation: definition.operation.as_str().to_string(),
        collection: definition.collection.clone(),
        args,
    })
}

/// Names of every placeholder inside `args`, sorted and deduplicated.
#[must_use]
pub fn placeholders(args: &OperationArgs) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    match args {
        OperationArgs::Positional(items) => {
            for item in items {
                collect_placeholders(item, &mut names);
            }
        }
        OperationArgs::Named(entries) => {
            for value in entries.values() {
                collect_placeholders(value, &mut names);
            }
        }
    }
    names
}

fn collect_placeholders(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::String(text) => {
            if let Some(ph) = Placeholder::parse(text) {
                names.insert(ph.name.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_placeholders(item, names);
            }
        }
        Value::Map(entries) => {
            for value in entries.values() {
                collect_placeholders(value, names);
            }
        }
        _ => {}
    }
}
