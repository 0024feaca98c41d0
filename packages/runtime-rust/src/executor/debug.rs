//! Formatting of executor debug traces.
//!
//! Compact mode mirrors the usual console inspection depth: nesting beyond
//! two levels collapses to `[Object]` / `[Array]`. Deep mode prints the full
//! structure as pretty JSON.

use stormod_core::Value;

use crate::config::DebugConfig;

/// Nesting depth shown in compact mode before structures are collapsed.
pub const COMPACT_DEPTH: usize = 2;

/// Formats `value` for a trace line.
#[must_use]
pub fn format_value(value: &Value, deep: bool) -> String {
    if deep {
        let json = serde_json::Value::from(value.clone());
        serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
    } else {
        truncate(value, COMPACT_DEPTH).to_string()
    }
}

/// Formats a positional argument list for a trace line.
#[must_use]
pub fn format_args(args: &[Value], deep: bool) -> String {
    format_value(&Value::Array(args.to_vec()), deep)
}

fn truncate(value: &Value, depth: usize) -> serde_json::Value {
    match value {
        Value::Array(items) if depth == 0 && !items.is_empty() => "[Array]".into(),
        Value::Map(entries) if depth == 0 && !entries.is_empty() => "[Object]".into(),
        Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(|v| truncate(v, depth - 1)).collect())
        }
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), truncate(v, depth - 1)))
                .collect(),
        ),
        other => serde_json::Value::from(other.clone()),
    }
}

/// Trace line emitted before a backend call, if `debug` allows `name`.
#[must_use]
pub fn pre_execution_trace(
    debug: &DebugConfig,
    name: &str,
    operation: &str,
    args: &[Value],
) -> Option<String> {
    debug.allows(name).then(|| {
        format!(
            "storage backend operation {operation} for {name}: {}",
            format_args(args, debug.print_deep_objects)
        )
    })
}

/// Trace line emitted after a backend call, if `debug` asks for return values.
#[must_use]
pub fn post_execution_trace(
    debug: &DebugConfig,
    name: &str,
    operation: &str,
    result: &Value,
) -> Option<String> {
    (debug.include_return_values && debug.allows(name)).then(|| {
        format!(
            "storage backend operation {operation} for {name} returned: {}",
            format_value(result, debug.print_deep_objects)
        )
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn nested() -> Value {
        Value::map([(
            "a",
            Value::map([("b", Value::map([("c", Value::Int(1))]))]),
        )])
    }

    #[test]
    fn compact_mode_collapses_deep_nesting() {
        assert_eq!(format_value(&nested(), false), r#"{"a":{"b":"[Object]"}}"#);
    }

    #[test]
    fn compact_mode_keeps_empty_structures() {
        let value = Value::map([("a", Value::map([("b", Value::Array(Vec::new()))]))]);
        assert_eq!(format_value(&value, false), r#"{"a":{"b":[]}}"#);
    }

    #[test]
    fn deep_mode_expands_everything() {
        let out = format_value(&nested(), true);
        assert!(out.contains("\"c\": 1"));
        assert!(!out.contains("[Object]"));
    }

    #[test]
    fn pre_trace_respects_allow_list() {
        let debug = DebugConfig::enabled().only(["createNote"]);
        let args = vec![Value::from("note")];
        let line = pre_execution_trace(&debug, "createNote", "createObject", &args).unwrap();
        assert_eq!(line, r#"storage backend operation createObject for createNote: ["note"]"#);
        assert!(pre_execution_trace(&debug, "findNotes", "findObjects", &args).is_none());
    }

    #[test]
    fn post_trace_requires_include_return_values() {
        let result = Value::Int(3);
        let plain = DebugConfig::enabled();
        assert!(post_execution_trace(&plain, "countNotes", "countObjects", &result).is_none());

        let with_results = DebugConfig::enabled().include_return_values();
        let line = post_execution_trace(&with_results, "countNotes", "countObjects", &result).unwrap();
        assert!(line.ends_with("returned: 3"));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            "[a-z]{0,6}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,3}", inner, 0..4).prop_map(Value::Map),
            ]
        })
    }

    proptest! {
        #[test]
        fn deep_mode_round_trips_through_json(value in arb_value()) {
            let text = format_value(&value, true);
            let parsed: Value = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(parsed, value);
        }

        #[test]
        fn compact_mode_is_valid_json(value in arb_value()) {
            let text = format_value(&value, false);
            prop_assert!(serde_json::from_str::<serde_json::Value>(&text).is_ok());
        }
    }
}
