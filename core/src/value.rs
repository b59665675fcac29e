//! Script value normalization.
//!
//! Raw script definitions arrive as loosely-typed JSON. [`normalize`] accepts
//! a non-empty string or an array that still holds at least one non-empty
//! string after filtering, and rejects everything else.

use serde_json::Value;

use crate::ScriptValue;

/// Validates and normalizes a raw script definition.
///
/// Returns `None` for null, empty strings, numbers, booleans, objects, and
/// arrays with no non-empty string elements. Non-string and empty elements of
/// an array are dropped, order is kept.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use script_merge_core::{ScriptValue, normalize};
///
/// assert_eq!(normalize(&json!("phpunit")), Some(ScriptValue::Single("phpunit".into())));
/// assert_eq!(
///     normalize(&json!(["phpcs", "", 3, "phpstan"])),
///     Some(ScriptValue::Steps(vec!["phpcs".into(), "phpstan".into()]))
/// );
/// assert_eq!(normalize(&json!([])), None);
/// assert_eq!(normalize(&json!(42)), None);
/// ```
pub fn normalize(raw: &Value) -> Option<ScriptValue> {
    match raw {
        Value::String(cmd) if !cmd.is_empty() => Some(ScriptValue::Single(cmd.clone())),
        Value::Array(items) => {
            let steps: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    _ => None,
                })
                .collect();
            if steps.is_empty() {
                None
            } else {
                Some(ScriptValue::Steps(steps))
            }
        }
        _ => None,
    }
}

impl ScriptValue {
    /// Re-applies the normalization rule to an already typed value.
    ///
    /// Values produced by [`normalize`] come back unchanged.
    pub fn normalized(self) -> Option<Self> {
        match self {
            Self::Single(cmd) if cmd.is_empty() => None,
            Self::Single(cmd) => Some(Self::Single(cmd)),
            Self::Steps(steps) => {
                let steps: Vec<String> = steps.into_iter().filter(|s| !s.is_empty()).collect();
                if steps.is_empty() {
                    None
                } else {
                    Some(Self::Steps(steps))
                }
            }
        }
    }
}
