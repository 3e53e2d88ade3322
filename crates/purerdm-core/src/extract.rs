//! Safe nested-path lookup over semi-structured Pure records.
//!
//! Pure responses are deeply nested and wildly inconsistent between record
//! types, so the whole pipeline traverses them through [`get_path`]: a
//! lookup that never panics and reports any missing key, wrong container
//! shape, or out-of-range index as `None`.

use serde_json::Value;

/// One segment of a lookup path: an object key or an array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seg<'p> {
    /// An object key.
    Key(&'p str),
    /// An array index.
    Index(usize),
}

/// Resolve a path of keys and indices against a value.
///
/// Returns `None` if any segment is missing, the container at that point
/// has the wrong shape, or an index is out of range. A present-but-falsy
/// value (empty string, `0`, `false`, `null`) is still `Some`; callers that
/// want Pure's "empty means absent" convention go through [`non_empty`].
pub fn get_path<'v>(value: &'v Value, path: &[Seg<'_>]) -> Option<&'v Value> {
    let mut current = value;
    for seg in path {
        current = match seg {
            Seg::Key(key) => current.as_object()?.get(*key)?,
            Seg::Index(idx) => current.as_array()?.get(*idx)?,
        };
    }
    Some(current)
}

/// Resolve a path, treating empty values as absent.
///
/// "Empty" follows the conventions of the Pure export: `null`, `false`,
/// `""`, `0`, and empty arrays or objects all count as not-present. This is
/// the lookup used for every field except boolean flags, where a present
/// `false` is meaningful.
pub fn non_empty<'v>(value: &'v Value, path: &[Seg<'_>]) -> Option<&'v Value> {
    get_path(value, path).filter(|v| !is_empty(v))
}

/// Resolve a path to a non-empty string.
pub fn non_empty_str<'v>(value: &'v Value, path: &[Seg<'_>]) -> Option<&'v str> {
    non_empty(value, path).and_then(Value::as_str)
}

/// Resolve a path to a boolean, defaulting to `false` when absent.
///
/// Unlike [`non_empty`], a present `false` is returned as-is; this is the
/// accessor for confidentiality and review flags.
pub fn bool_at(value: &Value, path: &[Seg<'_>]) -> bool {
    get_path(value, path).and_then(Value::as_bool).unwrap_or(false)
}

/// True when a value is empty in the Pure sense.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
