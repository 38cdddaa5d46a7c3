//! Optional-chaining lookups over loosely-shaped JSON responses.
//!
//! Voyager responses nest deeply and drop keys freely; every lookup here
//! yields `None` instead of failing.

use serde_json::Value;

/// Walk a dot-separated path. Numeric segments index into arrays.
///
/// Explicit `null` values along the way are treated as absent.
pub fn path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(data);
    }

    let mut current = data;
    for key in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(key)?,
            Value::Array(arr) => arr.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }

    Some(current)
}

/// String at `path`, if present.
pub fn str_at<'a>(data: &'a Value, p: &str) -> Option<&'a str> {
    path(data, p).and_then(Value::as_str)
}

/// Owned string at `path`, if present.
pub fn string_at(data: &Value, p: &str) -> Option<String> {
    str_at(data, p).map(str::to_string)
}

/// Unsigned integer at `path`, if present.
pub fn u64_at(data: &Value, p: &str) -> Option<u64> {
    path(data, p).and_then(Value::as_u64)
}

/// Boolean at `path`, if present.
pub fn bool_at(data: &Value, p: &str) -> Option<bool> {
    path(data, p).and_then(Value::as_bool)
}

/// Array at `path`, or an empty slice.
pub fn array_at<'a>(data: &'a Value, p: &str) -> &'a [Value] {
    path(data, p)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
