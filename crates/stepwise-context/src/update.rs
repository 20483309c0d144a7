//! Path-based immutable updates on JSON values
//!
//! Every function here takes the old value by reference and returns a new
//! one. Callers holding the old value never observe the write, at any depth.

use serde_json::{Map, Value};

/// Resolve a path inside a value
///
/// Objects are walked by key, arrays by decimal index. Any missing segment
/// yields `None`.
#[must_use]
pub fn get_in<'a, S: AsRef<str>>(value: &'a Value, path: &[S]) -> Option<&'a Value> {
    let mut current = value;
    for segment in path {
        let segment = segment.as_ref();
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Return a copy of `value` with `new` stored at `path`
///
/// Missing or non-container intermediates are replaced by objects. An array
/// is written through only when the segment is an index inside its bounds.
#[must_use]
pub fn set_in<S: AsRef<str>>(value: &Value, path: &[S], new: Value) -> Value {
    let Some((head, tail)) = path.split_first() else {
        return new;
    };
    let head = head.as_ref();

    match value {
        Value::Array(items) => {
            if let Some(idx) = head.parse::<usize>().ok().filter(|i| *i < items.len()) {
                let mut items = items.clone();
                items[idx] = set_in(&items[idx], tail, new);
                return Value::Array(items);
            }
            let mut map = Map::new();
            map.insert(head.to_string(), set_in(&Value::Null, tail, new));
            Value::Object(map)
        }
        Value::Object(map) => {
            let mut map = map.clone();
            let child = map.get(head).unwrap_or(&Value::Null);
            let updated = set_in(child, tail, new);
            map.insert(head.to_string(), updated);
            Value::Object(map)
        }
        _ => {
            let mut map = Map::new();
            map.insert(head.to_string(), set_in(&Value::Null, tail, new));
            Value::Object(map)
        }
    }
}

/// Return a copy of `value` with the entry at `path` removed
///
/// Removing a path that does not exist returns an unchanged copy.
#[must_use]
pub fn remove_in<S: AsRef<str>>(value: &Value, path: &[S]) -> Value {
    let Some((head, tail)) = path.split_first() else {
        return Value::Null;
    };
    let head = head.as_ref();

    match value {
        Value::Object(map) if tail.is_empty() => {
            let mut map = map.clone();
            map.remove(head);
            Value::Object(map)
        }
        Value::Object(map) => match map.get(head) {
            Some(child) => {
                let mut updated = map.clone();
                updated.insert(head.to_string(), remove_in(child, tail));
                Value::Object(updated)
            }
            None => value.clone(),
        },
        Value::Array(items) => match head.parse::<usize>().ok().filter(|i| *i < items.len()) {
            Some(idx) if tail.is_empty() => {
                let mut items = items.clone();
                items.remove(idx);
                Value::Array(items)
            }
            Some(idx) => {
                let mut items = items.clone();
                items[idx] = remove_in(&items[idx], tail);
                Value::Array(items)
            }
            None => value.clone(),
        },
        _ => value.clone(),
    }
}
