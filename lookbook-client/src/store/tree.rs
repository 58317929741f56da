//! JSON tree operations with realtime-database semantics
//!
//! - writing `null` removes the node
//! - objects left empty by a removal disappear as well
//! - existing keys keep their position when overwritten

use serde_json::{Map, Value};

/// Node at `segments`, if any
pub fn get<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for segment in segments {
        node = node.as_object()?.get(*segment)?;
    }
    if is_empty(node) { None } else { Some(node) }
}

/// Replace the node at `segments` (a `put`)
pub fn set(root: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *root = if is_empty(&value) { Value::Null } else { value };
        return;
    };

    if !root.is_object() {
        if value.is_null() {
            return;
        }
        *root = Value::Object(Map::new());
    }
    let Value::Object(map) = root else {
        return;
    };

    let prune = {
        let child = map.entry(head.to_string()).or_insert(Value::Null);
        set(child, rest, value);
        is_empty(child)
    };
    if prune {
        map.shift_remove(*head);
    }
}

/// Set each child of `segments` from `children` (a `patch`)
pub fn merge(root: &mut Value, segments: &[&str], children: Map<String, Value>) {
    for (key, value) in children {
        let mut path: Vec<&str> = segments.to_vec();
        path.extend(key.split('/').filter(|s| !s.is_empty()));
        set(root, &path, value);
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
