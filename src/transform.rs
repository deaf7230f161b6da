//! Path-based tree mutations: each helper applies its change atomically,
//! then routes the old/new pair through the dispatcher so subscribers
//! observe a fully mutated tree.

use crate::callbacks::Callbacks;
use crate::data::{self, CoercedKey};
use crate::evaluator::resolve;
use crate::value::{SharedValue, Value};

/// Walks an absolute path down a tree mutably.
pub fn resolve_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            Value::Object(map) => map.get_mut(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

/// The parent path and final segment of an absolute path; the root has
/// neither.
fn parent_and_key(path: &str) -> Option<(String, &str)> {
    let idx = path.rfind('/')?;
    let key = &path[idx + 1..];
    if key.is_empty() {
        return None;
    }
    let parent = if idx == 0 { "/" } else { &path[..idx] };
    Some((parent.to_string(), key))
}

/// Sets a batch of keys on the composite value at `path`.
///
/// Keys that cannot be coerced for the container are skipped, as are
/// entries whose value already equals the existing child. Array indices
/// beyond the current length pad the gap with nulls. When at least one
/// entry changed the tree, a single notification covering the whole
/// batch fires against the container's path.
///
/// Returns whether the tree changed.
pub fn set_entries(
    callbacks: &Callbacks,
    tree: &SharedValue,
    path: &str,
    entries: &[(String, Value)],
) -> bool {
    let (old, new) = {
        let mut root = tree.borrow_mut();
        let Some(target) = resolve_mut(&mut root, path) else {
            return false;
        };
        let old = target.clone();

        let mut changed = false;
        for (key, value) in entries {
            let Some(coerced) = data::coerce_key(key, target) else {
                continue;
            };
            match (coerced, &mut *target) {
                (CoercedKey::Index(index), Value::Array(items)) => {
                    if index < 0 {
                        continue;
                    }
                    let index = index as usize;
                    let unchanged = match items.get(index) {
                        Some(existing) => data::eq(existing, value),
                        None => matches!(value, Value::Null),
                    };
                    if unchanged {
                        continue;
                    }
                    if index >= items.len() {
                        items.resize(index + 1, Value::Null);
                    }
                    items[index] = value.clone();
                    changed = true;
                }
                (CoercedKey::Key(key), Value::Object(map)) => {
                    let unchanged = match map.get(&key) {
                        Some(existing) => data::eq(existing, value),
                        None => matches!(value, Value::Null),
                    };
                    if unchanged {
                        continue;
                    }
                    map.insert(key, value.clone());
                    changed = true;
                }
                _ => {}
            }
        }
        if !changed {
            return false;
        }
        (old, target.clone())
    };

    callbacks.notify(path, tree, &old, &new);
    true
}

/// Single-entry form of [`set_entries`].
pub fn set_key(
    callbacks: &Callbacks,
    tree: &SharedValue,
    path: &str,
    key: &str,
    value: Value,
) -> bool {
    set_entries(callbacks, tree, path, &[(key.to_string(), value)])
}

/// Deletes a key from the composite value at `path`. Arrays are spliced,
/// closing the gap; objects drop the key while preserving the order of
/// the remaining entries. Returns whether the tree changed.
pub fn destroy_key(callbacks: &Callbacks, tree: &SharedValue, path: &str, key: &str) -> bool {
    let (old, new) = {
        let mut root = tree.borrow_mut();
        let Some(target) = resolve_mut(&mut root, path) else {
            return false;
        };
        let old = target.clone();

        let removed = match (data::coerce_key(key, target), &mut *target) {
            (Some(CoercedKey::Index(index)), Value::Array(items)) => {
                if index >= 0 && (index as usize) < items.len() {
                    items.remove(index as usize);
                    true
                } else {
                    false
                }
            }
            (Some(CoercedKey::Key(key)), Value::Object(map)) => map.shift_remove(&key).is_some(),
            _ => false,
        };
        if !removed {
            return false;
        }
        (old, target.clone())
    };

    callbacks.notify(path, tree, &old, &new);
    true
}

/// Deletes the value at `path` from its parent. The root cannot be
/// destroyed; that call is a no-op.
pub fn destroy(callbacks: &Callbacks, tree: &SharedValue, path: &str) -> bool {
    let Some((parent, key)) = parent_and_key(path) else {
        return false;
    };
    destroy_key(callbacks, tree, &parent, key)
}

/// Moves the value at `path` to a new key on the same parent: the value
/// is set under the new key, then the old key is destroyed, firing two
/// notifications in that order. Renaming the root, renaming to the same
/// key, or renaming a missing path is a no-op.
pub fn rename_key(callbacks: &Callbacks, tree: &SharedValue, path: &str, new_key: &str) -> bool {
    let Some((parent, old_key)) = parent_and_key(path) else {
        return false;
    };
    let value = {
        let root = tree.borrow();
        match resolve(&root, path) {
            Some(value) => value.clone(),
            None => return false,
        }
    };
    {
        let root = tree.borrow();
        let Some(container) = resolve(&root, &parent) else {
            return false;
        };
        if data::coerce_key(new_key, container) == data::coerce_key(old_key, container) {
            return false;
        }
    }

    set_key(callbacks, tree, &parent, new_key, value);
    destroy_key(callbacks, tree, &parent, old_key)
}

/// Replaces the value at `path` by setting the final segment on the
/// parent. Replacing the root is a no-op.
pub fn replace(callbacks: &Callbacks, tree: &SharedValue, path: &str, value: Value) -> bool {
    let Some((parent, key)) = parent_and_key(path) else {
        return false;
    };
    set_key(callbacks, tree, &parent, key, value)
}
