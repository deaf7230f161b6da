//! Path-based change notification: a registry of subscriptions keyed by
//! absolute path, and the dispatcher that decides which subscribers fire
//! for a given mutation, in what order.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::data;
use crate::evaluator::{self, ResultSet};
use crate::value::{SharedValue, Value};

/// A subscription callback. Invoked with the freshly re-evaluated result
/// at the subscribed path, the path itself, and the modified sub-paths
/// relative to it.
pub type ListenerFn = Rc<dyn Fn(&ResultSet, &str, &[String])>;

/// The subscription registry and dispatcher.
///
/// Subscriptions are keyed by absolute path and hold the subject tree
/// they were registered against; dispatch matches the notifying tree by
/// pointer identity, so two trees with equal contents never trigger each
/// other's subscribers.
///
/// Callbacks run synchronously and reentrantly: a callback may mutate
/// the tree and trigger a nested notification, which runs to completion
/// before the outer dispatch continues.
#[derive(Default)]
pub struct Callbacks {
    registry: RefCell<HashMap<String, Vec<(SharedValue, ListenerFn)>>>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for modifications at `path` on the given
    /// tree. Appends; a callback registered twice fires twice.
    pub fn listen(&self, path: &str, tree: &SharedValue, callback: ListenerFn) {
        self.registry
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push((tree.clone(), callback));
    }

    /// Removes the most recently added subscription matching the
    /// `(tree, callback)` pair by pointer identity.
    pub fn unlisten(&self, path: &str, tree: &SharedValue, callback: &ListenerFn) {
        let mut registry = self.registry.borrow_mut();
        if let Some(entries) = registry.get_mut(path) {
            if let Some(pos) = entries
                .iter()
                .rposition(|(t, c)| Rc::ptr_eq(t, tree) && Rc::ptr_eq(c, callback))
            {
                entries.remove(pos);
            }
        }
    }

    /// Clears the whole registry. Test and reset use only.
    pub fn reset(&self) {
        self.registry.borrow_mut().clear();
    }

    /// The number of subscriptions currently registered at a path.
    pub fn count_at(&self, path: &str) -> usize {
        self.registry
            .borrow()
            .get(path)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Signals that the value at `path` in `tree` was replaced, and fires
    /// every affected subscriber exactly once.
    ///
    /// The diff between the old and new values determines the affected
    /// paths: every changed path and all of its ancestors up to `/`,
    /// deduplicated, dispatched deepest-first with `/` always last, so a
    /// child's subscribers are always informed before any ancestor's.
    /// Each callback receives a fresh selection evaluated against the
    /// current (post-mutation) tree immediately before its own
    /// invocation, so it observes the effects of any earlier callback in
    /// the same dispatch.
    pub fn notify(&self, path: &str, tree: &SharedValue, old: &Value, new: &Value) {
        if path.is_empty() {
            return;
        }

        let diff = data::compare(old, new, path);
        let mut queue: Vec<String> = Vec::new();
        for modified in diff.keys() {
            let mut current = modified.clone();
            while let Some(idx) = current.rfind('/') {
                if !queue.contains(&current) {
                    queue.push(current.clone());
                }
                current = if idx == 0 && current.len() > 1 {
                    "/".to_string()
                } else {
                    current[..idx].to_string()
                };
            }
        }

        let segment_count = |p: &str| p.split('/').count();
        queue.sort_by(|a, b| {
            if a == "/" {
                std::cmp::Ordering::Greater
            } else if b == "/" {
                std::cmp::Ordering::Less
            } else {
                segment_count(b).cmp(&segment_count(a))
            }
        });

        for dispatch_path in &queue {
            // The registry borrow must not be held while callbacks run;
            // they may listen, unlisten or notify again.
            let matching: Vec<ListenerFn> = {
                let registry = self.registry.borrow();
                registry
                    .get(dispatch_path)
                    .map(|entries| {
                        entries
                            .iter()
                            .filter(|(subject, _)| Rc::ptr_eq(subject, tree))
                            .map(|(_, callback)| callback.clone())
                            .collect()
                    })
                    .unwrap_or_default()
            };
            if matching.is_empty() {
                continue;
            }

            let sub_paths: Vec<String> = queue
                .iter()
                .filter(|other| *other != dispatch_path && is_sub_path(other, dispatch_path))
                .map(|other| other[dispatch_path.len()..].to_string())
                .collect();

            for callback in matching {
                let fresh = evaluator::select_path(tree, dispatch_path);
                callback(&fresh, dispatch_path, &sub_paths);
            }
        }
    }
}

/// Segment-aware strict prefix test: `/a/b` is a sub-path of `/a` and of
/// `/`, but not of `/a/bc`.
fn is_sub_path(candidate: &str, parent: &str) -> bool {
    candidate.starts_with(parent)
        && (parent == "/" || candidate[parent.len()..].starts_with('/'))
}
