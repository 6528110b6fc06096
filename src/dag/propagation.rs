// src/dag/propagation.rs

//! Reverse-index traversals used by the task graph: cycle checks on insert
//! and failure cascading.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::types::TaskId;

/// Reverse dependency index: task -> tasks that list it as a prerequisite.
pub type DependentsIndex = HashMap<TaskId, BTreeSet<TaskId>>;

/// Whether `to` is reachable from `from` by following dependent edges.
///
/// Adding the edge `to -> from` (i.e. `from` depends on `to`) closes a cycle
/// exactly when this returns `true`.
pub fn path_exists(dependents: &DependentsIndex, from: &str, to: &str) -> bool {
    let mut stack: Vec<&str> = vec![from];
    let mut visited: HashSet<&str> = HashSet::new();

    while let Some(name) = stack.pop() {
        if name == to {
            return true;
        }
        if !visited.insert(name) {
            continue;
        }
        if let Some(next) = dependents.get(name) {
            stack.extend(next.iter().map(String::as_str));
        }
    }

    false
}

/// All transitive dependents of `root` (excluding `root`), in discovery order.
pub fn transitive_dependents(dependents: &DependentsIndex, root: &str) -> Vec<TaskId> {
    let mut stack: Vec<TaskId> = dependents
        .get(root)
        .map(|d| d.iter().rev().cloned().collect())
        .unwrap_or_default();
    let mut visited: HashSet<TaskId> = HashSet::new();
    let mut order = Vec::new();

    while let Some(name) = stack.pop() {
        if name == root || !visited.insert(name.clone()) {
            continue;
        }
        if let Some(next) = dependents.get(&name) {
            stack.extend(next.iter().rev().cloned());
        }
        order.push(name);
    }

    order
}
