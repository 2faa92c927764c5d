//! View filtering: completion visibility, then tag matching with promotion.
//!
//! Filtering never touches stored order or `completed`; it only decides which
//! nodes appear and where.

use crate::types::{AppState, TaskId, TaskTree};
use std::collections::{BTreeSet, HashSet};

/// Inputs to [`apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub show_completed: bool,
    pub active_tags: BTreeSet<String>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            show_completed: true,
            active_tags: BTreeSet::new(),
        }
    }
}

impl FilterSpec {
    /// False when the filter would pass every node through unchanged.
    pub fn is_active(&self) -> bool {
        !self.show_completed || !self.active_tags.is_empty()
    }
}

impl From<&AppState> for FilterSpec {
    fn from(state: &AppState) -> Self {
        Self {
            show_completed: state.show_completed,
            active_tags: state.active_tags.clone(),
        }
    }
}

/// Filter a forest. Completion filtering runs first and removes whole
/// subtrees; tag filtering then promotes matching descendants of
/// non-matching nodes into the non-matching node's slot.
pub fn apply(trees: Vec<TaskTree>, spec: &FilterSpec) -> Vec<TaskTree> {
    let trees = if spec.show_completed {
        trees
    } else {
        drop_completed(trees)
    };
    if spec.active_tags.is_empty() {
        trees
    } else {
        promote_tagged(trees, &spec.active_tags)
    }
}

fn drop_completed(trees: Vec<TaskTree>) -> Vec<TaskTree> {
    trees
        .into_iter()
        .filter(|t| !t.task.completed)
        .map(|mut t| {
            t.children = drop_completed(t.children);
            t
        })
        .collect()
}

fn promote_tagged(trees: Vec<TaskTree>, active: &BTreeSet<String>) -> Vec<TaskTree> {
    let mut out = Vec::new();
    for tree in trees {
        if tree.task.matches_any_tag(active) {
            out.push(tree);
        } else {
            out.extend(promote_tagged(tree.children, active));
        }
    }
    out
}

/// Every id present anywhere in a filtered forest.
pub fn visible_ids(trees: &[TaskTree]) -> HashSet<TaskId> {
    trees.iter().flat_map(TaskTree::ids).collect()
}
