//! Visible-aware moves and indent/outdent.
//!
//! Positions are computed over the *visible* sibling list and translated back
//! to absolute indices, so hidden siblings keep their stored relative order.
//! An edit that has no effect returns `false`; none of these are errors.

use super::Forest;
use super::sequence::offset_index;
use crate::types::TaskId;
use std::collections::HashSet;

/// Which tasks the acting view currently shows.
#[derive(Debug, Clone, Copy)]
pub enum Visibility<'a> {
    All,
    Only(&'a HashSet<TaskId>),
}

impl Visibility<'_> {
    pub fn is_visible(&self, id: TaskId) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Only(ids) => ids.contains(&id),
        }
    }
}

/// Sibling group of `id` (absolute order) and the visible subset of it.
fn sibling_lists(forest: &Forest, id: TaskId, vis: Visibility<'_>) -> Option<(Vec<TaskId>, Vec<TaskId>)> {
    let task = forest.get(id)?;
    if !vis.is_visible(id) {
        return None;
    }
    let siblings = forest.sibling_ids(task.parent_id);
    let visible = siblings
        .iter()
        .copied()
        .filter(|&sib| vis.is_visible(sib))
        .collect();
    Some((siblings, visible))
}

/// Shift a task `displacement` visible positions among its siblings.
pub fn move_visible(forest: &mut Forest, id: TaskId, displacement: i64, vis: Visibility<'_>) -> bool {
    let Some((siblings, visible)) = sibling_lists(forest, id, vis) else {
        return false;
    };
    let Some(vpos) = visible.iter().position(|&v| v == id) else {
        return false;
    };
    let target = offset_index(vpos, displacement, visible.len());
    if target == vpos {
        return false;
    }
    let (Some(from), Some(to)) = (
        siblings.iter().position(|&s| s == id),
        siblings.iter().position(|&s| s == visible[target]),
    ) else {
        return false;
    };
    let parent = forest.get(id).and_then(|t| t.parent_id);
    forest.reorder_siblings(parent, from, to)
}

/// Make a task the last child of the visible sibling just before it.
pub fn indent(forest: &mut Forest, id: TaskId, vis: Visibility<'_>) -> bool {
    let Some((siblings, visible)) = sibling_lists(forest, id, vis) else {
        return false;
    };
    let Some(vpos) = visible.iter().position(|&v| v == id) else {
        return false;
    };
    if vpos == 0 {
        return false;
    }
    let new_parent = visible[vpos - 1];
    if new_parent == id || forest.is_ancestor(id, new_parent) {
        return false;
    }

    let parent = forest.get(id).and_then(|t| t.parent_id);
    let remaining: Vec<TaskId> = siblings.into_iter().filter(|&s| s != id).collect();
    forest.renumber(parent, &remaining);

    let mut children = forest.sibling_ids(Some(new_parent));
    children.push(id);
    forest.renumber(Some(new_parent), &children);
    true
}

/// Make a task the sibling right after its former parent. Roots are left alone.
pub fn outdent(forest: &mut Forest, id: TaskId, vis: Visibility<'_>) -> bool {
    if !vis.is_visible(id) {
        return false;
    }
    let Some(parent) = forest.get(id).and_then(|t| t.parent_id) else {
        return false;
    };
    let Some(grandparent) = forest.get(parent).map(|p| p.parent_id) else {
        return false;
    };

    let remaining: Vec<TaskId> = forest
        .sibling_ids(Some(parent))
        .into_iter()
        .filter(|&s| s != id)
        .collect();
    forest.renumber(Some(parent), &remaining);

    let mut group = forest.sibling_ids(grandparent);
    let Some(parent_pos) = group.iter().position(|&s| s == parent) else {
        return false;
    };
    group.insert(parent_pos + 1, id);
    forest.renumber(grandparent, &group);
    true
}

/// Negative displacement outdents, positive indents, zero does nothing.
pub fn indent_or_outdent(forest: &mut Forest, id: TaskId, displacement: i64, vis: Visibility<'_>) -> bool {
    match displacement.signum() {
        -1 => outdent(forest, id, vis),
        1 => indent(forest, id, vis),
        _ => false,
    }
}
