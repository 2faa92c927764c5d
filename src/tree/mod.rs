//! In-memory task forest and the pure structural algorithms run against it.
//!
//! The database layer loads every task into a [`Forest`], the algorithms in
//! the submodules rewrite parent/order fields, and the changed placements are
//! written back inside the same transaction.

pub mod display;
pub mod filter;
pub mod reparent;
pub mod schedule;
pub mod sequence;

use crate::types::{Task, TaskId, TaskTree};
use std::collections::{BTreeSet, HashMap};

/// New parent and position of a task after a structural edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub id: TaskId,
    pub parent_id: Option<TaskId>,
    pub order: i64,
}

/// Arena of tasks addressed by id. Children are derived from `parent_id`
/// on demand rather than stored as links.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: HashMap<TaskId, Task>,
    dirty: BTreeSet<TaskId>,
}

impl Forest {
    pub fn new(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            nodes: tasks.into_iter().map(|t| (t.id, t)).collect(),
            dirty: BTreeSet::new(),
        }
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.nodes.values()
    }

    /// Ids of the sibling group under `parent`, in display order.
    /// Ties on `order` (never expected) fall back to id so the result is stable.
    pub fn sibling_ids(&self, parent: Option<TaskId>) -> Vec<TaskId> {
        let mut group: Vec<&Task> = self
            .nodes
            .values()
            .filter(|t| t.parent_id == parent)
            .collect();
        group.sort_by_key(|t| (t.order, t.id));
        group.into_iter().map(|t| t.id).collect()
    }

    /// Children index: parent id (None for roots) to ordered child ids.
    pub fn children_index(&self) -> HashMap<Option<TaskId>, Vec<TaskId>> {
        let mut index: HashMap<Option<TaskId>, Vec<&Task>> = HashMap::new();
        for task in self.nodes.values() {
            index.entry(task.parent_id).or_default().push(task);
        }
        index
            .into_iter()
            .map(|(parent, mut group)| {
                group.sort_by_key(|t| (t.order, t.id));
                (parent, group.into_iter().map(|t| t.id).collect())
            })
            .collect()
    }

    /// Whether `ancestor` appears on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: TaskId, id: TaskId) -> bool {
        let mut current = self.get(id).and_then(|t| t.parent_id);
        // A corrupt chain can be at most `len` long before it repeats.
        let mut steps = 0;
        while let Some(pid) = current {
            if pid == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            current = self.get(pid).and_then(|t| t.parent_id);
        }
        false
    }

    /// Set parent and order of a task, recording it as changed when either differs.
    pub(crate) fn place(&mut self, id: TaskId, parent_id: Option<TaskId>, order: i64) {
        if let Some(task) = self.nodes.get_mut(&id) {
            if task.parent_id != parent_id || task.order != order {
                task.parent_id = parent_id;
                task.order = order;
                self.dirty.insert(id);
            }
        }
    }

    pub(crate) fn set_completed(&mut self, id: TaskId, completed: bool) -> bool {
        match self.nodes.get_mut(&id) {
            Some(task) if task.completed != completed => {
                task.completed = completed;
                true
            }
            _ => false,
        }
    }

    /// Placements changed since the last call, in id order.
    pub fn take_changes(&mut self) -> Vec<Placement> {
        let dirty = std::mem::take(&mut self.dirty);
        dirty
            .into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .map(|t| Placement {
                id: t.id,
                parent_id: t.parent_id,
                order: t.order,
            })
            .collect()
    }

    /// Nested view of the forest, roots first, siblings in order.
    /// Nodes not reachable from a root are left out.
    pub fn to_trees(&self) -> Vec<TaskTree> {
        let index = self.children_index();
        let roots = index.get(&None).cloned().unwrap_or_default();
        roots
            .into_iter()
            .filter_map(|id| self.build_tree(id, &index, 0))
            .collect()
    }

    fn build_tree(
        &self,
        id: TaskId,
        index: &HashMap<Option<TaskId>, Vec<TaskId>>,
        depth: usize,
    ) -> Option<TaskTree> {
        if depth > self.nodes.len() {
            return None;
        }
        let task = self.get(id)?.clone();
        let children = index
            .get(&Some(id))
            .map(|ids| {
                ids.iter()
                    .filter_map(|&child| self.build_tree(child, index, depth + 1))
                    .collect()
            })
            .unwrap_or_default();
        Some(TaskTree { task, children })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::task;
    use super::*;

    fn sample() -> Forest {
        // 1
        // ├── 3
        // └── 4
        //     └── 5
        // 2
        Forest::new(vec![
            task(2, None, 1),
            task(1, None, 0),
            task(4, Some(1), 1),
            task(3, Some(1), 0),
            task(5, Some(4), 0),
        ])
    }

    #[test]
    fn sibling_ids_follow_order() {
        let forest = sample();
        assert_eq!(forest.sibling_ids(None), vec![1, 2]);
        assert_eq!(forest.sibling_ids(Some(1)), vec![3, 4]);
        assert!(forest.sibling_ids(Some(3)).is_empty());
    }

    #[test]
    fn to_trees_nests_children() {
        let trees = sample().to_trees();
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[0].task.id, 1);
        assert_eq!(trees[0].ids(), vec![1, 3, 4, 5]);
        assert_eq!(trees[1].ids(), vec![2]);
    }

    #[test]
    fn ancestry() {
        let forest = sample();
        assert!(forest.is_ancestor(1, 5));
        assert!(forest.is_ancestor(4, 5));
        assert!(!forest.is_ancestor(5, 1));
        assert!(!forest.is_ancestor(2, 5));
    }

    #[test]
    fn place_records_only_real_changes() {
        let mut forest = sample();
        forest.place(3, Some(1), 0);
        assert!(forest.take_changes().is_empty());

        forest.place(3, None, 2);
        let changes = forest.take_changes();
        assert_eq!(
            changes,
            vec![Placement {
                id: 3,
                parent_id: None,
                order: 2
            }]
        );
        assert!(forest.take_changes().is_empty());
    }

    #[test]
    fn unreachable_cycle_is_left_out() {
        let forest = Forest::new(vec![task(1, None, 0), task(2, Some(3), 0), task(3, Some(2), 0)]);
        let trees = forest.to_trees();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].ids(), vec![1]);
    }
}
