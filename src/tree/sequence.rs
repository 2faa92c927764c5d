//! Sibling ordering.
//!
//! Orders are always rewritten as `0..n-1` from the list position; there is
//! no gap-based or fractional ordering.

use super::Forest;
use crate::types::TaskId;

/// Move the element at `from` to `to`, clamping `to` into range.
///
/// Returns false, leaving `items` untouched, when `from` is out of range or
/// the clamped target equals `from`.
pub fn reorder<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() {
        return false;
    }
    let to = to.min(items.len() - 1);
    if from == to {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

/// Apply a signed displacement to `index`, clamped to `[0, len-1]`.
pub fn offset_index(index: usize, displacement: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let target = (index as i64).saturating_add(displacement);
    target.clamp(0, len as i64 - 1) as usize
}

impl Forest {
    /// Position a newly created task under `parent` would take to land last.
    pub fn append_index(&self, parent: Option<TaskId>) -> i64 {
        self.tasks().filter(|t| t.parent_id == parent).count() as i64
    }

    /// Make `ids` the sibling group under `parent`, numbered by position.
    pub fn renumber(&mut self, parent: Option<TaskId>, ids: &[TaskId]) {
        for (order, &id) in ids.iter().enumerate() {
            self.place(id, parent, order as i64);
        }
    }

    /// Renumber the existing group under `parent` in its current order,
    /// closing any gaps left by removals.
    pub fn normalize(&mut self, parent: Option<TaskId>) {
        let ids = self.sibling_ids(parent);
        self.renumber(parent, &ids);
    }

    /// Move a sibling from absolute index `from` to `to` within `parent`'s group.
    pub fn reorder_siblings(&mut self, parent: Option<TaskId>, from: usize, to: usize) -> bool {
        let mut ids = self.sibling_ids(parent);
        if !reorder(&mut ids, from, to) {
            return false;
        }
        self.renumber(parent, &ids);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::testing::task;

    #[test]
    fn reorder_moves_and_clamps() {
        let mut items = vec!['a', 'b', 'c', 'd'];
        assert!(reorder(&mut items, 0, 2));
        assert_eq!(items, vec!['b', 'c', 'a', 'd']);

        assert!(reorder(&mut items, 1, 99));
        assert_eq!(items, vec!['b', 'a', 'd', 'c']);
    }

    #[test]
    fn reorder_out_of_range_source_is_noop() {
        let mut items = vec![1, 2, 3];
        assert!(!reorder(&mut items, 3, 0));
        assert!(!reorder(&mut items, 1, 1));
        assert_eq!(items, vec![1, 2, 3]);

        let mut empty: Vec<i32> = vec![];
        assert!(!reorder(&mut empty, 0, 0));
    }

    #[test]
    fn offset_index_clamps_at_both_ends() {
        assert_eq!(offset_index(0, -1, 3), 0);
        assert_eq!(offset_index(2, 1, 3), 2);
        assert_eq!(offset_index(1, 5, 3), 2);
        assert_eq!(offset_index(1, -5, 3), 0);
        assert_eq!(offset_index(1, 1, 3), 2);
        assert_eq!(offset_index(0, 1, 0), 0);
    }

    #[test]
    fn offset_index_saturates_extreme_displacements() {
        assert_eq!(offset_index(2, i64::MAX, 3), 2);
        assert_eq!(offset_index(0, i64::MIN, 3), 0);
        assert_eq!(offset_index(0, i64::MAX, 3), 2);
        assert_eq!(offset_index(2, i64::MIN, 3), 0);
    }

    #[test]
    fn normalize_closes_gaps() {
        let mut forest = Forest::new(vec![task(1, None, 0), task(2, None, 3), task(3, None, 7)]);
        forest.normalize(None);
        let orders: Vec<i64> = forest
            .sibling_ids(None)
            .iter()
            .map(|&id| forest.get(id).unwrap().order)
            .collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(forest.take_changes().len(), 2);
    }

    #[test]
    fn reorder_siblings_renumbers_group() {
        let mut forest = Forest::new(vec![
            task(1, None, 0),
            task(2, None, 1),
            task(3, None, 2),
            task(4, Some(1), 0),
        ]);
        assert!(forest.reorder_siblings(None, 2, 0));
        assert_eq!(forest.sibling_ids(None), vec![3, 1, 2]);
        assert_eq!(forest.get(3).unwrap().order, 0);
        assert_eq!(forest.get(2).unwrap().order, 2);
        assert_eq!(forest.sibling_ids(Some(1)), vec![4]);
        assert_eq!(forest.append_index(None), 3);
        assert_eq!(forest.append_index(Some(1)), 1);
    }
}
