//! Structural edits that depend on what the current view shows.

use super::Database;
use super::state::get_state_internal;
use super::tasks::{load_forest, require_task, write_placements};
use crate::tree::Forest;
use crate::tree::filter::{self, FilterSpec};
use crate::tree::reparent::{self, Visibility};
use crate::types::TaskId;
use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashSet;
use tracing::{debug, info};

/// Load the forest and the set of task ids the current filter shows.
/// `None` means the filter is inactive and everything is visible.
fn load_with_view(conn: &Connection) -> Result<(Forest, Option<HashSet<TaskId>>)> {
    let spec = FilterSpec::from(&get_state_internal(conn)?);
    let forest = load_forest(conn)?;
    let visible = spec
        .is_active()
        .then(|| filter::visible_ids(&filter::apply(forest.to_trees(), &spec)));
    Ok((forest, visible))
}

impl Database {
    /// Shift a task `displacement` positions among its visible siblings,
    /// clamping at either end. Returns whether anything moved.
    pub fn move_within_visible_siblings(&self, task_id: TaskId, displacement: i64) -> Result<bool> {
        self.apply_structural(task_id, "move", |forest, vis| {
            reparent::move_visible(forest, task_id, displacement, vis)
        })
    }

    /// Outdent for negative displacement, indent for positive; only the sign
    /// matters. Returns whether the tree changed.
    pub fn indent_or_outdent(&self, task_id: TaskId, displacement: i64) -> Result<bool> {
        self.apply_structural(task_id, "indent_or_outdent", |forest, vis| {
            reparent::indent_or_outdent(forest, task_id, displacement, vis)
        })
    }

    fn apply_structural<F>(&self, task_id: TaskId, op: &'static str, edit: F) -> Result<bool>
    where
        F: FnOnce(&mut Forest, Visibility<'_>) -> bool,
    {
        let changed = self.with_transaction(|tx| {
            require_task(tx, task_id)?;
            let (mut forest, visible) = load_with_view(tx)?;
            let vis = match &visible {
                Some(ids) => Visibility::Only(ids),
                None => Visibility::All,
            };
            if !edit(&mut forest, vis) {
                return Ok(0);
            }
            let placements = forest.take_changes();
            write_placements(tx, &placements)?;
            Ok(placements.len())
        })?;

        if changed > 0 {
            info!(task_id, op, rows = changed, "Restructured tree");
        } else {
            debug!(task_id, op, "Structural edit had no effect");
        }
        Ok(changed > 0)
    }
}
