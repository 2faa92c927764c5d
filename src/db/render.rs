//! Read path: schedule check-in, then filtering.

use super::Database;
use super::state::{get_state_internal, stamp_check_in_internal};
use super::tasks::load_forest;
use crate::tree::display::to_views;
use crate::tree::filter::{self, FilterSpec};
use crate::tree::schedule::{needs_rollover, weekday_of};
use crate::types::{TaskId, TaskTree, TaskView, weekday_label};
use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::{Connection, params};
use tracing::{debug, info};

/// Apply schedules when `now` is on a new calendar day, then record the
/// check-in. Evaluation always precedes the stamp, so a day's rollover cannot
/// be skipped by whichever request happens to arrive first.
pub(crate) fn check_in_internal(
    conn: &Connection,
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> Result<Vec<(TaskId, bool)>> {
    let state = get_state_internal(conn)?;
    let local_now = now.with_timezone(&tz);
    let last = state.last_checked_in.map(|at| at.with_timezone(&tz));

    let mut changed = Vec::new();
    if needs_rollover(local_now, last) {
        let today = weekday_of(local_now);
        let mut forest = load_forest(conn)?;
        changed = forest.apply_schedules(today);
        let mut stmt = conn.prepare("UPDATE tasks SET completed = ?1 WHERE id = ?2")?;
        for &(id, completed) in &changed {
            stmt.execute(params![completed, id])?;
        }
        info!(
            weekday = weekday_label(today),
            changed = changed.len(),
            "Applied daily schedules"
        );
    }

    stamp_check_in_internal(conn, now)?;
    Ok(changed)
}

impl Database {
    /// Record a request at the current time; see [`Database::check_in_at`].
    pub fn check_in(&self) -> Result<usize> {
        self.check_in_at(Utc::now())
    }

    /// Record a request at `now`, applying schedules once per calendar day.
    /// Returns how many tasks changed completion.
    pub fn check_in_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let tz = self.reporting_offset();
        let changed = self.with_transaction(|tx| check_in_internal(tx, now, tz))?;
        Ok(changed.len())
    }

    /// The filtered, scheduled forest as of now.
    pub fn render_tree(&self) -> Result<Vec<TaskTree>> {
        self.render_tree_at(Utc::now())
    }

    pub fn render_tree_at(&self, now: DateTime<Utc>) -> Result<Vec<TaskTree>> {
        let tz = self.reporting_offset();
        let (forest, spec) = self.with_transaction(|tx| {
            check_in_internal(tx, now, tz)?;
            let state = get_state_internal(tx)?;
            Ok((load_forest(tx)?, FilterSpec::from(&state)))
        })?;
        let trees = filter::apply(forest.to_trees(), &spec);
        debug!(
            total = forest.len(),
            roots = trees.len(),
            filtered = spec.is_active(),
            "Rendered tree"
        );
        Ok(trees)
    }

    /// [`Database::render_tree_at`] with due-date display classes attached.
    pub fn render_views_at(&self, now: DateTime<Utc>) -> Result<Vec<TaskView>> {
        let trees = self.render_tree_at(now)?;
        let today = self.local(now).date_naive();
        Ok(to_views(trees, today, &self.reporting_offset()))
    }

    pub fn render_views(&self) -> Result<Vec<TaskView>> {
        self.render_views_at(Utc::now())
    }
}
