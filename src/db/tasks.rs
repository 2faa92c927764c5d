//! Task CRUD and the tree store.

use super::{Database, get_timestamp, now_ms};
use crate::error::TreeError;
use crate::tree::{Forest, Placement};
use crate::types::{
    DueDateEdit, DuePart, Task, TaskId, TaskOption, join_labels, parse_labels, parse_schedule,
};
use anyhow::Result;
use chrono::{DateTime, Datelike, FixedOffset};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeSet;
use tracing::{debug, info};

const TASK_COLUMNS: &str = "id, parent_id, sort_order, completed, name, description, \
                            tags, schedule, due_date, show_as_task, show_date";

/// `descendants(id)`: task ?1 and everything below it.
const DESCENDANTS_CTE: &str = "WITH RECURSIVE descendants AS (
    SELECT ?1 AS id
    UNION
    SELECT t.id FROM tasks t
    INNER JOIN descendants d ON t.parent_id = d.id
)";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let tags: String = row.get("tags")?;
    let schedule: String = row.get("schedule")?;

    Ok(Task {
        id: row.get("id")?,
        parent_id: row.get("parent_id")?,
        order: row.get("sort_order")?,
        completed: row.get("completed")?,
        name: row.get("name")?,
        description: row.get("description")?,
        tags: parse_labels(&tags),
        schedule: parse_schedule(&schedule),
        due_date: get_timestamp(row, "due_date")?,
        show_as_task: row.get("show_as_task")?,
        show_date: row.get("show_date")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: TaskId) -> Result<Option<Task>> {
    let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
    let task = conn
        .query_row(&sql, params![task_id], parse_task_row)
        .optional()?;
    Ok(task)
}

/// Like [`get_task_internal`] but a missing task is a `TaskNotFound` error.
pub(crate) fn require_task(conn: &Connection, task_id: TaskId) -> Result<Task> {
    get_task_internal(conn, task_id)?.ok_or_else(|| TreeError::task_not_found(task_id).into())
}

/// Load every task into an arena.
pub(crate) fn load_forest(conn: &Connection) -> Result<Forest> {
    let sql = format!("SELECT {} FROM tasks", TASK_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let tasks = stmt
        .query_map([], parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Forest::new(tasks))
}

/// Persist parent/order changes computed on a forest.
pub(crate) fn write_placements(conn: &Connection, placements: &[Placement]) -> Result<()> {
    let mut stmt = conn.prepare("UPDATE tasks SET parent_id = ?1, sort_order = ?2 WHERE id = ?3")?;
    for p in placements {
        stmt.execute(params![p.parent_id, p.order, p.id])?;
    }
    Ok(())
}

fn count_children(conn: &Connection, parent_id: Option<TaskId>) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE parent_id IS ?1",
        params![parent_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Insert a blank task at the end of `parent_id`'s sibling group.
fn insert_task(conn: &Connection, parent_id: Option<TaskId>) -> Result<TaskId> {
    let order = count_children(conn, parent_id)?;
    conn.execute(
        "INSERT INTO tasks (parent_id, sort_order, due_date) VALUES (?1, ?2, ?3)",
        params![parent_id, order, now_ms()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Due date with one calendar component replaced. `None` when the input is
/// not a number or the result is not a real date (e.g. 31 February).
/// A single-digit year selects a year of the 2020s.
pub fn replace_due_part(
    due: DateTime<FixedOffset>,
    part: DuePart,
    text: &str,
) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    match part {
        DuePart::Day => due.with_day(text.parse().ok()?),
        DuePart::Month => due.with_month(text.parse().ok()?),
        DuePart::Year => {
            let year: i32 = text.parse().ok()?;
            let year = if text.len() == 1 { 2020 + year } else { year };
            due.with_year(year)
        }
    }
}

impl Database {
    /// Get a task by ID.
    pub fn get_task(&self, task_id: TaskId) -> Result<Task> {
        self.with_conn(|conn| require_task(conn, task_id))
    }

    /// Direct children of `parent_id` (roots for `None`), in order.
    pub fn children_of(&self, parent_id: Option<TaskId>) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            if let Some(pid) = parent_id {
                require_task(conn, pid)?;
            }
            let sql = format!(
                "SELECT {} FROM tasks WHERE parent_id IS ?1 ORDER BY sort_order, id",
                TASK_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params![parent_id], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Get all tasks, unordered.
    pub fn get_all_tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| Ok(load_forest(conn)?.tasks().cloned().collect()))
    }

    /// Create a root task at the end of the root list, or at the front.
    pub fn create_root(&self, at_front: bool) -> Result<TaskId> {
        let task_id = self.with_transaction(|tx| {
            let task_id = insert_task(tx, None)?;
            if at_front {
                let mut forest = load_forest(tx)?;
                let last = forest.append_index(None) as usize - 1;
                forest.reorder_siblings(None, last, 0);
                write_placements(tx, &forest.take_changes())?;
            }
            Ok(task_id)
        })?;
        info!(task_id, at_front, "Created root task");
        Ok(task_id)
    }

    /// Create a task as the last child of `parent_id`.
    pub fn create_child(&self, parent_id: TaskId) -> Result<TaskId> {
        let task_id = self.with_transaction(|tx| {
            require_task(tx, parent_id)?;
            insert_task(tx, Some(parent_id))
        })?;
        info!(task_id, parent_id, "Created child task");
        Ok(task_id)
    }

    /// Delete a task and its whole subtree, then close the gap it left among
    /// its siblings. Returns the number of tasks removed.
    pub fn delete_subtree(&self, task_id: TaskId) -> Result<usize> {
        let removed = self.with_transaction(|tx| {
            let task = require_task(tx, task_id)?;
            // Counted up front: rows removed by the foreign-key cascade are
            // not reported by the DELETE itself.
            let removed: i64 = tx.query_row(
                &format!("{} SELECT COUNT(*) FROM descendants", DESCENDANTS_CTE),
                params![task_id],
                |row| row.get(0),
            )?;
            tx.execute(
                &format!(
                    "{} DELETE FROM tasks WHERE id IN (SELECT id FROM descendants)",
                    DESCENDANTS_CTE
                ),
                params![task_id],
            )?;

            let mut forest = load_forest(tx)?;
            forest.normalize(task.parent_id);
            write_placements(tx, &forest.take_changes())?;
            Ok(removed as usize)
        })?;
        info!(task_id, removed, "Deleted task subtree");
        Ok(removed)
    }

    /// Flip `completed`; returns the new value.
    pub fn toggle_completed(&self, task_id: TaskId) -> Result<bool> {
        let completed = self.with_transaction(|tx| {
            let task = require_task(tx, task_id)?;
            let completed = !task.completed;
            tx.execute(
                "UPDATE tasks SET completed = ?1 WHERE id = ?2",
                params![completed, task_id],
            )?;
            Ok(completed)
        })?;
        debug!(task_id, completed, "Toggled completion");
        Ok(completed)
    }

    pub fn set_name(&self, task_id: TaskId, name: &str) -> Result<String> {
        self.set_text_column(task_id, "name", name)?;
        Ok(name.to_string())
    }

    pub fn set_description(&self, task_id: TaskId, description: &str) -> Result<String> {
        self.set_text_column(task_id, "description", description)?;
        Ok(description.to_string())
    }

    /// Replace the tag set from comma-separated text; returns the stored set.
    pub fn set_tags(&self, task_id: TaskId, text: &str) -> Result<BTreeSet<String>> {
        let tags = parse_labels(text);
        self.set_text_column(task_id, "tags", &join_labels(&tags))?;
        Ok(tags)
    }

    /// Replace the schedule from comma-separated text; unknown labels are dropped.
    pub fn set_schedule(&self, task_id: TaskId, text: &str) -> Result<BTreeSet<String>> {
        let schedule = parse_schedule(text);
        self.set_text_column(task_id, "schedule", &join_labels(&schedule))?;
        Ok(schedule)
    }

    fn set_text_column(&self, task_id: TaskId, column: &'static str, value: &str) -> Result<()> {
        self.with_transaction(|tx| {
            require_task(tx, task_id)?;
            let sql = format!("UPDATE tasks SET {} = ?1 WHERE id = ?2", column);
            tx.execute(&sql, params![value, task_id])?;
            Ok(())
        })?;
        debug!(task_id, column, "Updated task field");
        Ok(())
    }

    /// Flip a display toggle; returns the new value.
    pub fn toggle_option(&self, task_id: TaskId, option: TaskOption) -> Result<bool> {
        self.with_transaction(|tx| {
            let task = require_task(tx, task_id)?;
            let value = match option {
                TaskOption::ShowDate => !task.show_date,
                TaskOption::ShowAsTask => !task.show_as_task,
            };
            let sql = format!("UPDATE tasks SET {} = ?1 WHERE id = ?2", option.column());
            tx.execute(&sql, params![value, task_id])?;
            Ok(value)
        })
    }

    /// Replace one calendar component of the due date (reporting timezone).
    /// Unparseable input leaves the date unchanged and echoes the stored part.
    pub fn set_due_date_part(&self, task_id: TaskId, part: DuePart, text: &str) -> Result<DueDateEdit> {
        let tz = self.reporting_offset();
        self.with_transaction(|tx| {
            let task = require_task(tx, task_id)?;
            let current = task.due_date.with_timezone(&tz);
            match replace_due_part(current, part, text) {
                Some(updated) => {
                    tx.execute(
                        "UPDATE tasks SET due_date = ?1 WHERE id = ?2",
                        params![updated.timestamp_millis(), task_id],
                    )?;
                    Ok(DueDateEdit {
                        value: updated.format(part.format()).to_string(),
                        applied: true,
                    })
                }
                None => {
                    debug!(task_id, ?part, input = text, "Rejected due date edit");
                    Ok(DueDateEdit {
                        value: current.format(part.format()).to_string(),
                        applied: false,
                    })
                }
            }
        })
    }

    /// Every tag used by any task.
    pub fn list_all_tags(&self) -> Result<BTreeSet<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT tags FROM tasks WHERE tags != ''")?;
            let mut all = BTreeSet::new();
            for tags in stmt.query_map([], |row| row.get::<_, String>(0))? {
                all.extend(parse_labels(&tags?));
            }
            Ok(all)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn due() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 1, 31, 9, 30, 0)
            .unwrap()
    }

    #[test]
    fn replaces_valid_parts() {
        let d = replace_due_part(due(), DuePart::Day, "15").unwrap();
        assert_eq!(d.format("%Y-%m-%d %H:%M").to_string(), "2026-01-15 09:30");
        let d = replace_due_part(due(), DuePart::Month, " 3 ").unwrap();
        assert_eq!(d.format("%Y-%m-%d").to_string(), "2026-03-31");
        let d = replace_due_part(due(), DuePart::Year, "2031").unwrap();
        assert_eq!(d.format("%Y").to_string(), "2031");
    }

    #[test]
    fn single_digit_year_means_this_decade() {
        let d = replace_due_part(due(), DuePart::Year, "7").unwrap();
        assert_eq!(d.format("%Y").to_string(), "2027");
    }

    #[test]
    fn rejects_junk_and_impossible_dates() {
        assert!(replace_due_part(due(), DuePart::Day, "").is_none());
        assert!(replace_due_part(due(), DuePart::Day, "abc").is_none());
        assert!(replace_due_part(due(), DuePart::Day, "32").is_none());
        assert!(replace_due_part(due(), DuePart::Month, "2").is_none()); // 31 Feb
        assert!(replace_due_part(due(), DuePart::Month, "-1").is_none());
    }
}
