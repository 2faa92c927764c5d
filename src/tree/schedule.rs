//! Weekday schedules: once per calendar day, scheduled tasks are reopened on
//! their days and marked done on the others.

use super::Forest;
use crate::types::{DAILY, TaskId, weekday_label};
use chrono::{DateTime, Datelike, FixedOffset, Weekday};
use std::collections::BTreeSet;

/// True when `now` falls on a different calendar day than the last check-in,
/// or when there has never been one.
pub fn needs_rollover(now: DateTime<FixedOffset>, last: Option<DateTime<FixedOffset>>) -> bool {
    match last {
        Some(last) => last.date_naive() != now.date_naive(),
        None => true,
    }
}

/// Completion a schedule dictates for `today`; `None` when unscheduled.
pub fn scheduled_completion(schedule: &BTreeSet<String>, today: Weekday) -> Option<bool> {
    if schedule.is_empty() {
        return None;
    }
    let due_today = schedule.contains(DAILY) || schedule.contains(weekday_label(today));
    Some(!due_today)
}

impl Forest {
    /// Apply every task's schedule for `today`. Returns the tasks whose
    /// `completed` flag changed, with the new value.
    pub fn apply_schedules(&mut self, today: Weekday) -> Vec<(TaskId, bool)> {
        let targets: Vec<(TaskId, bool)> = self
            .tasks()
            .filter_map(|t| scheduled_completion(&t.schedule, today).map(|c| (t.id, c)))
            .collect();
        let mut changed: Vec<(TaskId, bool)> = targets
            .into_iter()
            .filter(|&(id, completed)| self.set_completed(id, completed))
            .collect();
        changed.sort();
        changed
    }
}

/// Weekday of a timestamp in its own offset.
pub fn weekday_of(at: DateTime<FixedOffset>) -> Weekday {
    at.weekday()
}
