//! Core types for the task tree.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Task identifier (SQLite rowid).
pub type TaskId = i64;

/// Label that schedules a task for every day of the week.
pub const DAILY: &str = "daily";

/// A node in the task tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub parent_id: Option<TaskId>,
    /// Position among siblings; contiguous `0..n-1` within a sibling group.
    pub order: i64,
    pub completed: bool,
    pub name: String,
    pub description: String,
    pub tags: BTreeSet<String>,
    /// Lowercase weekday names and/or `daily`.
    pub schedule: BTreeSet<String>,
    pub due_date: DateTime<Utc>,
    pub show_as_task: bool,
    pub show_date: bool,
}

impl Task {
    /// Whether any of the task's own tags is in `active`.
    pub fn matches_any_tag(&self, active: &BTreeSet<String>) -> bool {
        self.tags.iter().any(|t| active.contains(t))
    }
}

/// A task together with its (possibly filtered) children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTree {
    #[serde(flatten)]
    pub task: Task,
    pub children: Vec<TaskTree>,
}

impl TaskTree {
    /// Ids of this node and all its descendants, depth first.
    pub fn ids(&self) -> Vec<TaskId> {
        let mut out = vec![self.task.id];
        for child in &self.children {
            out.extend(child.ids());
        }
        out
    }
}

/// Rendered node handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub display_class: String,
    pub children: Vec<TaskView>,
}

/// Process-wide view state, persisted as a single row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub show_completed: bool,
    pub active_tags: BTreeSet<String>,
    pub last_checked_in: Option<DateTime<Utc>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            show_completed: true,
            active_tags: BTreeSet::new(),
            last_checked_in: None,
        }
    }
}

/// Which component of the view filter a toggle request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Completed,
    Tag,
}

impl FilterKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "completed" => Some(FilterKind::Completed),
            "tag" => Some(FilterKind::Tag),
            _ => None,
        }
    }
}

/// Per-task display toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOption {
    ShowDate,
    ShowAsTask,
}

impl TaskOption {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "show-date-toggle" | "show_date" | "show-date" => Some(TaskOption::ShowDate),
            "show-as-task-toggle" | "show_as_task" | "show-as-task" => Some(TaskOption::ShowAsTask),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            TaskOption::ShowDate => "show_date",
            TaskOption::ShowAsTask => "show_as_task",
        }
    }
}

/// Calendar component of a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuePart {
    Day,
    Month,
    Year,
}

impl DuePart {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(DuePart::Day),
            "month" => Some(DuePart::Month),
            "year" => Some(DuePart::Year),
            _ => None,
        }
    }

    /// strftime pattern used when echoing the part back.
    pub fn format(&self) -> &'static str {
        match self {
            DuePart::Day => "%d",
            DuePart::Month => "%m",
            DuePart::Year => "%Y",
        }
    }
}

/// Outcome of a due-date part edit. `value` is always the stored part,
/// whether or not the edit was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueDateEdit {
    pub value: String,
    pub applied: bool,
}

/// Parse comma-separated labels: segments are trimmed, empty ones dropped,
/// duplicates collapsed. Case is preserved.
pub fn parse_labels(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalized storage form of a label set.
pub fn join_labels(labels: &BTreeSet<String>) -> String {
    labels.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

/// Parse a schedule: like [`parse_labels`] but lowercased and restricted to
/// weekday names and `daily`.
pub fn parse_schedule(text: &str) -> BTreeSet<String> {
    parse_labels(&text.to_lowercase())
        .into_iter()
        .filter(|label| label == DAILY || weekday_from_label(label).is_some())
        .collect()
}

/// Lowercase English name of a weekday.
pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

pub fn weekday_from_label(label: &str) -> Option<Weekday> {
    match label {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}
