//! Output formatting utilities for markdown and JSON.

use crate::types::{TaskView, join_labels};
use anyhow::Result;
use chrono::FixedOffset;
use std::collections::BTreeSet;

/// Output format for CLI listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

/// Format a rendered forest as an indented markdown list. Due dates are
/// shown as calendar dates in `tz`.
pub fn format_tree_markdown(views: &[TaskView], tz: &FixedOffset) -> String {
    let mut md = String::new();
    for view in views {
        push_view(&mut md, view, 0, tz);
    }
    if md.is_empty() {
        md.push_str("_No tasks._\n");
    }
    md
}

fn push_view(md: &mut String, view: &TaskView, depth: usize, tz: &FixedOffset) {
    let task = &view.task;
    md.push_str(&"  ".repeat(depth));
    md.push_str("- ");
    if task.show_as_task {
        md.push_str(if task.completed { "[x] " } else { "[ ] " });
    }
    if task.name.is_empty() {
        md.push_str("_(untitled)_");
    } else {
        md.push_str(&task.name);
    }
    md.push_str(&format!(" `#{}`", task.id));
    if !task.tags.is_empty() {
        md.push_str(&format!(" [{}]", join_labels(&task.tags)));
    }
    if !task.schedule.is_empty() {
        md.push_str(&format!(" ({})", join_labels(&task.schedule)));
    }
    if task.show_date {
        let due = task.due_date.with_timezone(tz);
        md.push_str(&format!(" due {}", due.format("%Y-%m-%d")));
    }
    md.push('\n');
    for child in &view.children {
        push_view(md, child, depth + 1, tz);
    }
}

/// Format a rendered forest as pretty JSON.
pub fn format_tree_json(views: &[TaskView]) -> Result<String> {
    Ok(serde_json::to_string_pretty(views)?)
}

pub fn format_tree(views: &[TaskView], format: OutputFormat, tz: &FixedOffset) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(format_tree_markdown(views, tz)),
        OutputFormat::Json => format_tree_json(views),
    }
}

/// One tag per line.
pub fn format_tags(tags: &BTreeSet<String>) -> String {
    tags.iter().map(|t| format!("{}\n", t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Task;
    use chrono::{TimeZone, Utc};

    fn view(id: i64, name: &str, children: Vec<TaskView>) -> TaskView {
        TaskView {
            task: Task {
                id,
                parent_id: None,
                order: 0,
                completed: false,
                name: name.to_string(),
                description: String::new(),
                tags: BTreeSet::new(),
                schedule: BTreeSet::new(),
                due_date: Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap(),
                show_as_task: true,
                show_date: false,
            },
            display_class: "due-wrapper hidden ".to_string(),
            children,
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn markdown_indents_children() {
        let mut child = view(2, "child", vec![]);
        child.task.completed = true;
        child.task.tags = ["home".to_string()].into_iter().collect();
        let md = format_tree_markdown(&[view(1, "parent", vec![child])], &utc());
        assert_eq!(md, "- [ ] parent `#1`\n  - [x] child `#2` [home]\n");
    }

    #[test]
    fn list_items_have_no_checkbox() {
        let mut v = view(3, "", vec![]);
        v.task.show_as_task = false;
        v.task.show_date = true;
        assert_eq!(
            format_tree_markdown(&[v], &utc()),
            "- _(untitled)_ `#3` due 2026-10-19\n"
        );
    }

    #[test]
    fn due_date_uses_reporting_offset() {
        // 00:00 UTC on the 19th is still the 18th at -05:00
        let mut v = view(4, "call", vec![]);
        v.task.show_date = true;
        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(format_tree_markdown(&[v.clone()], &west), "- [ ] call `#4` due 2026-10-18\n");
        assert_eq!(format_tree_markdown(&[v], &utc()), "- [ ] call `#4` due 2026-10-19\n");
    }

    #[test]
    fn empty_forest() {
        assert_eq!(format_tree_markdown(&[], &utc()), "_No tasks._\n");
    }

    #[test]
    fn json_flattens_task_fields() {
        let json = format_tree_json(&[view(1, "a", vec![])]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["name"], "a");
        assert_eq!(value[0]["display_class"], "due-wrapper hidden ");
    }
}
