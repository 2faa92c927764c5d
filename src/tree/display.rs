//! Due-date warning class for the presentation layer.

use crate::types::{Task, TaskTree, TaskView};
use chrono::{Days, FixedOffset, NaiveDate};

/// CSS class string for a task's due-date wrapper, relative to `today` in the
/// reporting timezone.
pub fn display_class(task: &Task, today: NaiveDate, tz: &FixedOffset) -> String {
    let mut classes = String::from("due-wrapper ");
    if !task.show_date {
        classes.push_str("hidden ");
        return classes;
    }
    let due = task.due_date.with_timezone(tz).date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    let week_out = today.checked_add_days(Days::new(7)).unwrap_or(today);
    if due < today {
        classes.push_str("past-due ");
    } else if due == today {
        classes.push_str("due-today ");
    } else if due == tomorrow {
        classes.push_str("due-tomorrow ");
    } else if due <= week_out {
        classes.push_str("due-this-week ");
    }
    classes
}

/// Attach display classes to a filtered forest.
pub fn to_views(trees: Vec<TaskTree>, today: NaiveDate, tz: &FixedOffset) -> Vec<TaskView> {
    trees
        .into_iter()
        .map(|tree| TaskView {
            display_class: display_class(&tree.task, today, tz),
            task: tree.task,
            children: to_views(tree.children, today, tz),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::testing::task;
    use chrono::TimeZone;

    fn due_on(day: u32, show_date: bool) -> Task {
        let mut t = task(1, None, 0);
        t.show_date = show_date;
        t.due_date = chrono::Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap();
        t
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn hidden_when_date_not_shown() {
        assert_eq!(display_class(&due_on(1, false), today(), &utc()), "due-wrapper hidden ");
    }

    #[test]
    fn classifies_relative_to_today() {
        let cases = [
            (18, "due-wrapper past-due "),
            (19, "due-wrapper due-today "),
            (20, "due-wrapper due-tomorrow "),
            (26, "due-wrapper due-this-week "),
            (27, "due-wrapper "),
        ];
        for (day, expected) in cases {
            assert_eq!(display_class(&due_on(day, true), today(), &utc()), expected, "day {}", day);
        }
    }

    #[test]
    fn due_date_is_read_in_reporting_timezone() {
        // 12:00 UTC on the 18th is already the 19th at +14:00
        let tz = FixedOffset::east_opt(14 * 3600).unwrap();
        assert_eq!(display_class(&due_on(18, true), today(), &tz), "due-wrapper due-today ");
    }

    #[test]
    fn views_keep_structure() {
        let tree = TaskTree {
            task: due_on(19, true),
            children: vec![TaskTree {
                task: due_on(1, false),
                children: vec![],
            }],
        };
        let views = to_views(vec![tree], today(), &utc());
        assert_eq!(views[0].display_class, "due-wrapper due-today ");
        assert_eq!(views[0].children[0].display_class, "due-wrapper hidden ");
    }
}
