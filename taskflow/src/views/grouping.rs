//! Task grouping by day
//!
//! Tasks are split into "today" and "carried over" by comparing the date
//! part of their creation timestamp with the current date as plain
//! `YYYY-MM-DD` strings. Both dates are taken in UTC with no timezone
//! normalization.

use crate::backend::Task;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskGroup {
    Today,
    CarriedOver,
    /// Created after the current date; shown in neither group
    Upcoming,
}

pub fn date_key(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn classify(task: &Task, today: NaiveDate) -> TaskGroup {
    let created = date_key(&task.created_at);
    let today = today.format("%Y-%m-%d").to_string();

    match created.cmp(&today) {
        std::cmp::Ordering::Equal => TaskGroup::Today,
        std::cmp::Ordering::Less => TaskGroup::CarriedOver,
        std::cmp::Ordering::Greater => TaskGroup::Upcoming,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedTasks {
    pub today: Vec<Task>,
    pub carried_over: Vec<Task>,
}

/// Split tasks into today's and carried-over ones, keeping input order
pub fn group_by_day(tasks: &[Task], today: NaiveDate) -> GroupedTasks {
    let mut grouped = GroupedTasks::default();

    for task in tasks {
        match classify(task, today) {
            TaskGroup::Today => grouped.today.push(task.clone()),
            TaskGroup::CarriedOver => grouped.carried_over.push(task.clone()),
            TaskGroup::Upcoming => {}
        }
    }

    grouped
}

/// Footer counts for a project pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaneSummary {
    pub done: usize,
    pub total: usize,
    pub today: usize,
}

impl fmt::Display for PaneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} done, {} today", self.done, self.total, self.today)
    }
}

pub fn summarize(tasks: &[Task], today: NaiveDate) -> PaneSummary {
    PaneSummary {
        done: tasks.iter().filter(|t| t.completed).count(),
        total: tasks.len(),
        today: tasks
            .iter()
            .filter(|t| classify(t, today) == TaskGroup::Today)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Priority, TaskStatus};
    use chrono::TimeZone;

    fn task_at(id: &str, created_at: DateTime<Utc>, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            project_id: "p1".to_string(),
            title: id.to_string(),
            description: None,
            status: TaskStatus::Pending,
            completed,
            due_date: None,
            priority: Priority::Medium,
            reminder_enabled: false,
            assigned_to: None,
            created_by: "u1".to_string(),
            created_at,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_classify() {
        let today = day();
        let morning = Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 1).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 10, 16, 23, 59, 59).unwrap();
        let yesterday = Utc.with_ymd_and_hms(2026, 10, 15, 23, 59, 59).unwrap();
        let last_year = Utc.with_ymd_and_hms(2025, 12, 31, 12, 0, 0).unwrap();
        let tomorrow = Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap();

        assert_eq!(classify(&task_at("a", morning, false), today), TaskGroup::Today);
        assert_eq!(classify(&task_at("b", late, false), today), TaskGroup::Today);
        assert_eq!(classify(&task_at("c", yesterday, false), today), TaskGroup::CarriedOver);
        assert_eq!(classify(&task_at("d", last_year, false), today), TaskGroup::CarriedOver);
        assert_eq!(classify(&task_at("e", tomorrow, false), today), TaskGroup::Upcoming);
    }

    #[test]
    fn test_future_tasks_are_never_carried_over() {
        let future = Utc.with_ymd_and_hms(2027, 1, 1, 8, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap();
        let tasks = vec![task_at("future", future, false), task_at("old", old, false)];

        let grouped = group_by_day(&tasks, day());
        assert!(grouped.today.is_empty());
        assert_eq!(grouped.carried_over.len(), 1);
        assert_eq!(grouped.carried_over[0].id, "old");
    }

    #[test]
    fn test_summary_counts() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap();
        let tasks = vec![
            task_at("a", now, true),
            task_at("b", now, false),
            task_at("c", old, true),
        ];

        let summary = summarize(&tasks, day());
        assert_eq!(
            summary,
            PaneSummary {
                done: 2,
                total: 3,
                today: 2
            }
        );
        assert_eq!(summary.to_string(), "2 / 3 done, 2 today");
    }
}
