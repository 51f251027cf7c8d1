//! Completion statistics and the trailing productivity series.
//!
//! Both are recomputed from a snapshot of every task on each read request.
//! The evaluation instant is a parameter so results never depend on the
//! wall clock.

use crate::tables::{Priority, Task};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Length of the productivity series, and of the "recent" and "this week"
/// windows.
pub const WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub due_this_week: usize,
    pub high_priority: usize,
    pub medium_priority: usize,
    pub low_priority: usize,
    /// Pending tasks per category label.
    pub category_stats: BTreeMap<String, usize>,
    pub completion_rate: u32,
    pub recent_completions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductivityData {
    pub days: Vec<String>,
    pub counts: Vec<usize>,
}

pub fn task_stats(tasks: &[Task], now: NaiveDateTime) -> TaskStats {
    let today = now.date();
    let week_end = today + Duration::days(WINDOW_DAYS);
    let recent_cutoff = now - Duration::days(WINDOW_DAYS);

    let mut stats = TaskStats {
        total: tasks.len(),
        ..Default::default()
    };

    for task in tasks {
        if task.completed {
            stats.completed += 1;
            if task.completed_at.is_some_and(|at| at >= recent_cutoff) {
                stats.recent_completions += 1;
            }
            continue;
        }

        if let Some(due) = task.due_date {
            if due < today {
                stats.overdue += 1;
            }
            if due == today {
                stats.due_today += 1;
            }
            if today <= due && due <= week_end {
                stats.due_this_week += 1;
            }
        }

        match task.priority {
            Priority::High => stats.high_priority += 1,
            Priority::Medium => stats.medium_priority += 1,
            Priority::Low => stats.low_priority += 1,
            Priority::Other(_) => {}
        }

        *stats
            .category_stats
            .entry(task.category.clone())
            .or_default() += 1;
    }

    stats.pending = stats.total - stats.completed;
    stats.completion_rate = completion_rate(stats.completed, stats.total);
    stats
}

/// Percentage of completed tasks, rounded half-to-even. An empty list is 0%.
fn completion_rate(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round_ties_even() as u32
}

/// Completions per calendar day for the last [`WINDOW_DAYS`] days, oldest
/// first and ending with the day of `now`.
pub fn productivity_data(tasks: &[Task], now: NaiveDateTime) -> ProductivityData {
    let today = now.date();

    let (days, counts) = (0..WINDOW_DAYS)
        .rev()
        .map(|offset| {
            let day = today - Duration::days(offset);
            let start = day.and_time(NaiveTime::default());
            let end = start + Duration::days(1);
            let count = tasks
                .iter()
                .filter(|task| {
                    task.completed_at
                        .is_some_and(|at| start <= at && at < end)
                })
                .count();
            (day.format("%a").to_string(), count)
        })
        .unzip();

    ProductivityData { days, counts }
}
