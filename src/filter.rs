use crate::tables::Task;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sentinel accepted by the category and priority criteria to mean "any".
pub const ALL: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
    Overdue,
}

/// Criteria for listing tasks, as sent in the query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

fn criterion(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|value| !value.is_empty() && *value != ALL)
}

impl TaskFilter {
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if criterion(&self.category).is_some_and(|category| task.category != category) {
            return false;
        }
        if criterion(&self.priority).is_some_and(|priority| task.priority.as_str() != priority) {
            return false;
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            if !task.title.contains(search) {
                return false;
            }
        }

        match self.status {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Pending => task.is_pending(),
            StatusFilter::Overdue => task.is_overdue(today),
        }
    }

    /// The matching tasks in display order.
    pub fn apply(&self, tasks: Vec<Task>, today: NaiveDate) -> Vec<Task> {
        let mut selected: Vec<Task> = tasks
            .into_iter()
            .filter(|task| self.matches(task, today))
            .collect();
        sort_tasks(&mut selected);
        selected
    }
}

/// Pending before completed, then by priority rank, then by due date with
/// undated tasks last. The sort is stable, so ties keep their input order.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| {
        (
            task.completed,
            task.priority.rank(),
            task.due_date.is_none(),
            task.due_date,
        )
    });
}

/// Distinct category labels in sorted order.
pub fn categories(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .map(|task| task.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
