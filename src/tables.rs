use crate::schema::*;
use chrono::{NaiveDate, NaiveDateTime};
use diesel::deserialize::{FromSql, Result};
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

pub const DEFAULT_CATEGORY: &str = "General";

/// Task priority as stored in the `priority` text column.
///
/// Labels other than `High`, `Medium` and `Low` are kept verbatim in
/// [`Priority::Other`] so they can still be grouped and filtered on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, AsExpression, FromSqlRow)]
#[derive(Serialize, Deserialize)]
#[diesel(sql_type = Text)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
    Other(String),
}

impl Priority {
    pub fn as_str(&self) -> &str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Other(label) => label,
        }
    }

    /// Sort rank: High < Medium < Low < anything else.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
            Priority::Other(_) => 4,
        }
    }
}

impl From<String> for Priority {
    fn from(label: String) -> Self {
        match label.as_str() {
            "High" => Priority::High,
            "Medium" => Priority::Medium,
            "Low" => Priority::Low,
            _ => Priority::Other(label),
        }
    }
}

impl From<&str> for Priority {
    fn from(label: &str) -> Self {
        Priority::from(label.to_string())
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl ToSql<Text, Pg> for Priority {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> diesel::serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for Priority {
    fn from_sql(bytes: PgValue) -> Result<Self> {
        let label = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(Priority::from(label))
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = tasks)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub category: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub tags: Option<String>,
}

impl Task {
    pub fn is_pending(&self) -> bool {
        !self.completed
    }

    /// Pending and due strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_pending() && self.due_date.is_some_and(|due| due < today)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub tags: Option<String>,
}

impl NewTask {
    /// A task with every optional field at its default.
    pub fn new(title: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            priority: Priority::default(),
            due_date: None,
            created_at,
            tags: None,
        }
    }

    pub fn into_task(self, id: i32) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            completed: false,
            category: self.category,
            priority: self.priority,
            due_date: self.due_date,
            created_at: self.created_at,
            completed_at: None,
            tags: self.tags,
        }
    }
}

/// Partial update of a task row. `None` leaves a column untouched; for the
/// nullable columns `Some(None)` writes NULL.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct TaskChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub completed_at: Option<Option<NaiveDateTime>>,
    pub tags: Option<Option<String>>,
}

impl TaskChangeset {
    /// Sets the completion flag, stamping or clearing `completed_at` only
    /// when the flag actually changes.
    pub fn set_completed(&mut self, task: &Task, completed: bool, now: NaiveDateTime) {
        if task.completed != completed {
            self.completed = Some(completed);
            self.completed_at = Some(completed.then_some(now));
        }
    }

    pub fn toggle(task: &Task, now: NaiveDateTime) -> Self {
        let mut changes = Self::default();
        changes.set_completed(task, !task.completed, now);
        changes
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(category) = &self.category {
            task.category = category.clone();
        }
        if let Some(priority) = &self.priority {
            task.priority = priority.clone();
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = completed_at;
        }
        if let Some(tags) = &self.tags {
            task.tags = tags.clone();
        }
    }
}
