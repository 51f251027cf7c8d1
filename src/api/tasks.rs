use super::AppState;
use crate::filter::TaskFilter;
use crate::store::StoreError;
use crate::tables::{NewTask, Priority, Task, TaskChangeset, DEFAULT_CATEGORY};
use crate::TASKS_API;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("task {0} not found")]
    NotFound(i32),

    #[error("{0}")]
    Validation(String),

    #[error("Task store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for TaskError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => TaskError::NotFound(id),
            other => TaskError::Store(other),
        }
    }
}

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            TaskError::NotFound(_) => StatusCode::NOT_FOUND,
            TaskError::Validation(message) => {
                warn!("rejected task input: {}", message);
                StatusCode::UNPROCESSABLE_ENTITY
            }
            TaskError::Store(err) => {
                error!("task store failure: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status_code, self.to_string()).into_response()
    }
}

/// Fields accepted when adding a task. Everything but the title is optional
/// and an empty string means "use the default".
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TaskForm {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

/// Partial edit of a task. Absent fields are left alone; `due_date` and
/// `tags` set to an empty string are cleared.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

fn required_title(title: &str) -> Result<String, TaskError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::Validation("title must not be empty".to_string()));
    }
    Ok(title.to_string())
}

/// Empty input means no due date; anything else must be a calendar date.
fn parse_due_date(value: &str) -> Result<Option<NaiveDate>, TaskError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DUE_DATE_FORMAT)
        .map(Some)
        .map_err(|_| {
            TaskError::Validation(format!("invalid due date '{value}', expected YYYY-MM-DD"))
        })
}

fn category_or_default(category: String) -> String {
    if category.trim().is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        category
    }
}

fn priority_or_default(priority: String) -> Priority {
    if priority.trim().is_empty() {
        Priority::default()
    } else {
        Priority::from(priority)
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

impl TaskForm {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn into_new_task(self, now: NaiveDateTime) -> Result<NewTask, TaskError> {
        let mut task = NewTask::new(required_title(&self.title)?, now);
        task.due_date = match self.due_date.as_deref() {
            Some(due) => parse_due_date(due)?,
            None => None,
        };
        task.description = self.description.unwrap_or_default();
        task.category = category_or_default(self.category.unwrap_or_default());
        task.priority = priority_or_default(self.priority.unwrap_or_default());
        task.tags = self.tags.and_then(non_empty);
        Ok(task)
    }
}

impl TaskUpdate {
    pub fn into_changeset(
        self,
        current: &Task,
        now: NaiveDateTime,
    ) -> Result<TaskChangeset, TaskError> {
        let mut changes = TaskChangeset {
            title: self.title.as_deref().map(required_title).transpose()?,
            due_date: self.due_date.as_deref().map(parse_due_date).transpose()?,
            description: self.description,
            category: self.category.map(category_or_default),
            priority: self.priority.map(priority_or_default),
            tags: self.tags.map(non_empty),
            ..Default::default()
        };
        if let Some(completed) = self.completed {
            changes.set_completed(current, completed, now);
        }
        Ok(changes)
    }
}

pub(crate) fn add_task(state: &AppState, form: TaskForm) -> Result<Task, TaskError> {
    let new_task = form.into_new_task(state.now())?;
    let task = state.store.insert(new_task)?;
    info!("created task {}", task.id);
    Ok(task)
}

pub(crate) fn edit_task(state: &AppState, task_id: i32, update: TaskUpdate) -> Result<Task, TaskError> {
    let current = state.store.get(task_id)?;
    let changes = update.into_changeset(&current, state.now())?;
    let task = state.store.update(task_id, &changes)?;
    info!("updated task {}", task_id);
    Ok(task)
}

pub(crate) fn flip_task(state: &AppState, task_id: i32) -> Result<Task, TaskError> {
    let current = state.store.get(task_id)?;
    let changes = TaskChangeset::toggle(&current, state.now());
    let task = state.store.update(task_id, &changes)?;
    info!("task {} completed: {}", task_id, task.completed);
    Ok(task)
}

pub(crate) fn remove_task(state: &AppState, task_id: i32) -> Result<(), TaskError> {
    state.store.delete(task_id)?;
    info!("deleted task {}", task_id);
    Ok(())
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            format!("/{TASKS_API}").as_str(),
            get(list_tasks).post(create_task),
        )
        .route(
            format!("/{TASKS_API}/:id").as_str(),
            get(get_task).put(update_task).delete(delete_task),
        )
        .route(
            format!("/{TASKS_API}/:id/toggle").as_str(),
            post(toggle_task),
        )
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<Task>>, TaskError> {
    let today = state.now().date();
    let tasks = state.store.list_all()?;
    Ok(Json(filter.apply(tasks, today)))
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
) -> Result<Json<Task>, TaskError> {
    Ok(Json(state.store.get(task_id)?))
}

async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<TaskForm>,
) -> Result<(StatusCode, Json<Task>), TaskError> {
    let task = add_task(&state, payload)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
    Json(payload): Json<TaskUpdate>,
) -> Result<Json<Task>, TaskError> {
    Ok(Json(edit_task(&state, task_id, payload)?))
}

async fn toggle_task(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
) -> Result<Json<Task>, TaskError> {
    Ok(Json(flip_task(&state, task_id)?))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
) -> Result<StatusCode, TaskError> {
    remove_task(&state, task_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::tests::FixedClock;
    use crate::store::MemoryTaskStore;

    fn setup_test_state() -> AppState {
        AppState::new(MemoryTaskStore::new()).with_clock(FixedClock::at("2024-01-05 12:00:00"))
    }

    #[tokio::test]
    async fn test_task_crud() {
        let state = setup_test_state();

        // Test create
        let create_response = create_task(
            State(state.clone()),
            Json(TaskForm {
                priority: Some("High".to_string()),
                due_date: Some("2024-01-01".to_string()),
                ..TaskForm::new("Test task")
            }),
        )
        .await
        .expect("Failed to create task");

        assert_eq!(create_response.0, StatusCode::CREATED);
        let task_id = create_response.1 .0.id;

        // Test get
        let get_response = get_task(State(state.clone()), Path(task_id))
            .await
            .expect("Failed to get task");
        assert_eq!(get_response.0.title, "Test task");
        assert_eq!(get_response.0.priority, Priority::High);
        assert_eq!(get_response.0.category, DEFAULT_CATEGORY);
        assert_eq!(get_response.0.due_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(get_response.0.created_at, state.now());

        // Test update
        let update_response = update_task(
            State(state.clone()),
            Path(task_id),
            Json(TaskUpdate {
                title: Some("Updated task".to_string()),
                due_date: Some(String::new()),
                ..Default::default()
            }),
        )
        .await
        .expect("Failed to update task");
        assert_eq!(update_response.0.title, "Updated task");
        assert_eq!(update_response.0.due_date, None);
        assert_eq!(update_response.0.priority, Priority::High);

        // Test delete
        let delete_response = delete_task(State(state.clone()), Path(task_id))
            .await
            .expect("Failed to delete task");
        assert_eq!(delete_response, StatusCode::NO_CONTENT);

        // Verify deletion
        let get_result = get_task(State(state), Path(task_id)).await;
        assert!(matches!(get_result, Err(TaskError::NotFound(id)) if id == task_id));
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_task() {
        let state = setup_test_state();
        let original = add_task(&state, TaskForm::new("Laundry")).expect("Failed to create task");

        let done = toggle_task(State(state.clone()), Path(original.id))
            .await
            .expect("Failed to toggle task");
        assert!(done.0.completed);
        assert_eq!(done.0.completed_at, Some(state.now()));

        let undone = toggle_task(State(state.clone()), Path(original.id))
            .await
            .expect("Failed to toggle task");
        assert_eq!(undone.0, original);
    }

    #[tokio::test]
    async fn test_completed_flag_in_update() {
        let state = setup_test_state();
        let task = add_task(&state, TaskForm::new("Report")).expect("Failed to create task");

        let done = edit_task(
            &state,
            task.id,
            TaskUpdate {
                completed: Some(true),
                ..Default::default()
            },
        )
        .expect("Failed to complete task");
        assert!(done.completed);
        assert_eq!(done.completed_at, Some(state.now()));

        let reopened = edit_task(
            &state,
            task.id,
            TaskUpdate {
                completed: Some(false),
                ..Default::default()
            },
        )
        .expect("Failed to reopen task");
        assert!(!reopened.completed);
        assert!(reopened.completed_at.is_none());
    }

    #[test]
    fn test_form_validation() {
        let now = setup_test_state().now();

        let blank = TaskForm::new("   ").into_new_task(now);
        assert!(matches!(blank, Err(TaskError::Validation(_))));

        let bad_date = TaskForm {
            due_date: Some("05/01/2024".to_string()),
            ..TaskForm::new("Pay bills")
        }
        .into_new_task(now);
        assert!(matches!(bad_date, Err(TaskError::Validation(_))));

        let defaults = TaskForm {
            description: None,
            category: Some(String::new()),
            priority: Some(String::new()),
            due_date: Some(String::new()),
            tags: Some(String::new()),
            ..TaskForm::new("  Pay bills ")
        }
        .into_new_task(now)
        .expect("empty optional fields fall back to defaults");
        assert_eq!(defaults.title, "Pay bills");
        assert_eq!(defaults.category, DEFAULT_CATEGORY);
        assert_eq!(defaults.priority, Priority::Medium);
        assert!(defaults.due_date.is_none());
        assert!(defaults.tags.is_none());

        let custom = TaskForm {
            category: Some("Errands".to_string()),
            priority: Some("Whenever".to_string()),
            tags: Some("home, money".to_string()),
            ..TaskForm::new("Pay bills")
        }
        .into_new_task(now)
        .expect("unknown labels are accepted");
        assert_eq!(custom.category, "Errands");
        assert_eq!(custom.priority, Priority::Other("Whenever".to_string()));
        assert_eq!(custom.tags.as_deref(), Some("home, money"));
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let state = setup_test_state();

        let update = update_task(State(state.clone()), Path(99), Json(TaskUpdate::default())).await;
        assert!(matches!(update, Err(TaskError::NotFound(99))));

        let toggle = toggle_task(State(state.clone()), Path(99)).await;
        assert!(matches!(toggle, Err(TaskError::NotFound(99))));

        let delete = delete_task(State(state), Path(99)).await;
        assert!(matches!(delete, Err(TaskError::NotFound(99))));
    }

    #[tokio::test]
    async fn test_invalid_update_leaves_task_untouched() {
        let state = setup_test_state();
        let task = add_task(&state, TaskForm::new("Call mom")).expect("Failed to create task");

        let result = edit_task(
            &state,
            task.id,
            TaskUpdate {
                title: Some("Call dad".to_string()),
                due_date: Some("tomorrow".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(TaskError::Validation(_))));
        assert_eq!(state.store.get(task.id).expect("task still stored"), task);
    }
}
