pub use crate::api::tasks::{TaskForm, TaskUpdate};
use crate::api::StatsResponse;
use crate::filter::TaskFilter;
use crate::tables::Task;
use crate::{STATS_API, TASKS_API};
use reqwest::{self, Response, StatusCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Task not found")]
    NotFound(i32),

    #[error("Unexpected server error: {0}")]
    ServerError(String),
}

// * Helpers ..................................................................

/// Maps 404 on a task route (`id` given) to [`TaskError::NotFound`] and any
/// other failure status to [`TaskError::ServerError`] carrying the body.
async fn check(response: Response, id: Option<i32>) -> Result<Response, TaskError> {
    let status = response.status();
    if let Some(id) = id.filter(|_| status == StatusCode::NOT_FOUND) {
        return Err(TaskError::NotFound(id));
    }
    if status.is_client_error() || status.is_server_error() {
        let body = response.text().await?;
        return Err(TaskError::ServerError(format!("{status}: {body}")));
    }
    Ok(response)
}

// * Client ...................................................................

pub async fn create_task(base_url: &str, task: TaskForm) -> Result<Task, TaskError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{TASKS_API}", base_url);
    let response = client.post(url).json(&task).send().await?;

    let created_task = check(response, None).await?.json::<Task>().await?;
    Ok(created_task)
}

pub async fn fetch_task(base_url: &str, id: i32) -> Result<Task, TaskError> {
    let url = format!("{}/{TASKS_API}/{}", base_url, id);
    let response = reqwest::get(url).await?;

    let task = check(response, Some(id)).await?.json::<Task>().await?;
    Ok(task)
}

pub async fn fetch_tasks(base_url: &str, filter: &TaskFilter) -> Result<Vec<Task>, TaskError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{TASKS_API}", base_url);
    let response = client.get(url).query(filter).send().await?;

    let tasks = check(response, None).await?.json::<Vec<Task>>().await?;
    Ok(tasks)
}

pub async fn update_task(base_url: &str, id: i32, task: TaskUpdate) -> Result<Task, TaskError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{TASKS_API}/{}", base_url, id);
    let response = client.put(url).json(&task).send().await?;

    let updated_task = check(response, Some(id)).await?.json::<Task>().await?;
    Ok(updated_task)
}

pub async fn toggle_task(base_url: &str, id: i32) -> Result<Task, TaskError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{TASKS_API}/{}/toggle", base_url, id);
    let response = client.post(url).send().await?;

    let toggled_task = check(response, Some(id)).await?.json::<Task>().await?;
    Ok(toggled_task)
}

pub async fn delete_task(base_url: &str, id: i32) -> Result<(), TaskError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{TASKS_API}/{}", base_url, id);
    let response = client.delete(url).send().await?;

    check(response, Some(id)).await?;
    Ok(())
}

pub async fn fetch_stats(base_url: &str) -> Result<StatsResponse, TaskError> {
    let url = format!("{}/{STATS_API}", base_url);
    let response = reqwest::get(url).await?;

    let stats = check(response, None).await?.json::<StatsResponse>().await?;
    Ok(stats)
}
