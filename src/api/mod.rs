use crate::filter::{categories, TaskFilter};
use crate::stats::{productivity_data, task_stats, ProductivityData, TaskStats};
use crate::tables::Task;
use crate::STATS_API;
pub mod tasks;
mod state;

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
pub use state::AppState;
use tasks::{add_task, edit_task, flip_task, remove_task, TaskError, TaskForm, TaskUpdate};

/// Document served at `/stats`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatsResponse {
    pub stats: TaskStats,
    pub productivity: ProductivityData,
}

/// Everything the index page needs, computed from one snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IndexResponse {
    pub tasks: Vec<Task>,
    pub stats: TaskStats,
    pub productivity: ProductivityData,
    pub categories: Vec<String>,
    pub filter: TaskFilter,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(tasks::create_router())
        .route(format!("/{STATS_API}").as_str(), get(get_stats))
        .route("/", get(index))
        .route("/add", post(add_form))
        .route("/edit/:id", post(edit_form))
        .route("/complete/:id", get(complete_form))
        .route("/delete/:id", get(delete_form))
        .with_state(state)
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, TaskError> {
    let now = state.now();
    let snapshot = state.store.list_all()?;

    Ok(Json(StatsResponse {
        stats: task_stats(&snapshot, now),
        productivity: productivity_data(&snapshot, now),
    }))
}

async fn index(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<IndexResponse>, TaskError> {
    let now = state.now();
    let snapshot = state.store.list_all()?;

    let stats = task_stats(&snapshot, now);
    let productivity = productivity_data(&snapshot, now);
    let categories = categories(&snapshot);
    let tasks = filter.apply(snapshot, now.date());

    Ok(Json(IndexResponse {
        tasks,
        stats,
        productivity,
        categories,
        filter,
    }))
}

// Form routes: each write redirects back to the index.

async fn add_form(
    State(state): State<AppState>,
    Form(form): Form<TaskForm>,
) -> Result<Redirect, TaskError> {
    add_task(&state, form)?;
    Ok(Redirect::to("/"))
}

async fn edit_form(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
    Form(update): Form<TaskUpdate>,
) -> Result<Redirect, TaskError> {
    edit_task(&state, task_id, update)?;
    Ok(Redirect::to("/"))
}

async fn complete_form(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
) -> Result<Redirect, TaskError> {
    flip_task(&state, task_id)?;
    Ok(Redirect::to("/"))
}

async fn delete_form(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
) -> Result<Redirect, TaskError> {
    remove_task(&state, task_id)?;
    Ok(Redirect::to("/"))
}
